//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクト生成時のバリデーションエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} exceeds {max} bytes")]
    TooLong { field: &'static str, max: usize },
}

/// 接続レジストリ（バックエンドストア）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("connection registry unavailable: {0}")]
    Unavailable(String),
}

/// メッセージ送信（プッシュ）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Client '{0}' is already connected")]
    DuplicateClient(String),

    #[error("Failed to push message: {0}")]
    PushFailed(String),
}

/// 提案生成（外部関数呼び出し）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuggestionError {
    #[error("suggestion request failed: {0}")]
    Request(String),

    #[error("suggestion generator returned status {0}")]
    Status(u16),

    #[error("malformed suggestion response: {0}")]
    Malformed(String),

    #[error("suggestion generator returned an empty answer")]
    Empty,
}

/// ストリーミング有効化呼び出しのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamingError {
    #[error("streaming request failed: {0}")]
    Request(String),

    #[error("streaming endpoint rejected the request with status {0}")]
    Rejected(u16),
}
