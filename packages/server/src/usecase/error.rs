//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{RegistryError, ValueObjectError};

/// チャンネル（connect / subscribe / disconnect）処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// リクエストの値が不正（クライアントエラー）
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ValueObjectError),

    /// 同じ接続 ID のチャンネルがすでに開いている
    #[error("connection '{0}' is already open")]
    DuplicateConnection(String),

    /// レジストリの一時的な障害（サーバーエラー）
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
