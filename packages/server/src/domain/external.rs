//! 外部コラボレーターのポート
//!
//! 提案生成関数とストリーミング有効化エンドポイントはこのシステムの外側にある。
//! ここでは境界の契約だけを定義する。

use async_trait::async_trait;

use super::{ConversationId, StreamingError, SuggestionError};

/// 提案生成関数（プロンプト・検索・LLM 呼び出しはブラックボックス）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn generate(&self, customer_message: &str) -> Result<String, SuggestionError>;
}

/// 会話開始時に一度だけ呼ばれる、テレフォニー基盤のイベント送出の有効化
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamingActivator: Send + Sync {
    async fn start_streaming(&self, conversation_id: &ConversationId)
    -> Result<(), StreamingError>;
}
