//! UseCase: ストリーミング有効化
//!
//! 会話開始時に一度だけ呼ばれる。失敗は成功フラグ（false）として呼び出し側に
//! 返すだけで、内部で再試行はしない。

use std::sync::Arc;

use crate::domain::{ConversationId, StreamingActivator};

pub struct EnableStreamingUseCase {
    activator: Arc<dyn StreamingActivator>,
}

impl EnableStreamingUseCase {
    pub fn new(activator: Arc<dyn StreamingActivator>) -> Self {
        Self { activator }
    }

    pub async fn execute(&self, conversation_id: &ConversationId) -> bool {
        match self.activator.start_streaming(conversation_id).await {
            Ok(()) => {
                tracing::info!("Streaming enabled for conversation '{}'", conversation_id);
                true
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to enable streaming for conversation '{}': {}",
                    conversation_id,
                    e
                );
                false
            }
        }
    }
}
