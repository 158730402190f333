//! UseCase: 会話の購読処理

use std::sync::Arc;

use madoguchi_shared::time::Clock;

use crate::domain::{ConnectionId, ConnectionRegistry, ConversationId, Timestamp};

use super::error::ChannelError;

/// 会話購読のユースケース
pub struct SubscribeConversationUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    clock: Arc<dyn Clock>,
}

impl SubscribeConversationUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// 接続に会話を関連付ける（既存の関連付けは上書き）
    ///
    /// # Returns
    ///
    /// * `Ok(ConversationId)` - 関連付けた会話 ID
    /// * `Err(ChannelError::InvalidRequest)` - 会話 ID が不正
    /// * `Err(ChannelError::Registry)` - レジストリ障害
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        conversation_id: String,
    ) -> Result<ConversationId, ChannelError> {
        let conversation_id = ConversationId::new(conversation_id)?;
        let now = Timestamp::new(self.clock.now_millis());
        self.registry
            .register(connection_id, conversation_id.clone(), now)
            .await?;
        Ok(conversation_id)
    }
}
