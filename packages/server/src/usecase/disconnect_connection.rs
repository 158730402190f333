//! UseCase: 切断処理
//!
//! 切断イベントは重複・競合しうるので、存在しない接続の切断もエラーにしない。

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, MessagePusher};

use super::error::ChannelError;

/// 切断のユースケース
pub struct DisconnectConnectionUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectConnectionUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// 切断を実行
    ///
    /// 送信チャンネルは必ず登録解除される。レジストリ障害のみエラーになる。
    pub async fn execute(&self, connection_id: &ConnectionId) -> Result<(), ChannelError> {
        self.message_pusher.unregister_client(connection_id).await;
        self.registry.deregister(connection_id).await?;
        Ok(())
    }
}
