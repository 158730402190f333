//! UseCase: 接続処理
//!
//! チャンネル接続時に、送信チャンネルを MessagePusher に登録し、
//! 会話未関連付けの接続としてレジストリに登録します。
//! 接続 ID が開いているチャンネルと重複する場合は何も登録しません。

use std::sync::Arc;

use madoguchi_shared::time::Clock;

use crate::domain::{ConnectionId, ConnectionRegistry, MessagePusher, PusherChannel, Timestamp};

use super::error::ChannelError;

/// 接続のユースケース
pub struct ConnectConnectionUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ConnectConnectionUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            message_pusher,
            clock,
        }
    }

    /// 接続 ID のチャンネルがすでに開いているかどうか
    pub async fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.message_pusher.is_registered(connection_id).await
    }

    /// 接続を実行
    ///
    /// # Returns
    ///
    /// * `Ok(Timestamp)` - 接続時刻
    /// * `Err(ChannelError::DuplicateConnection)` - 同じ ID のチャンネルが開いている（何も登録しない）
    /// * `Err(ChannelError::Registry)` - 送信チャンネルは登録済み。呼び出し側は接続を
    ///   維持してよい（subscribe 時にレジストリへ登録される）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<Timestamp, ChannelError> {
        let connected_at = Timestamp::new(self.clock.now_millis());

        // register_client が失敗するのは ID 重複時のみ
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await
            .map_err(|_| ChannelError::DuplicateConnection(connection_id.to_string()))?;
        self.registry.connect(connection_id, connected_at).await?;

        Ok(connected_at)
    }

    /// `connect` ルート: 接続がレジストリにあることを保証する（冪等）
    pub async fn ensure_registered(&self, connection_id: ConnectionId) -> Result<(), ChannelError> {
        let connected_at = Timestamp::new(self.clock.now_millis());
        self.registry.connect(connection_id, connected_at).await?;
        Ok(())
    }
}
