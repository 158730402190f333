//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` を管理（ID の重複は拒否）
//! - 提案を JSON フレームに変換して接続へ送信（push_suggestion）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! 送信タスクが終了した接続への送信は `PushFailed` になります（古い接続の検出）。

use std::collections::{HashMap, hash_map::Entry};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel, SuggestionResult},
    infrastructure::dto::websocket::SuggestionPush,
};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: connection_id, Value: PusherChannel
    clients: Mutex<HashMap<ConnectionId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(), MessagePushError> {
        let mut clients = self.clients.lock().await;
        match clients.entry(connection_id) {
            Entry::Occupied(entry) => {
                Err(MessagePushError::DuplicateClient(entry.key().to_string()))
            }
            Entry::Vacant(entry) => {
                tracing::debug!("Connection '{}' registered to MessagePusher", entry.key());
                entry.insert(sender);
                Ok(())
            }
        }
    }

    async fn is_registered(&self, connection_id: &ConnectionId) -> bool {
        self.clients.lock().await.contains_key(connection_id)
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(connection_id).is_some() {
            tracing::debug!(
                "Connection '{}' unregistered from MessagePusher",
                connection_id
            );
        }
    }

    async fn push_suggestion(
        &self,
        connection_id: &ConnectionId,
        suggestion: &SuggestionResult,
    ) -> Result<(), MessagePushError> {
        let content = serde_json::to_string(&SuggestionPush::from(suggestion))
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        let clients = self.clients.lock().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        sender
            .send(content)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - push_suggestion: 特定の接続への送信と JSON フレームへの変換
    // - エラーハンドリング（存在しない接続、受信側が閉じた接続）
    // - 同じ ID の二重登録の拒否
    // - unregister_client の冪等性
    // ========================================

    fn connection_id(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn hello() -> SuggestionResult {
        SuggestionResult::Generated("Hello".to_string())
    }

    #[tokio::test]
    async fn test_push_suggestion_success() {
        // テスト項目: 登録済みの接続にメッセージを送信できる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(connection_id("conn-1"), tx).await.unwrap();

        // when (操作):
        let result = pusher.push_suggestion(&connection_id("conn-1"), &hello()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some(r#"{"suggestion":"Hello"}"#.to_string()));
    }

    #[tokio::test]
    async fn test_push_suggestion_client_not_found() {
        // テスト項目: 存在しない接続への送信は ClientNotFound を返す
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();

        // when (操作):
        let result = pusher
            .push_suggestion(&connection_id("nonexistent"), &hello())
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(MessagePushError::ClientNotFound("nonexistent".to_string()))
        );
    }

    #[tokio::test]
    async fn test_push_suggestion_closed_channel_fails() {
        // テスト項目: 受信側（送信タスク）が終了した接続への送信は PushFailed になる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, rx) = mpsc::unbounded_channel();
        pusher.register_client(connection_id("stale"), tx).await.unwrap();
        drop(rx);

        // when (操作):
        let result = pusher.push_suggestion(&connection_id("stale"), &hello()).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::PushFailed(_))));
    }

    #[tokio::test]
    async fn test_sentinel_is_pushed_as_suggestion_text() {
        // テスト項目: 生成できなかった提案はセンチネル文言のフレームとして送られる
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register_client(connection_id("conn-1"), tx).await.unwrap();

        // when (操作):
        pusher
            .push_suggestion(&connection_id("conn-1"), &SuggestionResult::Unavailable)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            rx.recv().await,
            Some(r#"{"suggestion":"No suggestion available"}"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_register_same_id_twice_keeps_first_channel() {
        // テスト項目: 登録済みの ID での再登録は拒否され、最初の接続に送信が届き続ける
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let (second_tx, mut second_rx) = mpsc::unbounded_channel();
        pusher.register_client(connection_id("dup"), first_tx).await.unwrap();

        // when (操作):
        let result = pusher.register_client(connection_id("dup"), second_tx).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(MessagePushError::DuplicateClient("dup".to_string()))
        );
        pusher.push_suggestion(&connection_id("dup"), &hello()).await.unwrap();
        assert_eq!(
            first_rx.recv().await,
            Some(r#"{"suggestion":"Hello"}"#.to_string())
        );
        assert!(second_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_client_twice() {
        // テスト項目: 登録解除を 2 回呼んでも問題なく処理される
        // given (前提条件):
        let pusher = WebSocketMessagePusher::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        pusher.register_client(connection_id("conn-1"), tx).await.unwrap();

        // when (操作):
        pusher.unregister_client(&connection_id("conn-1")).await;
        pusher.unregister_client(&connection_id("conn-1")).await;

        // then (期待する結果):
        let result = pusher.push_suggestion(&connection_id("conn-1"), &hello()).await;
        assert!(matches!(result, Err(MessagePushError::ClientNotFound(_))));
        assert!(!pusher.is_registered(&connection_id("conn-1")).await);
    }
}
