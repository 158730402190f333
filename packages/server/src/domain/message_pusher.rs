//! MessagePusher trait 定義
//!
//! 接続へのメッセージ送信（通知）のインターフェース。
//! WebSocket の生成は UI 層、送信は Infrastructure 層が担当する。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, SuggestionResult};

/// 接続ごとの送信チャンネル（UI 層の WebSocket 送信タスクにつながる）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録する。同じ ID が登録済みなら `DuplicateClient`。
    async fn register_client(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(), MessagePushError>;

    /// 接続の送信チャンネルが登録済みかどうか
    async fn is_registered(&self, connection_id: &ConnectionId) -> bool;

    /// 接続の送信チャンネルを登録解除（存在しなければ何もしない）
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続に提案を送信（ワイヤ形式への変換は実装側が行う）
    async fn push_suggestion(
        &self,
        connection_id: &ConnectionId,
        suggestion: &SuggestionResult,
    ) -> Result<(), MessagePushError>;
}
