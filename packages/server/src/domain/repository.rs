//! Repository trait 定義
//!
//! 接続レジストリのインターフェース。UseCase 層はこの trait にのみ依存し、
//! バックエンドストア（インメモリ・永続 KVS など）の具体的な実装には依存しない。

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{Connection, ConnectionId, ConversationId, RegistryError, Timestamp};

/// 接続レジストリ
///
/// ## 利用側の約束
///
/// バックエンドは遅延・停止しうる。`RegistryError` は一時的な障害として扱い、
/// ログを出して処理を継続すること（バッチ全体を中断しない）。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 会話未関連付けの接続を登録する。既存のレコードはそのまま残る。
    async fn connect(
        &self,
        connection_id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<(), RegistryError>;

    /// 接続に会話を関連付ける（upsert、既存の関連付けは上書き）
    ///
    /// `connected_at` はレコードが存在せず新規作成される場合にのみ使われる。
    async fn register(
        &self,
        connection_id: ConnectionId,
        conversation_id: ConversationId,
        connected_at: Timestamp,
    ) -> Result<(), RegistryError>;

    /// 接続を削除する。存在しなくてもエラーにしない。
    async fn deregister(&self, connection_id: &ConnectionId) -> Result<(), RegistryError>;

    /// 会話に関連付けられた全接続を取得する。未知の会話 ID は空集合。
    async fn lookup_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<BTreeSet<ConnectionId>, RegistryError>;

    /// 全接続のスナップショット
    async fn list_connections(&self) -> Result<Vec<Connection>, RegistryError>;
}
