//! InMemory ConnectionRegistry 実装
//!
//! ドメイン層が定義する ConnectionRegistry trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! 会話 ID での検索は全件走査です。接続数はエージェント数程度なので
//! 逆引きインデックスは持ちません。

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    Connection, ConnectionId, ConnectionRegistry, ConversationId, RegistryError, Timestamp,
};

/// インメモリ ConnectionRegistry 実装
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    /// Key: connection_id, Value: Connection
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn connect(
        &self,
        connection_id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<(), RegistryError> {
        let mut connections = self.connections.write().await;
        connections
            .entry(connection_id.clone())
            .or_insert_with(|| Connection::new(connection_id, connected_at));
        Ok(())
    }

    async fn register(
        &self,
        connection_id: ConnectionId,
        conversation_id: ConversationId,
        connected_at: Timestamp,
    ) -> Result<(), RegistryError> {
        let mut connections = self.connections.write().await;
        match connections.get_mut(&connection_id) {
            Some(connection) => connection.subscribe(conversation_id),
            None => {
                // connect を経由しない登録（イベント順序の逆転など）も受け付ける
                let mut connection = Connection::new(connection_id.clone(), connected_at);
                connection.subscribe(conversation_id);
                connections.insert(connection_id, connection);
            }
        }
        Ok(())
    }

    async fn deregister(&self, connection_id: &ConnectionId) -> Result<(), RegistryError> {
        let mut connections = self.connections.write().await;
        connections.remove(connection_id);
        Ok(())
    }

    async fn lookup_by_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<BTreeSet<ConnectionId>, RegistryError> {
        let connections = self.connections.read().await;
        Ok(connections
            .values()
            .filter(|connection| connection.is_subscribed_to(conversation_id))
            .map(|connection| connection.id.clone())
            .collect())
    }

    async fn list_connections(&self) -> Result<Vec<Connection>, RegistryError> {
        let connections = self.connections.read().await;
        let mut snapshot: Vec<Connection> = connections.values().cloned().collect();
        snapshot.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(snapshot)
    }
}
