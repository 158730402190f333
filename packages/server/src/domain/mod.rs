//! ドメイン層
//!
//! 値オブジェクト・エンティティ・ポート（trait）を定義します。
//! Infrastructure 層はこのモジュールの trait を実装します（依存性の逆転）。

pub mod entity;
pub mod error;
pub mod external;
pub mod message_pusher;
pub mod repository;
pub mod value_object;

pub use entity::{Connection, InboundMessageEvent, NO_SUGGESTION_SENTINEL, SuggestionResult};
pub use error::{
    MessagePushError, RegistryError, StreamingError, SuggestionError, ValueObjectError,
};
pub use external::{StreamingActivator, SuggestionGenerator};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::ConnectionRegistry;
pub use value_object::{ConnectionId, ConversationId, MessageKind, ParticipantRole, Timestamp};

#[cfg(test)]
pub use external::{MockStreamingActivator, MockSuggestionGenerator};
#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::MockConnectionRegistry;
