//! UseCase 層
//!
//! ドメイン層の trait（ポート）だけに依存し、リレーの振る舞いを組み立てます。

mod connect_connection;
mod disconnect_connection;
mod dispatch_event;
mod enable_streaming;
mod error;
mod get_connections;
mod relay_suggestion;
mod subscribe_conversation;

pub use connect_connection::ConnectConnectionUseCase;
pub use disconnect_connection::DisconnectConnectionUseCase;
pub use dispatch_event::InboundEventDispatcher;
pub use enable_streaming::EnableStreamingUseCase;
pub use error::ChannelError;
pub use get_connections::GetConnectionsUseCase;
pub use relay_suggestion::{Delivery, RelayReport, RelaySuggestionUseCase};
pub use subscribe_conversation::SubscribeConversationUseCase;
