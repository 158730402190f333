//! Server state shared by the handlers.

use std::sync::Arc;

use crate::usecase::{
    ConnectConnectionUseCase, DisconnectConnectionUseCase, EnableStreamingUseCase,
    GetConnectionsUseCase, InboundEventDispatcher, SubscribeConversationUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectConnectionUseCase（接続）
    pub connect_usecase: Arc<ConnectConnectionUseCase>,
    /// SubscribeConversationUseCase（会話の購読）
    pub subscribe_usecase: Arc<SubscribeConversationUseCase>,
    /// DisconnectConnectionUseCase（切断）
    pub disconnect_usecase: Arc<DisconnectConnectionUseCase>,
    /// EnableStreamingUseCase（ストリーミング有効化）
    pub enable_streaming_usecase: Arc<EnableStreamingUseCase>,
    /// GetConnectionsUseCase（接続一覧）
    pub get_connections_usecase: Arc<GetConnectionsUseCase>,
    /// InboundEventDispatcher（受信イベントの振り分け）
    pub dispatcher: Arc<InboundEventDispatcher>,
}
