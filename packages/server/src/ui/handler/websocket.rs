//! WebSocket channel handlers.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, PusherChannel},
    infrastructure::dto::websocket::{ChannelReply, ChannelRequest},
    ui::state::AppState,
    usecase::ChannelError,
};

/// Time allowed for queued frames to reach the socket once the session ends.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Query parameters for the WebSocket upgrade
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub connection_id: Option<String>,
}

/// Outcome of routing one request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    pub reply: ChannelReply,
    /// The channel should be closed after the reply is sent.
    pub close: bool,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let connection_id = match query.connection_id {
        Some(raw) => ConnectionId::new(raw.clone()).map_err(|e| {
            tracing::warn!("Invalid connection_id '{}': {}", raw, e);
            StatusCode::BAD_REQUEST
        })?,
        None => ConnectionId::generate(),
    };

    if state.connect_usecase.is_connected(&connection_id).await {
        tracing::warn!(
            "Connection '{}' is already open. Rejecting connection.",
            connection_id
        );
        return Err(StatusCode::CONFLICT);
    }

    // 登録はアップグレード成功後に handle_socket で行う
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id)))
}

/// Spawns a task that drains the outbound channel into the WebSocket sink.
///
/// The task ends once every sender of the channel has been dropped, after the
/// queued frames are written, or when the socket refuses a write.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

/// Reads request frames and answers each one through the outbound channel.
async fn receive_loop(
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    reply_tx: PusherChannel,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
        };

        let outcome = match msg {
            Message::Text(text) => route_channel_frame(&state, &connection_id, &text).await,
            Message::Binary(_) => RouteOutcome {
                reply: ChannelReply::failed(
                    StatusCode::BAD_REQUEST.as_u16(),
                    None,
                    "binary frames are not supported",
                ),
                close: false,
            },
            Message::Close(_) => {
                tracing::info!("Connection '{}' sent close frame", connection_id);
                break;
            }
            // Ping/Pong は axum が処理する
            _ => continue,
        };

        match serde_json::to_string(&outcome.reply) {
            Ok(json) => {
                if reply_tx.send(json).is_err() {
                    break;
                }
            }
            Err(e) => tracing::error!("Failed to encode reply: {}", e),
        }

        if outcome.close {
            break;
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, connection_id: ConnectionId) {
    // Create a channel for this connection to receive pushes and replies
    let (tx, rx) = mpsc::unbounded_channel();

    match state
        .connect_usecase
        .execute(connection_id.clone(), tx.clone())
        .await
    {
        Ok(_) => tracing::info!("Connection '{}' registered", connection_id),
        // アップグレード前の確認と登録の間に同じ ID が接続した
        Err(e @ ChannelError::DuplicateConnection(_)) => {
            tracing::warn!("Connection '{}' rejected: {}", connection_id, e);
            reject_socket(socket, &e).await;
            return;
        }
        // subscribe で再登録されるため接続は維持する
        Err(e) => tracing::warn!(
            "Connection '{}' opened without registry entry: {}",
            connection_id,
            e
        ),
    }

    let (sender, receiver) = socket.split();

    let mut send_task = pusher_loop(rx, sender);
    let mut recv_task = tokio::spawn(receive_loop(
        receiver,
        state.clone(),
        connection_id.clone(),
        tx,
    ));

    tokio::select! {
        _ = &mut recv_task => {
            // MessagePusher 側の送信チャンネルを外すと、残りのフレームを書き出して send_task が終わる
            release_connection(&state, &connection_id).await;
            if tokio::time::timeout(FLUSH_TIMEOUT, &mut send_task).await.is_err() {
                send_task.abort();
            }
        }
        _ = &mut send_task => {
            recv_task.abort();
            release_connection(&state, &connection_id).await;
        }
    }

    tracing::info!("Connection '{}' closed", connection_id);
}

/// Answers a connection that could not be registered and closes it.
///
/// The registered owner of the id is left untouched.
async fn reject_socket(mut socket: WebSocket, error: &ChannelError) {
    let reply = ChannelReply::failed(
        status_for(error).as_u16(),
        Some("connect"),
        error.to_string(),
    );
    if let Ok(json) = serde_json::to_string(&reply) {
        let _ = socket.send(Message::Text(json.into())).await;
    }
    let _ = socket.close().await;
}

async fn release_connection(state: &AppState, connection_id: &ConnectionId) {
    if let Err(e) = state.disconnect_usecase.execute(connection_id).await {
        tracing::warn!("Failed to deregister '{}': {}", connection_id, e);
    }
}

/// Route one text frame to its handler and build the reply.
pub async fn route_channel_frame(
    state: &AppState,
    connection_id: &ConnectionId,
    text: &str,
) -> RouteOutcome {
    let request = match serde_json::from_str::<ChannelRequest>(text) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Unrecognized frame from '{}': {}", connection_id, e);
            return RouteOutcome {
                reply: ChannelReply::failed(
                    StatusCode::BAD_REQUEST.as_u16(),
                    None,
                    format!("unrecognized request: {e}"),
                ),
                close: false,
            };
        }
    };

    let action = request.action();
    let close = matches!(request, ChannelRequest::Disconnect);

    let result = match request {
        ChannelRequest::Connect => {
            state
                .connect_usecase
                .ensure_registered(connection_id.clone())
                .await
        }
        ChannelRequest::Subscribe { conversation_id } => state
            .subscribe_usecase
            .execute(connection_id.clone(), conversation_id)
            .await
            .map(|conversation_id| {
                tracing::info!(
                    "Connection '{}' subscribed to '{}'",
                    connection_id,
                    conversation_id
                );
            }),
        ChannelRequest::Disconnect => state.disconnect_usecase.execute(connection_id).await,
    };

    let reply = match result {
        Ok(()) => ChannelReply::ok(action),
        Err(e) => {
            tracing::warn!("'{}' on '{}' failed: {}", action, connection_id, e);
            ChannelReply::failed(status_for(&e).as_u16(), Some(action), e.to_string())
        }
    };

    RouteOutcome { reply, close }
}

fn status_for(error: &ChannelError) -> StatusCode {
    match error {
        ChannelError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ChannelError::DuplicateConnection(_) => StatusCode::CONFLICT,
        ChannelError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
