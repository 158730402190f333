//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    domain::{ConversationId, InboundMessageEvent},
    infrastructure::dto::http::{ConnectionDto, InboundMessageEventDto, StreamingResultDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Accept an inbound conversation event and enqueue it for relaying.
///
/// Answers 202 as soon as the event is queued on its conversation's worker.
pub async fn post_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InboundMessageEventDto>, JsonRejection>,
) -> StatusCode {
    let Json(dto) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected inbound event: {}", rejection.body_text());
            return StatusCode::BAD_REQUEST;
        }
    };

    // DTO から Domain Model への変換
    let event = match InboundMessageEvent::try_from(dto) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Rejected inbound event: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    state.dispatcher.dispatch(event).await;
    StatusCode::ACCEPTED
}

/// Ask the telephony platform to start streaming a conversation's events.
pub async fn enable_streaming(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<StreamingResultDto>, StatusCode> {
    let conversation_id = ConversationId::new(conversation_id).map_err(|e| {
        tracing::warn!("Invalid conversation id for streaming: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let success = state
        .enable_streaming_usecase
        .execute(&conversation_id)
        .await;
    Ok(Json(StreamingResultDto { success }))
}

/// Debug endpoint listing the registry contents
pub async fn debug_connections(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ConnectionDto>>, StatusCode> {
    match state.get_connections_usecase.execute().await {
        Ok(connections) => Ok(Json(
            connections.into_iter().map(ConnectionDto::from).collect(),
        )),
        Err(e) => {
            tracing::error!("Failed to list connections: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
