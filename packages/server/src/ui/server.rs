//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use madoguchi_shared::time::Clock;
use tower_http::trace::TraceLayer;

use crate::{
    config::RelayConfig,
    domain::{ConnectionRegistry, MessagePusher, StreamingActivator, SuggestionGenerator},
    usecase::{
        ConnectConnectionUseCase, DisconnectConnectionUseCase, EnableStreamingUseCase,
        GetConnectionsUseCase, InboundEventDispatcher, RelaySuggestionUseCase,
        SubscribeConversationUseCase,
    },
};

use super::{
    handler::{
        http::{debug_connections, enable_streaming, health_check, post_event},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Ports the relay is wired with.
pub struct Components {
    pub registry: Arc<dyn ConnectionRegistry>,
    pub message_pusher: Arc<dyn MessagePusher>,
    pub generator: Arc<dyn SuggestionGenerator>,
    pub streaming_activator: Arc<dyn StreamingActivator>,
    pub clock: Arc<dyn Clock>,
}

/// Suggestion relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(&config, components);
/// server.run(&config).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Wire the use cases on top of the given ports.
    pub fn new(config: &RelayConfig, components: Components) -> Self {
        let Components {
            registry,
            message_pusher,
            generator,
            streaming_activator,
            clock,
        } = components;

        let relay = Arc::new(RelaySuggestionUseCase::new(
            registry.clone(),
            message_pusher.clone(),
            generator,
        ));
        let state = AppState {
            connect_usecase: Arc::new(ConnectConnectionUseCase::new(
                registry.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            subscribe_usecase: Arc::new(SubscribeConversationUseCase::new(
                registry.clone(),
                clock,
            )),
            disconnect_usecase: Arc::new(DisconnectConnectionUseCase::new(
                registry.clone(),
                message_pusher,
            )),
            enable_streaming_usecase: Arc::new(EnableStreamingUseCase::new(streaming_activator)),
            get_connections_usecase: Arc::new(GetConnectionsUseCase::new(registry)),
            dispatcher: Arc::new(InboundEventDispatcher::new(
                relay,
                config.worker_idle_timeout,
            )),
        };

        Self {
            state: Arc::new(state),
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the HTTP/WebSocket router.
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/events", post(post_event))
            .route(
                "/api/conversations/{conversation_id}/streaming",
                post(enable_streaming),
            )
            .route("/debug/connections", get(debug_connections))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until a shutdown signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or fails while serving.
    pub async fn run(self, config: &RelayConfig) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
        tracing::info!("Suggestion relay listening on {}", listener.local_addr()?);
        tracing::info!("Agent sessions connect to: ws://{}/ws", config.bind_addr());
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until the future resolves.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
