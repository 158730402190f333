//! Client subscription manager.
//!
//! Owns the duplex channel between one agent session and the relay. The
//! channel task connects, forwards outbound frames, and publishes every pushed
//! suggestion on a watch channel that only ever holds the newest value.
//!
//! Each time the channel closes the task makes exactly one reconnect attempt
//! after `reconnect_delay`. After a successful reconnect the active
//! conversation is subscribed again, since the relay drops the subscription
//! together with the old connection. A failed attempt leaves the channel in
//! [`ChannelState::Error`].

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use madoguchi_server::infrastructure::dto::websocket::{ChannelRequest, ServerFrame};
use tokio::{
    net::TcpStream,
    sync::{Mutex, mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::{domain::ChannelState, error::ClientError};

type ChannelStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How a connected channel ended.
enum ChannelEnd {
    Shutdown,
    Dropped,
}

struct Inner {
    url: String,
    subscribe_backoff: Duration,
    reconnect_delay: Duration,
    state_tx: watch::Sender<ChannelState>,
    suggestion_tx: watch::Sender<Option<String>>,
    conversation_tx: watch::Sender<Option<String>>,
    shutdown_tx: watch::Sender<bool>,
    /// Writer of the currently open channel.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl Inner {
    fn set_state(&self, state: ChannelState) {
        tracing::debug!("Channel state: {}", state.as_str());
        self.state_tx.send_replace(state);
    }

    async fn send_frame(&self, request: &ChannelRequest) -> bool {
        let json = match serde_json::to_string(request) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize request: {}", e);
                return false;
            }
        };
        match self.outbound.lock().await.as_ref() {
            Some(tx) => tx.send(json).is_ok(),
            None => false,
        }
    }

    fn handle_frame(&self, text: &str) {
        match serde_json::from_str::<ServerFrame>(text) {
            Ok(ServerFrame::Suggestion(push)) => {
                if self.conversation_tx.borrow().is_none() {
                    tracing::debug!("Dropping suggestion outside of a conversation");
                    return;
                }
                tracing::info!("Suggestion received: {}", push.suggestion);
                self.suggestion_tx.send_replace(Some(push.suggestion));
            }
            Ok(ServerFrame::Reply(reply)) if reply.is_success() => {
                tracing::debug!("Relay acknowledged {:?}", reply.action);
            }
            Ok(ServerFrame::Reply(reply)) => {
                tracing::warn!(
                    "Relay answered {:?} with {}: {}",
                    reply.action,
                    reply.status,
                    reply.error.as_deref().unwrap_or("")
                );
            }
            Err(e) => tracing::warn!("Unrecognized frame from relay: {} ({})", text, e),
        }
    }

    /// Sleeps for `delay` unless a shutdown is requested first.
    async fn wait_or_shutdown(
        &self,
        delay: Duration,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = shutdown_requested(shutdown_rx) => false,
        }
    }

    async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        // 最初の接続以外はすべて、切断（または接続失敗）後の 1 回きりの再接続
        let mut reconnecting = false;

        loop {
            self.set_state(ChannelState::Connecting);
            match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => {
                    match self.clone().pump(stream, &mut shutdown_rx).await {
                        ChannelEnd::Shutdown => {
                            self.set_state(ChannelState::Closed);
                            return;
                        }
                        ChannelEnd::Dropped => {
                            tracing::warn!("Channel to {} closed; reconnecting once", self.url);
                            self.set_state(ChannelState::Disconnected);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to connect to {}: {}", self.url, e);
                    if reconnecting {
                        self.set_state(ChannelState::Error);
                        return;
                    }
                }
            }

            reconnecting = true;
            if !self
                .wait_or_shutdown(self.reconnect_delay, &mut shutdown_rx)
                .await
            {
                self.set_state(ChannelState::Closed);
                return;
            }
        }
    }

    async fn pump(
        self: Arc<Self>,
        stream: ChannelStream,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> ChannelEnd {
        let (mut write, mut read) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        *self.outbound.lock().await = Some(tx);
        self.set_state(ChannelState::Open);

        // 旧接続の購読はリレー側で破棄されているため再購読する
        let active = self.conversation_tx.borrow().clone();
        if let Some(conversation_id) = active {
            tracing::info!("Subscribing to '{}' on the new channel", conversation_id);
            self.send_frame(&ChannelRequest::Subscribe { conversation_id })
                .await;
        }

        let end = loop {
            tokio::select! {
                _ = shutdown_requested(shutdown_rx) => {
                    if let Ok(json) = serde_json::to_string(&ChannelRequest::Disconnect) {
                        let _ = write.send(Message::Text(json.into())).await;
                    }
                    let _ = write.close().await;
                    break ChannelEnd::Shutdown;
                }
                Some(frame) = rx.recv() => {
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        tracing::warn!("Failed to send frame: {}", e);
                        break ChannelEnd::Dropped;
                    }
                }
                message = read.next() => match message {
                    Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Relay closed the channel");
                        break ChannelEnd::Dropped;
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Channel read error: {}", e);
                        break ChannelEnd::Dropped;
                    }
                    Some(Ok(_)) => {}
                },
            }
        };

        *self.outbound.lock().await = None;
        end
    }
}

/// Resolves once a shutdown has been requested.
async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        let stop = *shutdown_rx.borrow_and_update();
        if stop || shutdown_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Subscription manager settings.
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    pub url: String,
    pub subscribe_backoff: Duration,
    pub reconnect_delay: Duration,
}

/// Agent-side manager of the relay channel.
pub struct SubscriptionManager {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionManager {
    pub fn new(config: SubscriptionConfig) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Disconnected);
        let (suggestion_tx, _) = watch::channel(None);
        let (conversation_tx, _) = watch::channel(None);
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            inner: Arc::new(Inner {
                url: config.url,
                subscribe_backoff: config.subscribe_backoff,
                reconnect_delay: config.reconnect_delay,
                state_tx,
                suggestion_tx,
                conversation_tx,
                shutdown_tx,
                outbound: Mutex::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    /// Spawn the channel task. Calling it again while running is a no-op.
    pub async fn start(&self) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return;
        }
        let shutdown_rx = self.inner.shutdown_tx.subscribe();
        *task = Some(tokio::spawn(self.inner.clone().run(shutdown_rx)));
    }

    /// Close the channel (sending a `disconnect` frame if open) and wait for the task.
    pub async fn shutdown(&self) {
        self.inner.shutdown_tx.send_replace(true);
        let task = self.task.lock().await.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!("Channel task ended abnormally: {}", e);
            }
        }
        let state = *self.inner.state_tx.borrow();
        if !state.is_terminal() {
            self.inner.set_state(ChannelState::Closed);
        }
    }

    /// Subscribe the channel to `conversation_id`.
    ///
    /// The conversation becomes the active one immediately, so a reconnect
    /// re-subscribes it. While the channel is not open the request is retried
    /// every `subscribe_backoff`.
    ///
    /// # Errors
    ///
    /// * `ClientError::ConversationEnded` - the conversation ended or was replaced before the channel opened
    /// * `ClientError::ChannelUnavailable` - the channel reached a terminal state
    pub async fn subscribe(&self, conversation_id: &str) -> Result<(), ClientError> {
        self.inner
            .conversation_tx
            .send_replace(Some(conversation_id.to_string()));

        loop {
            let active = self.inner.conversation_tx.borrow().clone();
            if active.as_deref() != Some(conversation_id) {
                return Err(ClientError::ConversationEnded(conversation_id.to_string()));
            }

            let state = *self.inner.state_tx.borrow();
            if state == ChannelState::Open {
                let request = ChannelRequest::Subscribe {
                    conversation_id: conversation_id.to_string(),
                };
                if self.inner.send_frame(&request).await {
                    tracing::info!("Subscribe request sent for '{}'", conversation_id);
                    return Ok(());
                }
            } else if state.is_terminal() {
                return Err(ClientError::ChannelUnavailable(state.as_str().to_string()));
            }

            tracing::debug!(
                "Channel is {}; retrying subscribe for '{}' in {:?}",
                state.as_str(),
                conversation_id,
                self.inner.subscribe_backoff
            );
            tokio::time::sleep(self.inner.subscribe_backoff).await;
        }
    }

    /// Forget the active conversation and the latest suggestion.
    pub fn clear_conversation(&self) {
        self.inner.conversation_tx.send_replace(None);
        self.inner.suggestion_tx.send_replace(None);
    }

    pub fn active_conversation(&self) -> Option<String> {
        self.inner.conversation_tx.borrow().clone()
    }

    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.inner.state_tx.subscribe()
    }

    pub fn current_state(&self) -> ChannelState {
        *self.inner.state_tx.borrow()
    }

    /// Watch the newest pushed suggestion.
    pub fn suggestions(&self) -> watch::Receiver<Option<String>> {
        self.inner.suggestion_tx.subscribe()
    }

    pub fn latest_suggestion(&self) -> Option<String> {
        self.inner.suggestion_tx.borrow().clone()
    }
}
