//! Agent session: one agent's conversation lifecycle.
//!
//! Starting a conversation arms message streaming, subscribes the relay
//! channel and starts the transcript poller; ending it tears all of that down
//! again. Only one conversation is active at a time.

use std::sync::Arc;

use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};

use crate::{
    config::AgentConfig,
    domain::{ChannelState, MessageHandoff, StreamingTrigger, TranscriptSource, customer_event},
    error::ClientError,
    poller::TranscriptPoller,
    relay::HttpRelayClient,
    subscription::{SubscriptionConfig, SubscriptionManager},
    transcript::HttpTranscriptSource,
};

/// An agent's session against the relay.
pub struct AgentSession {
    manager: Arc<SubscriptionManager>,
    poller: TranscriptPoller,
    handoff: Arc<dyn MessageHandoff>,
    streaming: Arc<dyn StreamingTrigger>,
    active: Mutex<Option<String>>,
    subscribe_task: Mutex<Option<JoinHandle<()>>>,
}

impl AgentSession {
    pub fn new(
        manager: Arc<SubscriptionManager>,
        source: Arc<dyn TranscriptSource>,
        handoff: Arc<dyn MessageHandoff>,
        streaming: Arc<dyn StreamingTrigger>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            manager,
            poller: TranscriptPoller::new(source, handoff.clone(), config.poll_interval),
            handoff,
            streaming,
            active: Mutex::new(None),
            subscribe_task: Mutex::new(None),
        }
    }

    /// Build a session backed by the relay and transcript HTTP APIs.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn connect(config: &AgentConfig) -> Result<Self, reqwest::Error> {
        let relay = Arc::new(HttpRelayClient::new(
            config.relay_url.clone(),
            config.request_timeout,
        )?);
        let source = Arc::new(HttpTranscriptSource::new(
            config.transcript_url.clone(),
            config.request_timeout,
        )?);
        let manager = Arc::new(SubscriptionManager::new(SubscriptionConfig {
            url: config.channel_url.clone(),
            subscribe_backoff: config.subscribe_backoff,
            reconnect_delay: config.reconnect_delay,
        }));

        Ok(Self::new(manager, source, relay.clone(), relay, config))
    }

    /// Open the relay channel.
    pub async fn open(&self) {
        self.manager.start().await;
    }

    /// Start handling `conversation_id`, ending the current conversation first.
    ///
    /// # Returns
    ///
    /// Whether the platform accepted the streaming request. A refused or
    /// failed request is logged and not retried; the conversation starts anyway.
    pub async fn start_conversation(&self, conversation_id: &str) -> Result<bool, ClientError> {
        if conversation_id.trim().is_empty() {
            return Err(ClientError::InvalidConversation(conversation_id.to_string()));
        }
        self.end_conversation().await;

        let streaming_enabled = match self.streaming.enable_streaming(conversation_id).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("Platform refused streaming for '{}'", conversation_id);
                false
            }
            Err(e) => {
                tracing::warn!("Streaming request for '{}' failed: {}", conversation_id, e);
                false
            }
        };

        *self.active.lock().await = Some(conversation_id.to_string());

        let manager = self.manager.clone();
        let id = conversation_id.to_string();
        let task = tokio::spawn(async move {
            if let Err(e) = manager.subscribe(&id).await {
                tracing::warn!("Subscribe for '{}' abandoned: {}", id, e);
            }
        });
        *self.subscribe_task.lock().await = Some(task);

        self.poller.start(conversation_id).await;

        tracing::info!("Conversation '{}' started", conversation_id);
        Ok(streaming_enabled)
    }

    /// End the active conversation.
    ///
    /// # Returns
    ///
    /// The ended conversation, or `None` if none was active (the call is a no-op)
    pub async fn end_conversation(&self) -> Option<String> {
        let conversation_id = self.active.lock().await.take()?;

        self.poller.stop().await;
        self.manager.clear_conversation();
        if let Some(task) = self.subscribe_task.lock().await.take() {
            task.abort();
        }

        tracing::info!("Conversation '{}' ended", conversation_id);
        Some(conversation_id)
    }

    /// Hand off a manually typed test message as if the customer had sent it.
    pub async fn submit_test_message(&self, text: &str) -> Result<(), ClientError> {
        let conversation_id = self
            .active
            .lock()
            .await
            .clone()
            .ok_or(ClientError::NoActiveConversation)?;

        let event = customer_event(&conversation_id, text);
        self.handoff.hand_off(&event).await?;
        tracing::info!("Test message handed off for '{}'", conversation_id);
        Ok(())
    }

    pub async fn active_conversation(&self) -> Option<String> {
        self.active.lock().await.clone()
    }

    pub async fn is_polling(&self) -> bool {
        self.poller.is_running().await
    }

    /// Watch the newest suggestion for the active conversation.
    pub fn suggestions(&self) -> watch::Receiver<Option<String>> {
        self.manager.suggestions()
    }

    pub fn channel_state(&self) -> watch::Receiver<ChannelState> {
        self.manager.state()
    }

    /// End the conversation and close the relay channel.
    pub async fn shutdown(&self) {
        self.end_conversation().await;
        self.manager.shutdown().await;
    }
}
