//! Transcript poller.
//!
//! While a conversation is active the poller fetches the full transcript on a
//! fixed interval, picks the newest customer message and hands it off once per
//! distinct content. Ticks run one at a time on a single task; a tick that is
//! still in flight when the poller is stopped completes, but its result is
//! discarded.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::domain::{
    MessageHandoff, TranscriptSource, customer_event, is_new_message, latest_customer_message,
};

/// Result of one poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The transcript holds no customer message
    EmptyTranscript,
    /// The newest customer message was already handed off
    Unchanged,
    /// A new customer message was handed off; `counter` counts them per conversation
    NewMessage { counter: u64 },
    /// The transcript could not be fetched; the next tick retries
    FetchFailed,
    /// A new message was detected but the hand-off failed
    HandoffFailed { counter: u64 },
    /// The poller was stopped while the tick was in flight
    Discarded,
}

#[derive(Debug, Default)]
struct PollState {
    last_seen: Option<String>,
    counter: u64,
    /// Bumped on every start/stop so that in-flight ticks can detect cancellation.
    generation: u64,
}

struct PollerCore {
    source: Arc<dyn TranscriptSource>,
    handoff: Arc<dyn MessageHandoff>,
    state: Mutex<PollState>,
}

impl PollerCore {
    async fn tick(&self, conversation_id: &str) -> TickOutcome {
        let generation = self.state.lock().await.generation;

        let messages = match self.source.fetch(conversation_id).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Transcript fetch for '{}' failed: {}", conversation_id, e);
                return TickOutcome::FetchFailed;
            }
        };

        let Some(latest) = latest_customer_message(&messages) else {
            return TickOutcome::EmptyTranscript;
        };

        let counter = {
            let mut state = self.state.lock().await;
            if state.generation != generation {
                return TickOutcome::Discarded;
            }
            if !is_new_message(state.last_seen.as_deref(), &latest.content) {
                return TickOutcome::Unchanged;
            }
            // 引き渡しの成否にかかわらず既読にする（同じメッセージは高々1回）
            state.last_seen = Some(latest.content.clone());
            state.counter += 1;
            state.counter
        };

        tracing::info!(
            "New customer message #{} in '{}': {}",
            counter,
            conversation_id,
            latest.content
        );

        let event = customer_event(conversation_id, &latest.content);
        match self.handoff.hand_off(&event).await {
            Ok(()) => TickOutcome::NewMessage { counter },
            Err(e) => {
                tracing::warn!("Hand-off for '{}' failed: {}", conversation_id, e);
                TickOutcome::HandoffFailed { counter }
            }
        }
    }

    async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.last_seen = None;
        state.counter = 0;
    }
}

struct RunningPoll {
    conversation_id: String,
    stop_tx: watch::Sender<bool>,
    // detached on stop; the task exits on its own
    _handle: JoinHandle<()>,
}

/// Periodic transcript poller for one agent session.
pub struct TranscriptPoller {
    core: Arc<PollerCore>,
    interval: Duration,
    running: Mutex<Option<RunningPoll>>,
}

impl TranscriptPoller {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        handoff: Arc<dyn MessageHandoff>,
        interval: Duration,
    ) -> Self {
        Self {
            core: Arc::new(PollerCore {
                source,
                handoff,
                state: Mutex::new(PollState::default()),
            }),
            interval,
            running: Mutex::new(None),
        }
    }

    /// Run a single poll tick for `conversation_id`.
    pub async fn tick(&self, conversation_id: &str) -> TickOutcome {
        self.core.tick(conversation_id).await
    }

    /// Start polling `conversation_id`, stopping any previous poll first.
    pub async fn start(&self, conversation_id: impl Into<String>) {
        let conversation_id = conversation_id.into();
        self.stop().await;

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let core = self.core.clone();
        let interval = self.interval;
        let polled_id = conversation_id.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        let outcome = core.tick(&polled_id).await;
                        tracing::debug!("Poll tick for '{}': {:?}", polled_id, outcome);
                    }
                }
            }
            tracing::debug!("Poller for '{}' stopped", polled_id);
        });

        tracing::info!(
            "Polling transcript of '{}' every {:?}",
            conversation_id,
            self.interval
        );
        *self.running.lock().await = Some(RunningPoll {
            conversation_id,
            stop_tx,
            _handle: handle,
        });
    }

    /// Stop polling and clear the last-seen message and the counter.
    ///
    /// # Returns
    ///
    /// `false` if the poller was not running (the call is a no-op)
    pub async fn stop(&self) -> bool {
        let Some(running) = self.running.lock().await.take() else {
            return false;
        };

        let _ = running.stop_tx.send(true);
        self.core.reset().await;
        tracing::info!("Stopped polling '{}'", running.conversation_id);
        true
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Number of new messages handed off since the poll started.
    pub async fn counter(&self) -> u64 {
        self.core.state.lock().await.counter
    }

    pub async fn last_seen(&self) -> Option<String> {
        self.core.state.lock().await.last_seen.clone()
    }
}
