//! Agent session configuration.

use std::time::Duration;

/// Runtime configuration of an agent session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Base URL of the relay's HTTP API
    pub relay_url: String,
    /// WebSocket URL of the relay's channel endpoint
    pub channel_url: String,
    /// Base URL of the transcript API
    pub transcript_url: String,
    /// Interval between transcript polls
    pub poll_interval: Duration,
    /// Delay between subscribe attempts while the channel is not open
    pub subscribe_backoff: Duration,
    /// Minimum delay before reconnecting a closed channel
    pub reconnect_delay: Duration,
    /// Timeout of a single HTTP request
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:8080".to_string(),
            channel_url: "ws://127.0.0.1:8080/ws".to_string(),
            transcript_url: "http://127.0.0.1:9100".to_string(),
            poll_interval: Duration::from_secs(2),
            subscribe_backoff: Duration::from_secs(1),
            reconnect_delay: Duration::from_secs(3),
            request_timeout: Duration::from_secs(10),
        }
    }
}
