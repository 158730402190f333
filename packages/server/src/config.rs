//! Relay configuration.
//!
//! The binary fills this from command-line arguments (with environment
//! fallbacks); tests use `RelayConfig::default()`.

use std::time::Duration;

/// Runtime configuration of the relay server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Endpoint of the suggestion generator (`POST {customerMessage}`)
    pub generator_url: String,
    /// Timeout of a single suggestion generation call
    pub generator_timeout: Duration,
    /// Endpoint arming the chat platform's message streaming (`POST {conversationId}`)
    pub streaming_url: String,
    /// Timeout of a streaming-enablement call
    pub streaming_timeout: Duration,
    /// How long a per-conversation relay worker waits for events before exiting
    pub worker_idle_timeout: Duration,
}

impl RelayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            generator_url: "http://127.0.0.1:9000/suggestions".to_string(),
            generator_timeout: Duration::from_secs(10),
            streaming_url: "http://127.0.0.1:9000/streaming".to_string(),
            streaming_timeout: Duration::from_secs(5),
            worker_idle_timeout: Duration::from_secs(60),
        }
    }
}
