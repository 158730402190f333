//! Error types for the agent client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Channel is {0} and will not open again")]
    ChannelUnavailable(String),

    #[error("Conversation '{0}' ended before the request completed")]
    ConversationEnded(String),

    #[error("No active conversation")]
    NoActiveConversation,

    #[error("Invalid conversation id: {0:?}")]
    InvalidConversation(String),

    #[error("Failed to hand off message: {0}")]
    Handoff(#[from] HandoffError),
}

/// Errors returned by a transcript source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("transcript request failed: {0}")]
    Request(String),

    #[error("transcript API returned status {0}")]
    Status(u16),

    #[error("malformed transcript: {0}")]
    Malformed(String),
}

/// Errors returned when talking to the relay's HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandoffError {
    #[error("relay request failed: {0}")]
    Request(String),

    #[error("relay rejected the request with status {0}")]
    Rejected(u16),

    #[error("malformed relay response: {0}")]
    Malformed(String),
}
