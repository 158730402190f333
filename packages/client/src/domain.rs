//! Client-side ports and pure decision logic.
//!
//! The traits are the seams to the transcript API and the relay's HTTP API;
//! the functions are side-effect free so they can be tested directly.

use async_trait::async_trait;
use madoguchi_server::{
    domain::{MessageKind, ParticipantRole},
    infrastructure::dto::http::{InboundMessageEventDto, TranscriptMessageDto},
};

use crate::error::{HandoffError, TranscriptError};

/// Source of full conversation transcripts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch every message of the conversation, oldest first.
    async fn fetch(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<TranscriptMessageDto>, TranscriptError>;
}

/// Destination of detected customer messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageHandoff: Send + Sync {
    async fn hand_off(&self, event: &InboundMessageEventDto) -> Result<(), HandoffError>;
}

/// Arms the chat platform's message streaming for a conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamingTrigger: Send + Sync {
    /// Returns the platform's success flag.
    async fn enable_streaming(&self, conversation_id: &str) -> Result<bool, HandoffError>;
}

/// State of the duplex channel to the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closed,
    Error,
}

impl ChannelState {
    /// `Closed` and `Error` are final: the channel is not reopened.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Error => "error",
        }
    }
}

/// Whether a transcript item is a message typed by the customer.
pub fn is_customer_message(message: &TranscriptMessageDto) -> bool {
    ParticipantRole::parse(&message.participant_role) == ParticipantRole::Customer
        && MessageKind::parse(&message.kind) == MessageKind::Message
}

/// Pick the newest customer message of a transcript.
///
/// # Returns
///
/// `None` if the transcript holds no customer message
pub fn latest_customer_message(messages: &[TranscriptMessageDto]) -> Option<&TranscriptMessageDto> {
    messages.iter().rev().find(|m| is_customer_message(m))
}

/// Whether `latest` differs from the last content handed off.
pub fn is_new_message(last_seen: Option<&str>, latest: &str) -> bool {
    last_seen != Some(latest)
}

/// Build the event handed off for a customer message.
pub fn customer_event(conversation_id: &str, content: &str) -> InboundMessageEventDto {
    InboundMessageEventDto {
        conversation_id: conversation_id.to_string(),
        participant_role: ParticipantRole::Customer.as_str().to_string(),
        kind: MessageKind::Message.as_str().to_string(),
        content: content.to_string(),
    }
}
