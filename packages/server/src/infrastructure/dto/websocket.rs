//! WebSocket channel frames.

use serde::{Deserialize, Serialize};

/// Request frame sent by an agent session.
///
/// The `action` field selects the route. Unknown actions fail to parse and are
/// answered with a client-error reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ChannelRequest {
    Connect,
    Disconnect,
    Subscribe {
        #[serde(rename = "conversationId")]
        conversation_id: String,
    },
}

impl ChannelRequest {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Subscribe { .. } => "subscribe",
        }
    }
}

/// Reply frame sent by the relay for every request frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelReply {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChannelReply {
    pub fn ok(action: &str) -> Self {
        Self {
            status: 200,
            action: Some(action.to_string()),
            error: None,
        }
    }

    pub fn failed(status: u16, action: Option<&str>, error: impl Into<String>) -> Self {
        Self {
            status,
            action: action.map(str::to_string),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Push payload delivered to every subscriber of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionPush {
    pub suggestion: String,
}

/// Any frame the relay sends to an agent session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Suggestion(SuggestionPush),
    Reply(ChannelReply),
}
