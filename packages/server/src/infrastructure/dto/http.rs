//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

/// Customer-message event as delivered by the chat platform integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessageEventDto {
    pub conversation_id: String,
    pub participant_role: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}

/// Result of the streaming-enablement trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingResultDto {
    pub success: bool,
}

/// Registry snapshot entry for `/debug/connections`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDto {
    pub connection_id: String,
    pub conversation_id: Option<String>,
    pub connected_at: String,
}

/// One item of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMessageDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub participant_role: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_time: Option<String>,
}

/// Full transcript as returned by the transcript API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranscriptDto {
    #[serde(default)]
    pub messages: Vec<TranscriptMessageDto>,
}
