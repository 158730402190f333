//! Conversion logic between DTOs and domain entities.

use madoguchi_shared::time::millis_to_rfc3339;

use crate::domain::{
    Connection, ConversationId, InboundMessageEvent, MessageKind, ParticipantRole,
    SuggestionResult, ValueObjectError,
};
use crate::infrastructure::dto::{
    http::{ConnectionDto, InboundMessageEventDto},
    websocket::SuggestionPush,
};

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<InboundMessageEventDto> for InboundMessageEvent {
    type Error = ValueObjectError;

    fn try_from(dto: InboundMessageEventDto) -> Result<Self, Self::Error> {
        Ok(Self::new(
            ConversationId::new(dto.conversation_id)?,
            ParticipantRole::parse(&dto.participant_role),
            MessageKind::parse(&dto.kind),
            dto.content,
        ))
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<InboundMessageEvent> for InboundMessageEventDto {
    fn from(model: InboundMessageEvent) -> Self {
        Self {
            conversation_id: model.conversation_id.into_string(),
            participant_role: model.participant_role.as_str().to_string(),
            kind: model.kind.as_str().to_string(),
            content: model.content,
        }
    }
}

impl From<Connection> for ConnectionDto {
    fn from(model: Connection) -> Self {
        Self {
            connection_id: model.id.into_string(),
            conversation_id: model.conversation_id.map(ConversationId::into_string),
            connected_at: millis_to_rfc3339(model.connected_at.value()),
        }
    }
}

impl From<&SuggestionResult> for SuggestionPush {
    fn from(model: &SuggestionResult) -> Self {
        Self {
            suggestion: model.text().to_string(),
        }
    }
}
