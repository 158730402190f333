//! エンティティ
//!
//! - `Connection`: 1 本の双方向チャンネルの端点（レジストリが所有）
//! - `InboundMessageEvent`: 顧客の発話 1 件（消費後は破棄）
//! - `SuggestionResult`: 提案生成の結果（ファンアウト後は破棄）

use super::{
    error::SuggestionError,
    value_object::{ConnectionId, ConversationId, MessageKind, ParticipantRole, Timestamp},
};

/// 提案生成に失敗した場合、または空だった場合に代わりに配信する文言
pub const NO_SUGGESTION_SENTINEL: &str = "No suggestion available";

/// 接続
///
/// 会話 ID は subscribe 後にのみ設定される。1 接続につき会話は最大 1 つ
/// （再 subscribe は上書き）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub conversation_id: Option<ConversationId>,
    pub connected_at: Timestamp,
}

impl Connection {
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            conversation_id: None,
            connected_at,
        }
    }

    /// 会話を関連付ける（既存の関連付けは上書き）
    pub fn subscribe(&mut self, conversation_id: ConversationId) {
        self.conversation_id = Some(conversation_id);
    }

    pub fn is_subscribed_to(&self, conversation_id: &ConversationId) -> bool {
        self.conversation_id.as_ref() == Some(conversation_id)
    }
}

/// 顧客メッセージイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessageEvent {
    pub conversation_id: ConversationId,
    pub participant_role: ParticipantRole,
    pub kind: MessageKind,
    pub content: String,
}

impl InboundMessageEvent {
    pub fn new(
        conversation_id: ConversationId,
        participant_role: ParticipantRole,
        kind: MessageKind,
        content: String,
    ) -> Self {
        Self {
            conversation_id,
            participant_role,
            kind,
            content,
        }
    }

    /// 顧客からのメッセージ
    pub fn customer_message(conversation_id: ConversationId, content: String) -> Self {
        Self::new(
            conversation_id,
            ParticipantRole::Customer,
            MessageKind::Message,
            content,
        )
    }

    /// 提案生成の対象かどうか（顧客 かつ MESSAGE のみ）
    pub fn is_actionable(&self) -> bool {
        self.participant_role == ParticipantRole::Customer && self.kind == MessageKind::Message
    }
}

/// 提案生成の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionResult {
    Generated(String),
    Unavailable,
}

impl SuggestionResult {
    /// 生成関数の結果を変換する。失敗・空文字はすべて `Unavailable` になる。
    pub fn from_generator(result: Result<String, SuggestionError>) -> Self {
        match result {
            Ok(text) if !text.trim().is_empty() => Self::Generated(text),
            _ => Self::Unavailable,
        }
    }

    /// エージェントに表示するテキスト
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Unavailable => NO_SUGGESTION_SENTINEL,
        }
    }
}
