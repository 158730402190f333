//! 値オブジェクト
//!
//! 文字列をそのまま扱わず、生成時にバリデーションを行う型で包みます。

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// ID の最大長（外部システムから渡される ID を想定）
const MAX_ID_LENGTH: usize = 256;

fn validate_id(field: &'static str, value: &str) -> Result<(), ValueObjectError> {
    if value.trim().is_empty() {
        return Err(ValueObjectError::Empty(field));
    }
    if value.len() > MAX_ID_LENGTH {
        return Err(ValueObjectError::TooLong {
            field,
            max: MAX_ID_LENGTH,
        });
    }
    Ok(())
}

/// 接続 ID
///
/// チャンネル接続時にトランスポート層が割り当てる不透明な文字列。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id("connection_id", &value)?;
        Ok(Self(value))
    }

    /// UUID v4 から新しい接続 ID を生成
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 会話 ID（コンタクト ID）
///
/// 外部のテレフォニー基盤が割り当てる相関キー。イベントと接続を結びつける。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        validate_id("conversation_id", &value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConversationId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 発言者のロール
///
/// 未知の値は `Other` として保持し、エラーにはしない（フィルタ対象になるだけ）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantRole {
    Customer,
    Agent,
    System,
    Other(String),
}

impl ParticipantRole {
    pub fn parse(value: &str) -> Self {
        match value {
            "CUSTOMER" => Self::Customer,
            "AGENT" => Self::Agent,
            "SYSTEM" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Agent => "AGENT",
            Self::System => "SYSTEM",
            Self::Other(value) => value,
        }
    }
}

/// トランスクリプト項目の種別
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Message,
    Event,
    Attachment,
    Other(String),
}

impl MessageKind {
    pub fn parse(value: &str) -> Self {
        match value {
            "MESSAGE" => Self::Message,
            "EVENT" => Self::Event,
            "ATTACHMENT" => Self::Attachment,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Message => "MESSAGE",
            Self::Event => "EVENT",
            Self::Attachment => "ATTACHMENT",
            Self::Other(value) => value,
        }
    }
}
