//! Message formatting utilities for the agent terminal.

use madoguchi_shared::time::millis_to_rfc3339;

use crate::domain::ChannelState;

const RULE: &str = "------------------------------------------------------------";

/// Formatter for agent terminal output
pub struct SessionFormatter;

impl SessionFormatter {
    /// Format a pushed suggestion
    ///
    /// # Arguments
    ///
    /// * `suggestion` - The suggested answer
    /// * `received_at` - Unix timestamp when the suggestion arrived (milliseconds)
    pub fn format_suggestion(suggestion: &str, received_at: i64) -> String {
        format!(
            "\n\n{}\nSuggestion: {}\nreceived at {}\n{}\n",
            RULE,
            suggestion,
            millis_to_rfc3339(received_at),
            RULE
        )
    }

    /// Format a channel state transition
    pub fn format_channel_state(state: ChannelState) -> String {
        let note = match state {
            ChannelState::Open => "connected to relay",
            ChannelState::Connecting => "connecting to relay...",
            ChannelState::Disconnected => "disconnected from relay",
            ChannelState::Closed => "channel closed",
            ChannelState::Error => "channel failed; restart the agent to reconnect",
        };
        format!("\n[{}] {}\n", state.as_str(), note)
    }

    /// Format the start of a conversation
    ///
    /// # Arguments
    ///
    /// * `conversation_id` - The conversation being handled
    /// * `streaming_enabled` - Whether the platform accepted the streaming request
    pub fn format_conversation_started(conversation_id: &str, streaming_enabled: bool) -> String {
        let streaming = if streaming_enabled {
            "streaming enabled"
        } else {
            "streaming NOT enabled"
        };
        format!(
            "\n============================================================\n\
             Conversation {} started ({})\n\
             ============================================================\n",
            conversation_id, streaming
        )
    }

    pub fn format_conversation_ended(conversation_id: &str) -> String {
        format!("\nConversation {} ended\n", conversation_id)
    }

    /// Format a confirmation after handing off a test message
    pub fn format_test_message_sent(sent_at: i64) -> String {
        format!("test message sent at {}\n", millis_to_rfc3339(sent_at))
    }

    /// Build the input prompt
    pub fn prompt(conversation_id: Option<&str>) -> String {
        match conversation_id {
            Some(id) => format!("{}> ", id),
            None => "> ".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_suggestion() {
        // テスト項目: 提案が受信時刻付きで表示される
        // given (前提条件):
        let suggestion = "Try restarting the app";
        let received_at = 1704067200000;

        // when (操作):
        let result = SessionFormatter::format_suggestion(suggestion, received_at);

        // then (期待する結果):
        assert!(result.contains("Suggestion: Try restarting the app"));
        assert!(result.contains("received at 2024-01-01T00:00:00"));
    }

    #[test]
    fn test_format_channel_state_error() {
        // テスト項目: Error 状態では再起動の案内が表示される
        // given (前提条件):
        let state = ChannelState::Error;

        // when (操作):
        let result = SessionFormatter::format_channel_state(state);

        // then (期待する結果):
        assert!(result.contains("[error]"));
        assert!(result.contains("restart"));
    }

    #[test]
    fn test_format_conversation_started_without_streaming() {
        // テスト項目: ストリーミング有効化に失敗した場合はその旨が表示される
        // given (前提条件):
        let conversation_id = "c1";

        // when (操作):
        let result = SessionFormatter::format_conversation_started(conversation_id, false);

        // then (期待する結果):
        assert!(result.contains("Conversation c1 started"));
        assert!(result.contains("streaming NOT enabled"));
    }

    #[test]
    fn test_prompt() {
        // テスト項目: 会話中はプロンプトに会話 ID が表示される
        // given (前提条件):
        let active = Some("c1");

        // when (操作):
        let with_conversation = SessionFormatter::prompt(active);
        let idle = SessionFormatter::prompt(None);

        // then (期待する結果):
        assert_eq!(with_conversation, "c1> ");
        assert_eq!(idle, "> ");
    }
}
