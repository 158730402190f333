//! HTTP transcript source.
//!
//! GET `{base}/conversations/{conversationId}/transcript` → `{ "messages": [...] }`.

use std::time::Duration;

use async_trait::async_trait;
use madoguchi_server::infrastructure::dto::http::{TranscriptDto, TranscriptMessageDto};

use crate::{domain::TranscriptSource, error::TranscriptError};

/// Client for the conversation transcript API.
#[derive(Clone)]
pub struct HttpTranscriptSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTranscriptSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn transcript_url(&self, conversation_id: &str) -> String {
        format!(
            "{}/conversations/{}/transcript",
            self.base_url, conversation_id
        )
    }
}

#[async_trait]
impl TranscriptSource for HttpTranscriptSource {
    async fn fetch(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<TranscriptMessageDto>, TranscriptError> {
        let res = self
            .client
            .get(self.transcript_url(conversation_id))
            .send()
            .await
            .map_err(|e| TranscriptError::Request(e.to_string()))?;
        if !res.status().is_success() {
            return Err(TranscriptError::Status(res.status().as_u16()));
        }
        let transcript: TranscriptDto = res
            .json()
            .await
            .map_err(|e| TranscriptError::Malformed(e.to_string()))?;
        Ok(transcript.messages)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    fn source(server: &MockServer) -> HttpTranscriptSource {
        HttpTranscriptSource::new(server.base_url(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_messages_in_order() {
        // テスト項目: トランスクリプトのメッセージが順序どおり返される
        // given (前提条件):
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/conversations/c1/transcript");
                then.status(200).json_body(json!({
                    "messages": [
                        {"id": "m1", "participantRole": "CUSTOMER", "type": "MESSAGE", "content": "Hi"},
                        {"id": "m2", "participantRole": "AGENT", "type": "MESSAGE", "content": "Hello"}
                    ]
                }));
            })
            .await;

        // when (操作):
        let messages = source(&server).fetch("c1").await.unwrap();

        // then (期待する結果):
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hi");
        assert_eq!(messages[1].participant_role, "AGENT");
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_fetch_without_messages_field_is_empty() {
        // テスト項目: messages が無いレスポンスは空のトランスクリプトとして扱われる
        // given (前提条件):
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/conversations/c1/transcript");
                then.status(200).json_body(json!({}));
            })
            .await;

        // when (操作):
        let messages = source(&server).fetch("c1").await.unwrap();

        // then (期待する結果):
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_maps_error_status() {
        // テスト項目: 2xx 以外のステータスは Status エラーになる
        // given (前提条件):
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/conversations/c1/transcript");
                then.status(503);
            })
            .await;

        // when (操作):
        let result = source(&server).fetch("c1").await;

        // then (期待する結果):
        assert_eq!(result, Err(TranscriptError::Status(503)));
    }

    #[tokio::test]
    async fn test_fetch_maps_invalid_body_to_malformed() {
        // テスト項目: JSON として読めないボディは Malformed エラーになる
        // given (前提条件):
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/conversations/c1/transcript");
                then.status(200).body("<html>");
            })
            .await;

        // when (操作):
        let result = source(&server).fetch("c1").await;

        // then (期待する結果):
        assert!(matches!(result, Err(TranscriptError::Malformed(_))));
    }
}
