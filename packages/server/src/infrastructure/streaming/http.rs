//! HTTP streaming activator.
//!
//! One POST per conversation start; the caller decides what a failure means.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{ConversationId, StreamingActivator, StreamingError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartStreamingRequest<'a> {
    conversation_id: &'a str,
}

#[derive(Clone)]
pub struct HttpStreamingActivator {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpStreamingActivator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl StreamingActivator for HttpStreamingActivator {
    async fn start_streaming(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<(), StreamingError> {
        let res = self
            .client
            .post(&self.endpoint)
            .json(&StartStreamingRequest {
                conversation_id: conversation_id.as_str(),
            })
            .send()
            .await
            .map_err(|e| StreamingError::Request(e.to_string()))?;
        if !res.status().is_success() {
            return Err(StreamingError::Rejected(res.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_start_streaming_posts_conversation_id() {
        // テスト項目: 会話 ID を含むリクエストが 1 回だけ送信される
        // given (前提条件):
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/streaming")
                    .json_body(json!({"conversationId": "c1"}));
                then.status(200);
            })
            .await;
        let activator =
            HttpStreamingActivator::new(server.url("/streaming"), Duration::from_secs(2)).unwrap();

        // when (操作):
        let result = activator
            .start_streaming(&ConversationId::new("c1".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_start_streaming_rejected() {
        // テスト項目: 2xx 以外のステータスは Rejected エラーになる
        // given (前提条件):
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/streaming");
                then.status(403);
            })
            .await;
        let activator =
            HttpStreamingActivator::new(server.url("/streaming"), Duration::from_secs(2)).unwrap();

        // when (操作):
        let result = activator
            .start_streaming(&ConversationId::new("c1".to_string()).unwrap())
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(StreamingError::Rejected(403)));
    }
}
