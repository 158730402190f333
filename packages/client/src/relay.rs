//! HTTP client for the relay's API.
//!
//! - `POST /api/events`: hand off a detected customer message
//! - `POST /api/conversations/{id}/streaming`: arm message streaming

use std::time::Duration;

use async_trait::async_trait;
use madoguchi_server::infrastructure::dto::http::{InboundMessageEventDto, StreamingResultDto};

use crate::{
    domain::{MessageHandoff, StreamingTrigger},
    error::HandoffError,
};

/// Client for the relay's HTTP API.
#[derive(Clone)]
pub struct HttpRelayClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRelayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl MessageHandoff for HttpRelayClient {
    async fn hand_off(&self, event: &InboundMessageEventDto) -> Result<(), HandoffError> {
        let res = self
            .client
            .post(format!("{}/api/events", self.base_url))
            .json(event)
            .send()
            .await
            .map_err(|e| HandoffError::Request(e.to_string()))?;
        if !res.status().is_success() {
            return Err(HandoffError::Rejected(res.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl StreamingTrigger for HttpRelayClient {
    async fn enable_streaming(&self, conversation_id: &str) -> Result<bool, HandoffError> {
        let res = self
            .client
            .post(format!(
                "{}/api/conversations/{}/streaming",
                self.base_url, conversation_id
            ))
            .send()
            .await
            .map_err(|e| HandoffError::Request(e.to_string()))?;
        if !res.status().is_success() {
            return Err(HandoffError::Rejected(res.status().as_u16()));
        }
        let result: StreamingResultDto = res
            .json()
            .await
            .map_err(|e| HandoffError::Malformed(e.to_string()))?;
        Ok(result.success)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    use super::*;
    use crate::domain::customer_event;

    fn relay(server: &MockServer) -> HttpRelayClient {
        HttpRelayClient::new(server.base_url(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_hand_off_posts_event() {
        // テスト項目: 顧客メッセージが /api/events に POST される
        // given (前提条件):
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/events").json_body(json!({
                    "conversationId": "c1",
                    "participantRole": "CUSTOMER",
                    "type": "MESSAGE",
                    "content": "Hi"
                }));
                then.status(202);
            })
            .await;

        // when (操作):
        let result = relay(&server).hand_off(&customer_event("c1", "Hi")).await;

        // then (期待する結果):
        assert_eq!(result, Ok(()));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_hand_off_rejected() {
        // テスト項目: リレーが 400 を返すと Rejected エラーになる
        // given (前提条件):
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/events");
                then.status(400);
            })
            .await;

        // when (操作):
        let result = relay(&server).hand_off(&customer_event("c1", "Hi")).await;

        // then (期待する結果):
        assert_eq!(result, Err(HandoffError::Rejected(400)));
    }

    #[tokio::test]
    async fn test_enable_streaming_returns_success_flag() {
        // テスト項目: ストリーミング有効化の success フラグが返される
        // given (前提条件):
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/conversations/c1/streaming");
                then.status(200).json_body(json!({"success": false}));
            })
            .await;

        // when (操作):
        let result = relay(&server).enable_streaming("c1").await;

        // then (期待する結果):
        assert_eq!(result, Ok(false));
        mock.assert_hits_async(1).await;
    }
}
