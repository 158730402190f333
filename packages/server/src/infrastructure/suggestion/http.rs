//! HTTP suggestion generator client.
//!
//! POST `{ "customerMessage": … }` → `{ "suggestedAnswer": … }`.
//! The relay maps every error returned here to the sentinel suggestion.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{SuggestionError, SuggestionGenerator};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateSuggestionRequest<'a> {
    customer_message: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateSuggestionResponse {
    #[serde(default)]
    suggested_answer: Option<String>,
}

/// Client for an HTTP-exposed suggestion function.
#[derive(Clone)]
pub struct HttpSuggestionGenerator {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpSuggestionGenerator {
    /// `timeout` bounds the whole request, including reading the body.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl SuggestionGenerator for HttpSuggestionGenerator {
    async fn generate(&self, customer_message: &str) -> Result<String, SuggestionError> {
        let res = self
            .client
            .post(&self.endpoint)
            .json(&GenerateSuggestionRequest { customer_message })
            .send()
            .await
            .map_err(|e| SuggestionError::Request(e.to_string()))?;
        if !res.status().is_success() {
            return Err(SuggestionError::Status(res.status().as_u16()));
        }
        let body = res
            .text()
            .await
            .map_err(|e| SuggestionError::Request(e.to_string()))?;
        let data: GenerateSuggestionResponse =
            serde_json::from_str(&body).map_err(|e| SuggestionError::Malformed(e.to_string()))?;
        let answer = data
            .suggested_answer
            .ok_or_else(|| SuggestionError::Malformed("missing suggestedAnswer".to_string()))?;
        if answer.trim().is_empty() {
            return Err(SuggestionError::Empty);
        }
        Ok(answer)
    }
}
