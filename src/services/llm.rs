//! Anthropic Messages API client

use super::LanguageModel;
use crate::config::AnthropicApi;
use crate::error::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Model calls take much longer than ordinary lookups
const MODEL_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(MODEL_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            max_tokens,
        })
    }
}

#[async_trait]
impl LanguageModel for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        debug!("Calling {} ({} max tokens)", self.model, self.max_tokens);

        let response = self
            .client
            .post(AnthropicApi::messages_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", AnthropicApi::VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let parsed: MessagesResponse = response.json().await?;
        first_text(parsed)
    }
}

fn first_text(response: MessagesResponse) -> Result<String, ServiceError> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ServiceError::Unexpected("model returned no text content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_block() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "content": [{"type": "text", "text": "  {\"question\": \"q\"}\n"}]
        }))
        .unwrap();
        assert_eq!(first_text(response).unwrap(), "{\"question\": \"q\"}");
    }

    #[test]
    fn test_no_text_block() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({"content": []})).unwrap();
        assert!(first_text(response).is_err());
    }
}
