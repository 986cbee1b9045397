//! Bubble data API client for market listings

use super::{EventRegistry, HTTP_TIMEOUT_SECS};
use crate::config::BubbleApi;
use crate::error::ServiceError;
use crate::types::EventRecord;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

pub struct BubbleClient {
    client: Client,
    api_key: String,
    events_url: String,
}

impl BubbleClient {
    pub fn new(api_key: String, root: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key,
            events_url: BubbleApi::events_url(root),
        })
    }
}

/// Bubble answers record creation with 200 or 201
pub fn is_created(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::CREATED
}

#[async_trait]
impl EventRegistry for BubbleClient {
    async fn create_event(&self, record: &EventRecord) -> Result<(), ServiceError> {
        debug!("POST {} (market #{})", self.events_url, record.market_number);

        let response = self
            .client
            .post(&self.events_url)
            .bearer_auth(&self.api_key)
            .json(record)
            .send()
            .await?;

        if !is_created(response.status()) {
            return Err(ServiceError::from_response(response).await);
        }

        let body = response.text().await.unwrap_or_default();
        info!("Bubble accepted event: {}", crate::error::truncate(&body, 200));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_statuses() {
        assert!(is_created(StatusCode::OK));
        assert!(is_created(StatusCode::CREATED));
        assert!(!is_created(StatusCode::ACCEPTED));
        assert!(!is_created(StatusCode::BAD_REQUEST));
    }
}
