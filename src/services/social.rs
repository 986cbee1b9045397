//! twitterapi.io advanced search client

use super::{SocialSearch, HTTP_TIMEOUT_SECS};
use crate::config::TwitterApi;
use crate::error::ServiceError;
use crate::types::Post;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Search response; posts arrive under `tweets` or, on some plans, `data`
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    tweets: Option<Vec<Value>>,
    #[serde(default)]
    data: Option<Vec<Value>>,
}

impl SearchResponse {
    /// Decode posts with `tweets` taking priority over `data` when non-empty
    pub fn into_posts(self) -> Vec<Post> {
        let raw = match (self.tweets, self.data) {
            (Some(tweets), _) if !tweets.is_empty() => tweets,
            (_, Some(data)) => data,
            _ => Vec::new(),
        };

        raw.iter().filter_map(Post::from_value).collect()
    }
}

pub struct TwitterSearchClient {
    client: Client,
    api_key: String,
}

impl TwitterSearchClient {
    pub fn new(api_key: String) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl SocialSearch for TwitterSearchClient {
    async fn search(&self, query: &str, count: u32) -> Result<Vec<Post>, ServiceError> {
        debug!("Searching posts: {}", query);

        let response = self
            .client
            .get(TwitterApi::advanced_search_url())
            .header("x-api-key", &self.api_key)
            .query(&[("query", query.to_string()), ("count", count.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.into_posts())
    }
}
