//! Unsplash photo search client

use super::{ImageSearch, HTTP_TIMEOUT_SECS};
use crate::config::UnsplashApi;
use crate::error::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
    #[serde(default)]
    user: Option<Photographer>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct Photographer {
    #[serde(default)]
    name: Option<String>,
}

pub struct UnsplashClient {
    client: Client,
    access_key: String,
}

impl UnsplashClient {
    pub fn new(access_key: String) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, access_key })
    }

    fn authorization(&self) -> String {
        format!("Client-ID {}", self.access_key)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        params: &[(&str, &str)],
    ) -> Result<T, ServiceError> {
        let response = self
            .client
            .get(url)
            .header("Authorization", self.authorization())
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn search_photo(&self, query: &str) -> Result<Option<String>, ServiceError> {
        let body: SearchResponse = self
            .get(
                UnsplashApi::search_url(),
                &[
                    ("query", query),
                    ("per_page", "1"),
                    ("orientation", "landscape"),
                    ("content_filter", "high"),
                ],
            )
            .await?;

        Ok(body.results.into_iter().next().map(|photo| {
            if let Some(name) = photo.user.and_then(|u| u.name) {
                debug!("Found image by {}", name);
            }
            photo.urls.regular
        }))
    }

    async fn random_photo(&self, query: &str) -> Result<String, ServiceError> {
        let photo: Photo = self
            .get(
                UnsplashApi::random_url(),
                &[("query", query), ("orientation", "landscape")],
            )
            .await?;

        Ok(photo.urls.regular)
    }
}
