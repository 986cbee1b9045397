//! External services the pipeline talks to
//!
//! Each boundary is a trait so the pipeline can be driven by in-memory fakes.
//! The production implementations are thin HTTP clients.

pub mod bubble;
pub mod chain;
pub mod llm;
pub mod social;
pub mod unsplash;

use crate::error::ServiceError;
use crate::types::{EventRecord, Post};
use alloy::primitives::U256;
use async_trait::async_trait;

pub use bubble::BubbleClient;
pub use chain::EvmMarketContract;
pub use llm::AnthropicClient;
pub use social::TwitterSearchClient;
pub use unsplash::UnsplashClient;

/// Timeout for ordinary HTTP calls
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Advanced search over social posts
#[async_trait]
pub trait SocialSearch: Send + Sync {
    async fn search(&self, query: &str, count: u32) -> Result<Vec<Post>, ServiceError>;
}

/// Single prompt, single completion
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Photo lookup for market artwork
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Best landscape match for `query`, `None` when nothing matched
    async fn search_photo(&self, query: &str) -> Result<Option<String>, ServiceError>;

    /// Any landscape photo for `query`
    async fn random_photo(&self, query: &str) -> Result<String, ServiceError>;
}

/// The prediction market contract
#[async_trait]
pub trait MarketContract: Send + Sync {
    /// `minimumDeposit()` in wei
    async fn minimum_deposit(&self) -> Result<U256, ServiceError>;

    /// `currentMarketNumber()`
    async fn current_market_number(&self) -> Result<U256, ServiceError>;

    /// Sign and send `openNewMarket(duration_days)` with `deposit` attached.
    /// Returns the transaction hash.
    async fn open_new_market(&self, duration_days: u64, deposit: U256) -> Result<String, ServiceError>;

    /// `Some(true)` once mined successfully, `Some(false)` if reverted, `None` while pending
    async fn receipt_status(&self, tx_hash: &str) -> Result<Option<bool>, ServiceError>;

    /// Address that signs and pays for markets
    fn creator_address(&self) -> String;
}

/// Backing database holding market listings
#[async_trait]
pub trait EventRegistry: Send + Sync {
    async fn create_event(&self, record: &EventRecord) -> Result<(), ServiceError>;
}
