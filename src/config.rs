//! Configuration management for the market creator

use anyhow::{bail, Context, Result};
use std::env;

/// Secrets that must be present before anything runs
pub const REQUIRED_VARS: [&str; 6] = [
    "TWITTERAPI_IO_KEY",
    "ANTHROPIC_API_KEY",
    "RPC_URL",
    "PRIVATE_KEY",
    "BUBBLE_API_KEY",
    "UNSPLASH_ACCESS_KEY",
];

/// Bot configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// twitterapi.io key
    pub twitter_api_key: String,

    /// Anthropic key
    pub anthropic_api_key: String,

    /// Model used for proposals
    pub anthropic_model: String,

    /// Token budget for one proposal
    pub anthropic_max_tokens: u32,

    /// JSON-RPC endpoint of the chain hosting the market contract
    pub rpc_url: String,

    /// Hex private key of the market creator
    pub private_key: String,

    /// Bubble data API key
    pub bubble_api_key: String,

    /// Bubble object API root (no trailing slash)
    pub bubble_root: String,

    /// Unsplash access key
    pub unsplash_access_key: String,

    /// Path of the recent predictions cache
    pub cache_path: String,

    /// Content aggregation settings
    pub aggregator: AggregatorConfig,

    /// On-chain market settings
    pub chain: ChainConfig,
}

/// Which posts to collect
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Accounts searched individually
    pub accounts: Vec<String>,
    /// Posts requested per account
    pub posts_per_account: u32,
    /// Lookback for account searches
    pub account_lookback_days: i64,
    /// Keyword for the trending search
    pub trending_category: String,
    /// Posts requested from the trending search
    pub trending_limit: u32,
    /// Lookback for the trending search
    pub trending_lookback_days: i64,
    /// Minimum likes for a trending post
    pub trending_min_faves: u32,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            accounts: vec![
                "WatcherGuru".to_string(),
                "tier10k".to_string(),
                "CoinDesk".to_string(),
                "Cointelegraph".to_string(),
                "TheBlock__".to_string(),
            ],
            posts_per_account: 3,
            account_lookback_days: 2,
            trending_category: "crypto".to_string(),
            trending_limit: 5,
            trending_lookback_days: 1,
            trending_min_faves: 200,
        }
    }
}

/// Contract address and fixed transaction parameters
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub contract_address: String,
    /// Prefix joined with the tx hash for explorer links
    pub explorer_tx_url: String,
    pub gas_limit: u64,
    pub max_fee_per_gas_wei: u128,
    pub max_priority_fee_per_gas_wei: u128,
    /// Deposit used when `minimumDeposit()` cannot be read (0.0001 ETH)
    pub fallback_deposit_wei: u128,
    pub confirmation_timeout_secs: u64,
    pub receipt_poll_interval_secs: u64,
}

const GWEI: u128 = 1_000_000_000;

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            contract_address: "0x5bD295b337911160b1Abcba7AFca93D941c1e839".to_string(),
            explorer_tx_url: "https://sepolia.basescan.org/tx/".to_string(),
            gas_limit: 200_000,
            max_fee_per_gas_wei: 2 * GWEI,
            max_priority_fee_per_gas_wei: GWEI,
            fallback_deposit_wei: 100_000_000_000_000,
            confirmation_timeout_secs: 120,
            receipt_poll_interval_secs: 2,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|name| required(name).is_none())
            .collect();
        if !missing.is_empty() {
            bail!(
                "Missing keys in environment: {} (required: {})",
                missing.join(", "),
                REQUIRED_VARS.join(", ")
            );
        }

        let get = |name: &str| required(name).with_context(|| format!("{} not set", name));

        let anthropic_model = env::var("ANTHROPIC_MODEL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "claude-sonnet-4-20250514".to_string());

        let anthropic_max_tokens = env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(800);

        let bubble_root = env::var("BUBBLE_ROOT")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| BubbleApi::DEFAULT_ROOT.to_string())
            .trim_end_matches('/')
            .to_string();

        let cache_path = cache_path();

        let mut aggregator = AggregatorConfig::default();
        if let Some(category) = env::var("TRENDING_CATEGORY").ok().filter(|s| !s.is_empty()) {
            aggregator.trending_category = category;
        }

        let mut chain = ChainConfig::default();
        if let Some(address) = env::var("CONTRACT_ADDRESS").ok().filter(|s| !s.is_empty()) {
            chain.contract_address = address;
        }
        if let Some(url) = env::var("EXPLORER_TX_URL").ok().filter(|s| !s.is_empty()) {
            chain.explorer_tx_url = url;
        }

        Ok(Self {
            twitter_api_key: get("TWITTERAPI_IO_KEY")?,
            anthropic_api_key: get("ANTHROPIC_API_KEY")?,
            anthropic_model,
            anthropic_max_tokens,
            rpc_url: get("RPC_URL")?,
            private_key: get("PRIVATE_KEY")?,
            bubble_api_key: get("BUBBLE_API_KEY")?,
            bubble_root,
            unsplash_access_key: get("UNSPLASH_ACCESS_KEY")?,
            cache_path,
            aggregator,
            chain,
        })
    }
}

pub const DEFAULT_CACHE_FILE: &str = "recent_predictions.json";

/// Cache location from `CACHE_FILE`; needs no other configuration
pub fn cache_path() -> String {
    cache_path_or_default(env::var("CACHE_FILE").ok())
}

fn cache_path_or_default(value: Option<String>) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CACHE_FILE.to_string())
}

fn required(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// twitterapi.io configuration
pub struct TwitterApi;

impl TwitterApi {
    pub const BASE_URL: &'static str = "https://api.twitterapi.io";

    pub fn advanced_search_url() -> String {
        format!("{}/twitter/tweet/advanced_search", Self::BASE_URL)
    }
}

/// Anthropic Messages API configuration
pub struct AnthropicApi;

impl AnthropicApi {
    pub const BASE_URL: &'static str = "https://api.anthropic.com";
    pub const VERSION: &'static str = "2023-06-01";

    pub fn messages_url() -> String {
        format!("{}/v1/messages", Self::BASE_URL)
    }
}

/// Unsplash API configuration
pub struct UnsplashApi;

impl UnsplashApi {
    pub const BASE_URL: &'static str = "https://api.unsplash.com";

    pub fn search_url() -> String {
        format!("{}/search/photos", Self::BASE_URL)
    }

    pub fn random_url() -> String {
        format!("{}/photos/random", Self::BASE_URL)
    }
}

/// Bubble data API configuration
pub struct BubbleApi;

impl BubbleApi {
    pub const DEFAULT_ROOT: &'static str = "https://betbud.live/api/1.1/obj";
    pub const DATA_TYPE: &'static str = "Events";

    pub fn events_url(root: &str) -> String {
        format!("{}/{}", root, Self::DATA_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_defaults() {
        let chain = ChainConfig::default();
        assert_eq!(chain.gas_limit, 200_000);
        assert_eq!(chain.max_fee_per_gas_wei, 2_000_000_000);
        assert_eq!(chain.max_priority_fee_per_gas_wei, 1_000_000_000);
        assert_eq!(chain.fallback_deposit_wei, 10u128.pow(14));
        assert_eq!(chain.confirmation_timeout_secs, 120);
    }

    #[test]
    fn test_aggregator_defaults() {
        let agg = AggregatorConfig::default();
        assert_eq!(agg.accounts.len(), 5);
        assert_eq!(agg.accounts[0], "WatcherGuru");
        assert_eq!(agg.posts_per_account, 3);
        assert_eq!(agg.trending_limit, 5);
    }

    #[test]
    fn test_cache_path_empty_falls_back() {
        assert_eq!(cache_path_or_default(None), DEFAULT_CACHE_FILE);
        assert_eq!(cache_path_or_default(Some(String::new())), DEFAULT_CACHE_FILE);
        assert_eq!(cache_path_or_default(Some("/tmp/c.json".into())), "/tmp/c.json");
    }

    #[test]
    fn test_events_url() {
        assert_eq!(
            BubbleApi::events_url(BubbleApi::DEFAULT_ROOT),
            "https://betbud.live/api/1.1/obj/Events"
        );
    }
}
