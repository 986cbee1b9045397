//! Illustrative image lookup for a proposal

use crate::error::truncate;
use crate::services::ImageSearch;
use crate::types::Category;
use std::sync::Arc;
use tracing::{info, warn};

/// Words that say nothing about the subject of a market question
const STOP_WORDS: [&str; 13] = [
    "will",
    "by",
    "happen",
    "reach",
    "announce",
    "the",
    "a",
    "an",
    "prediction",
    "market",
    "2024",
    "2025",
    "2026",
];

/// Used when nothing in the question survives filtering
const DEFAULT_KEYWORDS: &str = "cryptocurrency";

/// Search terms appended to the question keywords
pub fn category_context(category: &str) -> &'static str {
    match Category::parse(category) {
        Some(Category::Crypto) => "cryptocurrency bitcoin blockchain",
        Some(Category::Price) => "stock market trading finance",
        Some(Category::Politics) => "politics government capitol",
        Some(Category::Elections) => "voting election democracy",
        Some(Category::Sport) => "sports competition athlete",
        Some(Category::Gaming) => "gaming esports video game",
        Some(Category::Tech) => "technology innovation digital",
        Some(Category::People) => "people crowd community",
        Some(Category::Music) => "music concert performance",
        Some(Category::Pop) => "entertainment celebrity culture",
        _ => "news",
    }
}

/// Broad query for the random-photo fallback
pub fn fallback_query(category: &str) -> &'static str {
    match Category::parse(category) {
        Some(Category::Crypto) => "cryptocurrency",
        Some(Category::Price) => "stock market",
        Some(Category::Politics) => "politics",
        Some(Category::Elections) => "voting",
        Some(Category::Sport) => "sports",
        Some(Category::Gaming) => "gaming",
        Some(Category::Tech) => "technology",
        Some(Category::Music) => "music",
        Some(Category::Pop) => "entertainment",
        _ => "news",
    }
}

/// Up to three meaningful words from a question, lower-cased
pub fn extract_keywords(question: &str) -> String {
    let cleaned = question.to_lowercase().replace('?', " ");

    let words: Vec<&str> = cleaned
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|w| !STOP_WORDS.contains(w))
        .filter(|w| w.chars().count() > 3)
        .take(3)
        .collect();

    if words.is_empty() {
        DEFAULT_KEYWORDS.to_string()
    } else {
        words.join(" ")
    }
}

/// Full search query for a question in `category`
pub fn search_query(question: &str, category: &str) -> String {
    format!("{} {}", extract_keywords(question), category_context(category))
}

pub struct ImageResolver {
    images: Arc<dyn ImageSearch>,
}

impl ImageResolver {
    pub fn new(images: Arc<dyn ImageSearch>) -> Self {
        Self { images }
    }

    /// Image URL for the proposal, or an empty string when nothing could be found
    pub async fn resolve(&self, question: &str, category: &str) -> String {
        let query = search_query(question, category);
        info!("Searching images for '{}'", query);

        match self.images.search_photo(&query).await {
            Ok(Some(url)) => {
                info!("Found image: {}", truncate(&url, 60));
                return url;
            }
            Ok(None) => info!("No image results, using fallback"),
            Err(e) => warn!("Image search failed: {}", e),
        }

        self.fallback(category).await
    }

    async fn fallback(&self, category: &str) -> String {
        let query = fallback_query(category);
        match self.images.random_photo(query).await {
            Ok(url) => {
                info!("Fallback image for '{}': {}", query, truncate(&url, 60));
                url
            }
            Err(e) => {
                warn!("Fallback image failed: {}", e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn test_extract_keywords() {
        assert_eq!(
            extract_keywords("Will Bitcoin reach $150,000 by December 2025?"),
            "bitcoin 150,000 december"
        );
        assert_eq!(
            extract_keywords("Will the SEC approve a Solana ETF?"),
            "approve solana"
        );
        assert_eq!(
            extract_keywords("Will Solana flip Ethereum in 2025, or by 2026."),
            "solana flip ethereum"
        );
        assert_eq!(extract_keywords("Launch \"Pectra\" (2026)."), "launch pectra");
        assert_eq!(extract_keywords("Will it?"), "cryptocurrency");
        assert_eq!(extract_keywords(""), "cryptocurrency");
    }

    #[test]
    fn test_extract_keywords_idempotent() {
        let questions = [
            "Will Bitcoin reach $150,000 by December 2025?",
            "Will the prediction market for Solana? happen",
            "Will Ethereum's Pectra upgrade go live on mainnet by May 2026?",
            "Will Banana split?",
            "WILL ANNOUNCE THE MARKET",
            "a an the by",
            "Tokens: 2025, 2026. \"Mainnet\"!",
        ];

        for q in questions {
            let once = extract_keywords(q);
            assert_eq!(extract_keywords(&once), once, "not idempotent for {:?}", q);
        }
    }

    #[test]
    fn test_category_context() {
        assert_eq!(category_context("Crypto"), "cryptocurrency bitcoin blockchain");
        assert_eq!(category_context("music"), "music concert performance");
        assert_eq!(category_context("People"), "people crowd community");
        assert_eq!(category_context("Personal"), "news");
        assert_eq!(category_context("Finance"), "news");
    }

    #[test]
    fn test_fallback_query() {
        assert_eq!(fallback_query("Crypto"), "cryptocurrency");
        assert_eq!(fallback_query("Price"), "stock market");
        assert_eq!(fallback_query("People"), "news");
        assert_eq!(fallback_query("whatever"), "news");
    }

    #[test]
    fn test_search_query() {
        assert_eq!(
            search_query("Will Coinbase list PEPE?", "Crypto"),
            "coinbase list pepe cryptocurrency bitcoin blockchain"
        );
    }

    struct FakeImages {
        search: Result<Option<String>, String>,
        random: Result<String, String>,
        random_queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageSearch for FakeImages {
        async fn search_photo(&self, _query: &str) -> Result<Option<String>, ServiceError> {
            self.search.clone().map_err(ServiceError::Unexpected)
        }

        async fn random_photo(&self, query: &str) -> Result<String, ServiceError> {
            self.random_queries.lock().unwrap().push(query.to_string());
            self.random.clone().map_err(ServiceError::Unexpected)
        }
    }

    fn resolver(search: Result<Option<String>, String>, random: Result<String, String>) -> (ImageResolver, Arc<FakeImages>) {
        let fake = Arc::new(FakeImages {
            search,
            random,
            random_queries: Mutex::new(Vec::new()),
        });
        (ImageResolver::new(fake.clone()), fake)
    }

    #[tokio::test]
    async fn test_resolve_primary() {
        let (resolver, fake) = resolver(Ok(Some("https://img/1".into())), Ok("https://img/random".into()));
        assert_eq!(resolver.resolve("Will BTC pump?", "Crypto").await, "https://img/1");
        assert!(fake.random_queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_no_results_uses_fallback() {
        let (resolver, fake) = resolver(Ok(None), Ok("https://img/random".into()));
        assert_eq!(resolver.resolve("Will Trump win?", "Politics").await, "https://img/random");
        assert_eq!(fake.random_queries.lock().unwrap().as_slice(), ["politics"]);
    }

    #[tokio::test]
    async fn test_resolve_error_uses_fallback() {
        let (resolver, _) = resolver(Err("503".into()), Ok("https://img/random".into()));
        assert_eq!(resolver.resolve("Will X?", "Unknown").await, "https://img/random");
    }

    #[tokio::test]
    async fn test_resolve_everything_fails() {
        let (resolver, _) = resolver(Err("503".into()), Err("503".into()));
        assert_eq!(resolver.resolve("Will X?", "Crypto").await, "");
    }
}
