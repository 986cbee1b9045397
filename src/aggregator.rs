//! Content aggregation from monitored accounts and trending search

use crate::config::AggregatorConfig;
use crate::services::SocialSearch;
use crate::types::Post;
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Collects candidate posts for the proposal generator
pub struct ContentAggregator {
    search: Arc<dyn SocialSearch>,
    config: AggregatorConfig,
}

impl ContentAggregator {
    pub fn new(search: Arc<dyn SocialSearch>, config: AggregatorConfig) -> Self {
        Self { search, config }
    }

    /// Fetch from every account, then trending, and drop repeated ids.
    ///
    /// Source failures are logged and skipped, so this never fails; an empty
    /// vector means nothing was found.
    pub async fn collect(&self) -> Vec<Post> {
        info!("Fetching from {} monitored accounts", self.config.accounts.len());
        let mut all_posts = self.fetch_from_accounts().await;

        info!("Fetching trending topics");
        all_posts.extend(self.fetch_trending().await);

        let unique = dedup_posts(all_posts);
        info!("Total unique posts: {}", unique.len());
        unique
    }

    async fn fetch_from_accounts(&self) -> Vec<Post> {
        let since = since_date(self.config.account_lookback_days);
        let mut posts = Vec::new();

        for account in &self.config.accounts {
            let query = account_query(account, &since);
            match self.search.search(&query, self.config.posts_per_account).await {
                Ok(found) if !found.is_empty() => {
                    info!("  {}: {} posts", account, found.len());
                    posts.extend(found);
                }
                Ok(_) => info!("  {}: no posts", account),
                Err(e) => warn!("  {}: {}", account, e),
            }
        }

        posts
    }

    async fn fetch_trending(&self) -> Vec<Post> {
        let since = since_date(self.config.trending_lookback_days);
        let query = trending_query(
            &self.config.trending_category,
            self.config.trending_min_faves,
            &since,
        );

        match self.search.search(&query, self.config.trending_limit).await {
            Ok(found) => {
                info!("  Trending: {} posts", found.len());
                found
            }
            Err(e) => {
                warn!("  Trending: {}", e);
                Vec::new()
            }
        }
    }
}

fn since_date(days_back: i64) -> String {
    (Utc::now() - Duration::days(days_back))
        .format("%Y-%m-%d")
        .to_string()
}

/// Original posts from one account since `since`
pub fn account_query(account: &str, since: &str) -> String {
    format!("from:{} -filter:replies -filter:retweets since:{}", account, since)
}

/// High-engagement news about `category` since `since`
pub fn trending_query(category: &str, min_faves: u32, since: &str) -> String {
    format!(
        "{} (breaking OR announced OR launch) min_faves:{} since:{}",
        category, min_faves, since
    )
}

/// Keep the first post seen for each id, preserving order
pub fn dedup_posts(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = HashSet::new();
    posts
        .into_iter()
        .filter(|post| seen.insert(post.id.clone()))
        .collect()
}
