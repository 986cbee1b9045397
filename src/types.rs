//! Core types for the prediction market creator

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Default market length when the model omits one
pub const DEFAULT_DURATION_DAYS: u64 = 7;

/// A social post fetched from the search API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub text: String,
    pub like_count: u64,
    pub retweet_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Post {
    /// Build a post from one raw search result.
    ///
    /// The identifier is read from `id` first and `tweet_id` second; results
    /// with neither are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = ["id", "tweet_id"]
            .iter()
            .find_map(|key| value.get(*key).and_then(id_string))?;

        let author = value
            .get("author")
            .and_then(|a| {
                a.get("userName")
                    .or_else(|| a.get("username"))
                    .and_then(Value::as_str)
                    .or_else(|| a.as_str())
            })
            .or_else(|| value.get("username").and_then(Value::as_str))
            .map(str::to_string);

        let text = value
            .get("text")
            .or_else(|| value.get("full_text"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let count = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| value.get(*k).and_then(Value::as_u64))
                .unwrap_or(0)
        };

        Some(Self {
            id,
            author,
            text,
            like_count: count(&["likeCount", "favorite_count"]),
            retweet_count: count(&["retweetCount", "retweet_count"]),
            created_at: value
                .get("createdAt")
                .or_else(|| value.get("created_at"))
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A question remembered in the dedup cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPrediction {
    pub question: String,
    /// ISO-8601 time the market was registered
    pub timestamp: String,
}

/// Market categories accepted by the backing database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Politics,
    Elections,
    Sport,
    Gaming,
    Crypto,
    Price,
    Tech,
    People,
    Personal,
    Music,
    Pop,
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Politics,
        Category::Elections,
        Category::Sport,
        Category::Gaming,
        Category::Crypto,
        Category::Price,
        Category::Tech,
        Category::People,
        Category::Personal,
        Category::Music,
        Category::Pop,
        Category::Other,
    ];

    /// Label exactly as the database stores it
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "Politics",
            Category::Elections => "Elections",
            Category::Sport => "Sport",
            Category::Gaming => "Gaming",
            Category::Crypto => "Crypto",
            Category::Price => "Price",
            Category::Tech => "Tech",
            Category::People => "People",
            Category::Personal => "Personal",
            Category::Music => "music",
            Category::Pop => "Pop",
            Category::Other => "other",
        }
    }

    /// Case-sensitive lookup against the allow-list
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }

    /// Map any label onto the allow-list, falling back to `other`
    pub fn normalize(label: &str) -> Self {
        Self::parse(label).unwrap_or(Category::Other)
    }

    /// Comma separated list used in the model instruction
    pub fn allow_list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured market proposal produced by the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub question: String,
    #[serde(default = "default_duration_days", deserialize_with = "positive_days")]
    pub duration_days: u64,
    /// Free text here; clamped to [`Category`] at registration
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub resolution_criteria: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reasoning: Option<String>,
    #[serde(default, deserialize_with = "lenient_sources")]
    pub sources: Vec<String>,
}

fn default_duration_days() -> u64 {
    DEFAULT_DURATION_DAYS
}

fn default_category() -> String {
    Category::Crypto.as_str().to_string()
}

fn positive_days<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let days = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(DEFAULT_DURATION_DAYS),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match days {
        Some(d) if d > 0 => Ok(d),
        _ => Err(D::Error::custom("duration_days must be a positive whole number")),
    }
}

fn category_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => default_category(),
    })
}

/// Text field that tolerates null and non-string JSON (kept as its JSON text)
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// A list of URLs, a single URL, or nothing
fn lenient_sources<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A market opened on-chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub number: u64,
    pub tx_hash: String,
    pub explorer_url: String,
}

/// Record created in the backing database for every market.
///
/// Field names are the database's display names, spaces and typos included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "tittle")]
    pub title: String,
    pub rules: String,
    #[serde(rename = "duration ( days ) ")]
    pub duration_days: u64,
    pub category: String,
    #[serde(rename = "walletID-event-creator")]
    pub creator_wallet: String,
    #[serde(rename = "Event number")]
    pub market_number: u64,
    #[serde(rename = "closed?")]
    pub closed: bool,
    #[serde(rename = "overrided ? ")]
    pub overridden: bool,
    #[serde(rename = "rewardClaimed?")]
    pub reward_claimed: bool,
    pub privacy: String,
    #[serde(rename = "Reward amount")]
    pub reward_amount: u64,
    #[serde(rename = "final outcome")]
    pub final_outcome: String,
    #[serde(rename = "OUTCOME")]
    pub outcome: String,
    #[serde(rename = "event Preview URL ")]
    pub preview_url: String,
    pub image: String,
}
