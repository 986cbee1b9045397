//! Proposal generation with the language model
//!
//! The model is asked for a single JSON object. Its reply is cleaned in three
//! steps before parsing: fenced code blocks are unwrapped, then everything
//! outside the first `{` and the last `}` is dropped. A reply that still does
//! not parse aborts the run; there is no retry or repair.

use crate::cache::avoid_list;
use crate::error::{truncate, GenerationError};
use crate::services::LanguageModel;
use crate::types::{Category, Post, Proposal, RecentPrediction};
use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Posts forwarded to the model
pub const MAX_PROMPT_POSTS: usize = 10;

pub struct ProposalGenerator {
    model: Arc<dyn LanguageModel>,
}

impl ProposalGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Ask the model for one proposal based on `posts`, steering away from `recent`
    pub async fn generate(
        &self,
        posts: &[Post],
        recent: &[RecentPrediction],
    ) -> Result<Proposal, GenerationError> {
        if posts.is_empty() {
            return Err(GenerationError::NoPosts);
        }

        let prompt = build_prompt(posts, recent);
        debug!("Prompt is {} chars", prompt.len());

        let reply = self.model.complete(&prompt).await?;
        let proposal = parse_proposal(&reply)?;

        info!("Model proposed: {}", truncate(&proposal.question, 80));
        Ok(proposal)
    }
}

/// Instruction sent to the model
pub fn build_prompt(posts: &[Post], recent: &[RecentPrediction]) -> String {
    let avoid = avoid_list(recent);
    let avoid_text = if avoid.is_empty() {
        "None".to_string()
    } else {
        avoid
            .iter()
            .map(|q| format!("- {}", q))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let forwarded = &posts[..posts.len().min(MAX_PROMPT_POSTS)];
    let posts_json = serde_json::to_string(forwarded).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"You are reviewing recent crypto posts to find the single best prediction market to open.

TOPICS ALREADY USED (DO NOT REPEAT):
{avoid_text}

POSTS:
{posts_json}

Instructions:
1. Choose a topic clearly different from the ones already used.
2. Make it concrete and time-bound, with a yes/no answer.
3. Skip vague regulatory deadlines unless the posts add something new.
4. Good candidates: product launches, price targets, mergers, technical releases, scheduled events.

Reply with one JSON object of this shape:
{{
  "question": "Will [specific event] happen by [specific date]?",
  "duration_days": 7,
  "category": "Crypto",
  "resolution_criteria": "How the market resolves, with sources",
  "score": 8.5,
  "reasoning": "Why this market is new and interesting",
  "sources": ["https://example.com/source"]
}}

Allowed categories: {categories}

Return ONLY the JSON object. No markdown, no commentary."#,
        categories = Category::allow_list(),
    )
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
    })
}

/// Reduce raw model output to the JSON object it should contain
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();
    // Prose fences may precede the one carrying the object
    let inner = fence_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .find(|block| block.contains('{'))
        .unwrap_or(text);

    match (inner.find('{'), inner.rfind('}')) {
        (Some(start), Some(end)) if end > start => &inner[start..=end],
        _ => inner,
    }
}

/// Parse and validate a proposal from raw model output
pub fn parse_proposal(text: &str) -> Result<Proposal, GenerationError> {
    let slice = extract_json(text);

    let value: Value = serde_json::from_str(slice).map_err(|source| {
        warn!("JSON parse error: {}", source);
        GenerationError::InvalidJson {
            source,
            excerpt: truncate(slice, 200),
        }
    })?;

    if !value.get("question").map(Value::is_string).unwrap_or(false) {
        return Err(GenerationError::MissingQuestion);
    }

    serde_json::from_value(value).map_err(GenerationError::InvalidProposal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const BARE: &str = r#"{"question": "Will ETH close above $5,000 by Nov 30?", "duration_days": 10, "category": "Price", "resolution_criteria": "CoinGecko daily close", "score": 8.7, "reasoning": "New ATH talk", "sources": ["https://coindesk.com"]}"#;

    fn post(id: usize) -> Post {
        Post {
            id: id.to_string(),
            author: Some("CoinDesk".into()),
            text: format!("headline {}", id),
            like_count: 10,
            retweet_count: 1,
            created_at: None,
        }
    }

    #[test]
    fn test_extract_from_fence_with_prose() {
        let wrapped = format!("Sure! Here is the market:\n```json\n{}\n```\nLet me know.", BARE);
        assert_eq!(parse_proposal(&wrapped).unwrap(), parse_proposal(BARE).unwrap());

        let plain_fence = format!("```\n{}\n```", BARE);
        assert_eq!(extract_json(&plain_fence), BARE);
    }

    #[test]
    fn test_extract_skips_fence_without_object() {
        let text = "Analysis:\n```\nETH upgrade looks most novel\n```\n```json\n{\"question\": \"Will X?\"}\n```";
        assert_eq!(extract_json(text), r#"{"question": "Will X?"}"#);
        assert_eq!(parse_proposal(text).unwrap().question, "Will X?");
    }

    #[test]
    fn test_parse_tolerates_loose_field_types() {
        let proposal = parse_proposal(r#"{"question": "Will X?", "sources": null}"#).unwrap();
        assert!(proposal.sources.is_empty());

        let proposal = parse_proposal(r#"{"question": "Will X?", "sources": "https://a.com"}"#).unwrap();
        assert_eq!(proposal.sources, vec!["https://a.com"]);

        let proposal =
            parse_proposal(r#"{"question": "Will X?", "resolution_criteria": ["CoinGecko", "Binance"]}"#).unwrap();
        assert_eq!(proposal.resolution_criteria.as_deref(), Some(r#"["CoinGecko","Binance"]"#));
    }

    #[test]
    fn test_extract_with_surrounding_prose_only() {
        let text = format!("My pick: {} (hope that helps)", BARE);
        assert_eq!(extract_json(&text), BARE);
    }

    #[test]
    fn test_parse_fields() {
        let proposal = parse_proposal(BARE).unwrap();
        assert_eq!(proposal.duration_days, 10);
        assert_eq!(proposal.category, "Price");
        assert_eq!(proposal.score, Some(8.7));
        assert_eq!(proposal.sources.len(), 1);
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_proposal("```json\n{\"question\": \"Will it\", }\n```").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson { .. }));

        let err = parse_proposal("I could not find anything.").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidJson { .. }));
    }

    #[test]
    fn test_missing_question() {
        let err = parse_proposal(r#"{"category": "Crypto"}"#).unwrap_err();
        assert!(matches!(err, GenerationError::MissingQuestion));
    }

    #[test]
    fn test_defaults_and_unknown_category_pass_through() {
        let proposal = parse_proposal(r#"{"question": "Will X?"}"#).unwrap();
        assert_eq!(proposal.category, "Crypto");
        assert_eq!(proposal.duration_days, 7);

        let proposal = parse_proposal(r#"{"question": "Will X?", "category": "Finance"}"#).unwrap();
        assert_eq!(proposal.category, "Finance");
    }

    #[test]
    fn test_prompt_limits_posts_and_history() {
        let posts: Vec<_> = (0..15).map(post).collect();
        let recent: Vec<_> = (0..12)
            .map(|i| RecentPrediction {
                question: format!("Old question {}?", i),
                timestamp: String::new(),
            })
            .collect();

        let prompt = build_prompt(&posts, &recent);
        assert!(prompt.contains("headline 9"));
        assert!(!prompt.contains("headline 10"));
        assert!(prompt.contains("- Old question 11?"));
        assert!(prompt.contains("- Old question 2?"));
        assert!(!prompt.contains("Old question 1?"));
        assert!(prompt.contains("music, Pop, other"));
    }

    #[test]
    fn test_prompt_without_history() {
        let prompt = build_prompt(&[post(1)], &[]);
        assert!(prompt.contains("(DO NOT REPEAT):\nNone\n"));
    }

    struct CannedModel {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_generate_requires_posts() {
        let model = Arc::new(CannedModel {
            reply: BARE.to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        let generator = ProposalGenerator::new(model.clone());

        let err = generator.generate(&[], &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::NoPosts));
        assert!(model.prompts.lock().unwrap().is_empty());

        let proposal = generator.generate(&[post(1)], &[]).await.unwrap();
        assert_eq!(proposal.category, "Price");
        assert_eq!(model.prompts.lock().unwrap().len(), 1);
    }
}
