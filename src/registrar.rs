//! Registration of created markets in the backing database

use crate::error::truncate;
use crate::services::EventRegistry;
use crate::types::{Category, EventRecord, Proposal};
use std::sync::Arc;
use tracing::{error, info};

pub struct Registrar {
    registry: Arc<dyn EventRegistry>,
}

impl Registrar {
    pub fn new(registry: Arc<dyn EventRegistry>) -> Self {
        Self { registry }
    }

    /// Create the database record for a market. Returns whether it was accepted.
    ///
    /// A failure here leaves the market on-chain but unlisted.
    pub async fn register(
        &self,
        proposal: &Proposal,
        market_number: u64,
        creator_wallet: &str,
        image_url: &str,
    ) -> bool {
        let record = build_record(proposal, market_number, creator_wallet, image_url);

        info!("Registering market #{} as {}", market_number, record.category);
        if image_url.is_empty() {
            info!("  No image");
        } else {
            info!("  Image: {}", truncate(image_url, 50));
        }

        match self.registry.create_event(&record).await {
            Ok(()) => {
                info!("Registered market #{}", market_number);
                true
            }
            Err(e) => {
                error!("Registration of market #{} failed: {}", market_number, e);
                false
            }
        }
    }
}

/// Map a proposal and its market onto the database schema
pub fn build_record(
    proposal: &Proposal,
    market_number: u64,
    creator_wallet: &str,
    image_url: &str,
) -> EventRecord {
    EventRecord {
        title: proposal.question.clone(),
        // Placeholder only when the model gave no criteria at all; "" is sent as is
        rules: proposal
            .resolution_criteria
            .clone()
            .unwrap_or_else(|| "No rules".to_string()),
        duration_days: proposal.duration_days,
        category: Category::normalize(&proposal.category).to_string(),
        creator_wallet: creator_wallet.to_string(),
        market_number,
        closed: false,
        overridden: false,
        reward_claimed: false,
        privacy: "public".to_string(),
        reward_amount: 0,
        final_outcome: String::new(),
        outcome: String::new(),
        preview_url: String::new(),
        image: image_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn proposal(category: &str) -> Proposal {
        Proposal {
            question: "Will Base launch a token by March 31?".into(),
            duration_days: 14,
            category: category.into(),
            resolution_criteria: Some("Official Base announcement".into()),
            score: Some(9.0),
            reasoning: None,
            sources: vec![],
        }
    }

    #[test]
    fn test_build_record() {
        let record = build_record(&proposal("Crypto"), 17, "0xCreator", "https://img");
        assert_eq!(record.title, "Will Base launch a token by March 31?");
        assert_eq!(record.rules, "Official Base announcement");
        assert_eq!(record.duration_days, 14);
        assert_eq!(record.category, "Crypto");
        assert_eq!(record.market_number, 17);
        assert_eq!(record.creator_wallet, "0xCreator");
        assert_eq!(record.privacy, "public");
        assert_eq!(record.reward_amount, 0);
        assert!(!record.closed && !record.overridden && !record.reward_claimed);
        assert_eq!(record.image, "https://img");
    }

    #[test]
    fn test_category_clamped() {
        assert_eq!(build_record(&proposal("DeFi"), 1, "0x", "").category, "other");
        assert_eq!(build_record(&proposal("crypto"), 1, "0x", "").category, "other");
        assert_eq!(build_record(&proposal("music"), 1, "0x", "").category, "music");
    }

    #[test]
    fn test_missing_rules_placeholder() {
        let mut p = proposal("Tech");
        p.resolution_criteria = None;
        assert_eq!(build_record(&p, 1, "0x", "").rules, "No rules");
    }

    #[test]
    fn test_empty_text_kept_verbatim() {
        let mut p = proposal("Tech");
        p.question = String::new();
        p.resolution_criteria = Some(String::new());
        let record = build_record(&p, 1, "0x", "");
        assert_eq!(record.title, "");
        assert_eq!(record.rules, "");
    }

    struct FakeRegistry {
        fail: bool,
        records: Mutex<Vec<EventRecord>>,
    }

    #[async_trait]
    impl EventRegistry for FakeRegistry {
        async fn create_event(&self, record: &EventRecord) -> Result<(), ServiceError> {
            self.records.lock().unwrap().push(record.clone());
            if self.fail {
                Err(ServiceError::Status {
                    status: 400,
                    body: "bad field".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_register_outcomes() {
        let ok = Arc::new(FakeRegistry { fail: false, records: Mutex::new(vec![]) });
        assert!(Registrar::new(ok.clone()).register(&proposal("Crypto"), 3, "0x", "").await);
        assert_eq!(ok.records.lock().unwrap().len(), 1);

        let failing = Arc::new(FakeRegistry { fail: true, records: Mutex::new(vec![]) });
        assert!(!Registrar::new(failing).register(&proposal("Crypto"), 3, "0x", "").await);
    }
}
