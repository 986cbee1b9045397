//! Prediction Market Creator Library
//!
//! Turns crypto news on social media into on-chain yes/no prediction markets:
//!
//! 1. **Aggregate** recent posts from monitored accounts and a trending search.
//! 2. **Propose** a market with a language model, avoiding recently used topics.
//! 3. **Illustrate** it with a photo matched to the question.
//! 4. **Mint** the market on the contract and wait for confirmation.
//! 5. **Register** it in the app database and remember the question.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod image;
pub mod market;
pub mod pipeline;
pub mod proposal;
pub mod registrar;
pub mod services;
pub mod types;

pub use cache::PredictionCache;
pub use config::Config;
pub use error::{GenerationError, MarketError, PipelineError, ServiceError};
pub use pipeline::{Pipeline, Preview, RunReport, RunSummary, Services};
pub use types::{Category, EventRecord, Market, Post, Proposal, RecentPrediction};
