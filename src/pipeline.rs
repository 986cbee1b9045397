//! One pass of the market creation pipeline
//!
//! posts → proposal → image → on-chain market → database record → cache.
//! Steps run strictly in order. Generation and market creation failures end
//! the run; everything else degrades and carries on.

use crate::aggregator::ContentAggregator;
use crate::cache::PredictionCache;
use crate::config::{AggregatorConfig, ChainConfig, Config};
use crate::error::{GenerationError, PipelineError};
use crate::image::ImageResolver;
use crate::market::MarketCreator;
use crate::proposal::ProposalGenerator;
use crate::registrar::Registrar;
use crate::services::{
    AnthropicClient, BubbleClient, EventRegistry, EvmMarketContract, ImageSearch, LanguageModel,
    MarketContract, SocialSearch, TwitterSearchClient, UnsplashClient,
};
use crate::types::{Market, Proposal};
use anyhow::Context;
use std::sync::Arc;
use tracing::{error, info, warn};

/// External collaborators, built once at startup
pub struct Services {
    pub social: Arc<dyn SocialSearch>,
    pub model: Arc<dyn LanguageModel>,
    pub images: Arc<dyn ImageSearch>,
    pub contract: Arc<dyn MarketContract>,
    pub registry: Arc<dyn EventRegistry>,
}

impl Services {
    /// Production clients for every service. Fails if the chain endpoint is unreachable.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let social = TwitterSearchClient::new(config.twitter_api_key.clone())
            .context("Failed to create social search client")?;
        let model = AnthropicClient::new(
            config.anthropic_api_key.clone(),
            config.anthropic_model.clone(),
            config.anthropic_max_tokens,
        )
        .context("Failed to create model client")?;
        let images = UnsplashClient::new(config.unsplash_access_key.clone())
            .context("Failed to create image client")?;
        let registry = BubbleClient::new(config.bubble_api_key.clone(), &config.bubble_root)
            .context("Failed to create database client")?;
        let contract =
            EvmMarketContract::connect(config.rpc_url.clone(), &config.private_key, &config.chain)
                .await?;

        Ok(Self {
            social: Arc::new(social),
            model: Arc::new(model),
            images: Arc::new(images),
            contract: Arc::new(contract),
            registry: Arc::new(registry),
        })
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub proposal: Proposal,
    pub market: Market,
    pub image_url: String,
    /// Database accepted the record
    pub registered: bool,
    /// Question was written to the dedup cache
    pub cached: bool,
}

#[derive(Debug, Clone)]
pub enum RunReport {
    /// No posts were found; nothing was attempted
    NoContent,
    Completed(RunSummary),
}

/// Proposal and artwork without touching chain or database
#[derive(Debug, Clone)]
pub struct Preview {
    pub proposal: Proposal,
    pub image_url: String,
    pub posts_considered: usize,
}

pub struct Pipeline {
    aggregator: ContentAggregator,
    cache: PredictionCache,
    generator: ProposalGenerator,
    images: ImageResolver,
    creator: MarketCreator,
    registrar: Registrar,
    creator_wallet: String,
}

impl Pipeline {
    pub fn new(
        services: Services,
        aggregator: AggregatorConfig,
        chain: ChainConfig,
        cache: PredictionCache,
    ) -> Self {
        let creator_wallet = services.contract.creator_address();

        Self {
            aggregator: ContentAggregator::new(services.social, aggregator),
            cache,
            generator: ProposalGenerator::new(services.model),
            images: ImageResolver::new(services.images),
            creator: MarketCreator::new(services.contract, chain),
            registrar: Registrar::new(services.registry),
            creator_wallet,
        }
    }

    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let services = Services::from_config(config).await?;
        Ok(Self::new(
            services,
            config.aggregator.clone(),
            config.chain.clone(),
            PredictionCache::new(&config.cache_path),
        ))
    }

    pub fn cache(&self) -> &PredictionCache {
        &self.cache
    }

    /// Run every step once
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let recent = self.cache.load();

        let posts = self.aggregator.collect().await;
        if posts.is_empty() {
            warn!("No posts found, nothing to do");
            return Ok(RunReport::NoContent);
        }

        let proposal = self.generator.generate(&posts, &recent).await?;
        info!(
            "Proposal: {} [{}; {} days]",
            proposal.question, proposal.category, proposal.duration_days
        );

        let image_url = self.images.resolve(&proposal.question, &proposal.category).await;

        let market = self.creator.create(proposal.duration_days).await?;

        let registered = self
            .registrar
            .register(&proposal, market.number, &self.creator_wallet, &image_url)
            .await;

        let cached = registered
            && match self.cache.save(&proposal.question) {
                Ok(_) => true,
                Err(e) => {
                    error!("Could not save to cache: {:#}", e);
                    false
                }
            };

        Ok(RunReport::Completed(RunSummary {
            proposal,
            market,
            image_url,
            registered,
            cached,
        }))
    }

    /// Generate a proposal and pick its image, stopping before any chain call
    pub async fn preview(&self) -> Result<Option<Preview>, GenerationError> {
        let recent = self.cache.load();
        let posts = self.aggregator.collect().await;
        if posts.is_empty() {
            return Ok(None);
        }

        let proposal = self.generator.generate(&posts, &recent).await?;
        let image_url = self.images.resolve(&proposal.question, &proposal.category).await;

        Ok(Some(Preview {
            proposal,
            image_url,
            posts_considered: posts.len(),
        }))
    }
}
