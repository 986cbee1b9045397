//! Persisted list of recently used questions
//!
//! The file is a pretty-printed JSON array in chronological order. It is read at
//! the start of every run and rewritten whole after a market is registered.
//! There is no locking: only one instance may run at a time.

use crate::types::RecentPrediction;
use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Most questions kept on disk
pub const MAX_RECENT: usize = 50;

/// Questions handed to the model as topics to avoid
pub const AVOID_CONTEXT: usize = 10;

pub struct PredictionCache {
    path: PathBuf,
}

impl PredictionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cache; a missing or unreadable file yields an empty list
    pub fn load(&self) -> Vec<RecentPrediction> {
        if !self.path.exists() {
            return Vec::new();
        }

        let parsed = fs::read_to_string(&self.path)
            .map_err(anyhow::Error::from)
            .and_then(|text| {
                serde_json::from_str::<Vec<RecentPrediction>>(&text).map_err(anyhow::Error::from)
            });

        match parsed {
            Ok(recent) => {
                info!("Loaded {} recent predictions from cache", recent.len());
                recent
            }
            Err(e) => {
                warn!("Could not load cache {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Append `question` and keep only the newest [`MAX_RECENT`] entries.
    ///
    /// Returns the number of entries now stored.
    pub fn save(&self, question: &str) -> Result<usize> {
        let mut recent = self.load();
        recent.push(RecentPrediction {
            question: question.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        });

        let excess = recent.len().saturating_sub(MAX_RECENT);
        recent.drain(..excess);

        let json = serde_json::to_string_pretty(&recent)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache {}", self.path.display()))?;

        info!("Saved to cache (now {} total)", recent.len());
        Ok(recent.len())
    }
}

/// The newest [`AVOID_CONTEXT`] questions, oldest first
pub fn avoid_list(recent: &[RecentPrediction]) -> Vec<&str> {
    let start = recent.len().saturating_sub(AVOID_CONTEXT);
    recent[start..].iter().map(|p| p.question.as_str()).collect()
}
