//! Opening markets on-chain

use crate::config::ChainConfig;
use crate::error::MarketError;
use crate::services::MarketContract;
use crate::types::Market;
use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub struct MarketCreator {
    contract: Arc<dyn MarketContract>,
    config: ChainConfig,
}

impl MarketCreator {
    pub fn new(contract: Arc<dyn MarketContract>, config: ChainConfig) -> Self {
        Self { contract, config }
    }

    /// Deposit required by the contract, or the configured fallback if it can't be read
    pub async fn minimum_deposit(&self) -> U256 {
        match self.contract.minimum_deposit().await {
            Ok(wei) => {
                info!("Min deposit: {} ETH", format_ether(wei));
                wei
            }
            Err(e) => {
                let fallback = U256::from(self.config.fallback_deposit_wei);
                warn!(
                    "Could not read minimum deposit ({}), using {} ETH",
                    e,
                    format_ether(fallback)
                );
                fallback
            }
        }
    }

    /// Open a market lasting `duration_days` and wait for it to be mined.
    ///
    /// The market number is the counter read before sending plus one. Another
    /// sender opening a market in between would make it wrong.
    pub async fn create(&self, duration_days: u64) -> Result<Market, MarketError> {
        let deposit = self.minimum_deposit().await;

        let current = self
            .contract
            .current_market_number()
            .await
            .map_err(MarketError::Counter)?;
        let number = u64::try_from(current)
            .ok()
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| MarketError::CounterOverflow(current.to_string()))?;

        info!("Market #{}, duration: {} days", number, duration_days);

        let tx_hash = self
            .contract
            .open_new_market(duration_days, deposit)
            .await
            .map_err(MarketError::Submit)?;
        info!("TX sent: {}", tx_hash);

        if !self.wait_for_receipt(&tx_hash).await? {
            return Err(MarketError::Reverted { tx_hash });
        }

        let explorer_url = format!("{}{}", self.config.explorer_tx_url, tx_hash);
        info!("Market #{} created: {}", number, explorer_url);

        Ok(Market {
            number,
            tx_hash,
            explorer_url,
        })
    }

    /// Poll for the receipt until the confirmation timeout.
    ///
    /// Lookup errors count as "not yet"; only the deadline ends the wait.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<bool, MarketError> {
        let timeout = Duration::from_secs(self.config.confirmation_timeout_secs);
        let interval = Duration::from_secs(self.config.receipt_poll_interval_secs);
        let deadline = Instant::now() + timeout;

        loop {
            match self.contract.receipt_status(tx_hash).await {
                Ok(Some(success)) => return Ok(success),
                Ok(None) => debug!("Receipt for {} not available yet", tx_hash),
                Err(e) => debug!("Receipt lookup for {} failed: {}", tx_hash, e),
            }

            if Instant::now() + interval >= deadline {
                return Err(MarketError::Timeout {
                    tx_hash: tx_hash.to_string(),
                    secs: self.config.confirmation_timeout_secs,
                });
            }
            tokio::time::sleep(interval).await;
        }
    }
}
