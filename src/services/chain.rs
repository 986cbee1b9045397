//! Prediction market contract over raw JSON-RPC
//!
//! Calls are ABI-encoded with `sol!` bindings and sent with plain `eth_call`.
//! `openNewMarket` is signed locally as an EIP-1559 transaction with fixed gas
//! parameters and pushed through `eth_sendRawTransaction`.

use super::{MarketContract, HTTP_TIMEOUT_SECS};
use crate::config::ChainConfig;
use crate::error::ServiceError;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

sol! {
    function openNewMarket(uint256 durationInDays) external payable;
    function currentMarketNumber() external view returns (uint256);
    function minimumDeposit() external view returns (uint256);
}

pub struct EvmMarketContract {
    client: Client,
    rpc_url: String,
    signer: PrivateKeySigner,
    contract: Address,
    chain_id: u64,
    gas_limit: u64,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
}

impl EvmMarketContract {
    /// Parse the key and contract address and confirm the endpoint answers.
    ///
    /// Any failure here is a startup error.
    pub async fn connect(
        rpc_url: String,
        private_key: &str,
        chain: &ChainConfig,
    ) -> anyhow::Result<Self> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .context("Failed to parse private key")?;
        let contract: Address = chain
            .contract_address
            .parse()
            .context("Invalid contract address")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        let mut this = Self {
            client,
            rpc_url,
            signer,
            contract,
            chain_id: 0,
            gas_limit: chain.gas_limit,
            max_fee_per_gas: chain.max_fee_per_gas_wei,
            max_priority_fee_per_gas: chain.max_priority_fee_per_gas_wei,
        };

        let chain_id = this
            .rpc("eth_chainId", json!([]))
            .await
            .and_then(|v| parse_u64(&v))
            .context("Cannot connect to RPC")?;
        this.chain_id = chain_id;

        info!(
            "Connected to chain {} as {} (contract {})",
            chain_id,
            this.creator_address(),
            contract
        );
        Ok(this)
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, ServiceError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let response = self.client.post(&self.rpc_url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::from_response(response).await);
        }

        let mut body: Value = response.json().await?;
        if let Some(error) = body.get("error") {
            return Err(ServiceError::Rpc(error.to_string()));
        }

        Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
    }

    async fn call_uint(&self, calldata: Vec<u8>) -> Result<U256, ServiceError> {
        let result = self
            .rpc(
                "eth_call",
                json!([{
                    "to": self.contract.to_string(),
                    "data": format!("0x{}", hex::encode(calldata)),
                }, "latest"]),
            )
            .await?;

        parse_quantity(&result)
    }

    fn sign_open_market(
        &self,
        nonce: u64,
        duration_days: u64,
        deposit: U256,
    ) -> Result<String, ServiceError> {
        let call = openNewMarketCall {
            durationInDays: U256::from(duration_days),
        };

        let tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            gas_limit: self.gas_limit,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            to: TxKind::Call(self.contract),
            value: deposit,
            input: Bytes::from(call.abi_encode()),
            ..Default::default()
        };

        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| ServiceError::Unexpected(format!("signing failed: {}", e)))?;
        let envelope = TxEnvelope::from(tx.into_signed(signature));

        Ok(format!("0x{}", hex::encode(envelope.encoded_2718())))
    }
}

#[async_trait]
impl MarketContract for EvmMarketContract {
    async fn minimum_deposit(&self) -> Result<U256, ServiceError> {
        self.call_uint(minimumDepositCall {}.abi_encode()).await
    }

    async fn current_market_number(&self) -> Result<U256, ServiceError> {
        self.call_uint(currentMarketNumberCall {}.abi_encode()).await
    }

    async fn open_new_market(&self, duration_days: u64, deposit: U256) -> Result<String, ServiceError> {
        // Nonce is read right before signing; a concurrent sender on this key would collide
        let nonce = self
            .rpc(
                "eth_getTransactionCount",
                json!([self.signer.address().to_string(), "latest"]),
            )
            .await
            .and_then(|v| parse_u64(&v))?;
        debug!("Nonce {} for {}", nonce, self.creator_address());

        let raw = self.sign_open_market(nonce, duration_days, deposit)?;
        let result = self.rpc("eth_sendRawTransaction", json!([raw])).await?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Unexpected(format!("no tx hash in response: {}", result)))
    }

    async fn receipt_status(&self, tx_hash: &str) -> Result<Option<bool>, ServiceError> {
        let receipt = self.rpc("eth_getTransactionReceipt", json!([tx_hash])).await?;
        Ok(receipt_success(&receipt))
    }

    fn creator_address(&self) -> String {
        self.signer.address().to_checksum(None)
    }
}

/// `None` while the receipt is missing, otherwise whether `status` is 1
pub fn receipt_success(receipt: &Value) -> Option<bool> {
    if receipt.is_null() {
        return None;
    }
    let status = receipt.get("status").and_then(Value::as_str).unwrap_or("0x0");
    Some(matches!(parse_quantity(&json!(status)), Ok(v) if v == U256::from(1)))
}

/// Parse a hex quantity or 32-byte word returned by the node
pub fn parse_quantity(value: &Value) -> Result<U256, ServiceError> {
    let text = value
        .as_str()
        .ok_or_else(|| ServiceError::Unexpected(format!("expected hex string, got {}", value)))?;
    let hex_str = text.strip_prefix("0x").unwrap_or(text);
    if hex_str.is_empty() {
        return Err(ServiceError::Unexpected("empty return data".to_string()));
    }

    U256::from_str_radix(hex_str, 16)
        .map_err(|e| ServiceError::Unexpected(format!("bad quantity {}: {}", text, e)))
}

fn parse_u64(value: &Value) -> Result<u64, ServiceError> {
    let quantity = parse_quantity(value)?;
    u64::try_from(quantity)
        .map_err(|_| ServiceError::Unexpected(format!("quantity {} overflows u64", quantity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x1")).unwrap(), U256::from(1));
        assert_eq!(
            parse_quantity(&json!(
                "0x000000000000000000000000000000000000000000000000000000000000002a"
            ))
            .unwrap(),
            U256::from(42)
        );
        assert!(parse_quantity(&json!("0x")).is_err());
        assert!(parse_quantity(&json!(null)).is_err());
        assert!(parse_quantity(&json!("0xzz")).is_err());
    }

    #[test]
    fn test_receipt_success() {
        assert_eq!(receipt_success(&Value::Null), None);
        assert_eq!(receipt_success(&json!({"status": "0x1"})), Some(true));
        assert_eq!(receipt_success(&json!({"status": "0x0"})), Some(false));
        assert_eq!(receipt_success(&json!({})), Some(false));
    }

    #[test]
    fn test_open_market_calldata() {
        let call = openNewMarketCall {
            durationInDays: U256::from(7),
        };
        let data = call.abi_encode();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], openNewMarketCall::SELECTOR.as_slice());
        assert_eq!(data[35], 7);
    }

    #[test]
    fn test_view_calldata_is_selector_only() {
        assert_eq!(currentMarketNumberCall {}.abi_encode().len(), 4);
        assert_eq!(minimumDepositCall {}.abi_encode().len(), 4);
    }
}
