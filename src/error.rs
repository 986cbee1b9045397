//! Error types for the proposal pipeline
//!
//! Only [`GenerationError`] and [`MarketError`] abort a run. Everything else is
//! logged by the component that hit it and degrades to an empty result.

use thiserror::Error;

/// Failure talking to one of the external services
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ServiceError {
    /// Build a status error from a non-success response, keeping a short body excerpt
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ServiceError::Status {
            status,
            body: truncate(&body, 300),
        }
    }
}

/// The model could not produce a usable proposal
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("no posts to analyze")]
    NoPosts,
    #[error("language model call failed: {0}")]
    Model(#[from] ServiceError),
    #[error("model output is not valid JSON: {source} (text: {excerpt})")]
    InvalidJson {
        source: serde_json::Error,
        excerpt: String,
    },
    #[error("model output is missing the `question` field")]
    MissingQuestion,
    #[error("invalid proposal: {0}")]
    InvalidProposal(serde_json::Error),
}

/// The market could not be opened on-chain
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("failed to read market counter: {0}")]
    Counter(ServiceError),
    #[error("market counter {0} does not fit in u64")]
    CounterOverflow(String),
    #[error("transaction submission failed: {0}")]
    Submit(ServiceError),
    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },
    #[error("transaction {tx_hash} not confirmed within {secs}s")]
    Timeout { tx_hash: String, secs: u64 },
}

/// Reasons a pipeline run is abandoned
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("proposal generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("market creation failed: {0}")]
    Market(#[from] MarketError),
}

/// Cut `text` to at most `max` characters, on a char boundary
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_pipeline_error_messages() {
        let err: PipelineError = GenerationError::MissingQuestion.into();
        assert!(err.to_string().contains("question"));

        let err: PipelineError = MarketError::Reverted { tx_hash: "0xdead".into() }.into();
        assert_eq!(err.to_string(), "market creation failed: transaction 0xdead reverted");
    }
}
