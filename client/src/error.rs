use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

pub type DexResult<T> = std::result::Result<T, DexError>;

/// Failures surfaced by the DEX client and the on-chain helpers.
#[derive(Debug, Error)]
pub enum DexError {
    /// Rejected before any network call was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed JSON response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The node answered but the call itself failed (revert, bad params, ...).
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl DexError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Classify a reqwest failure, keeping timeouts distinct.
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Transport(err)
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
