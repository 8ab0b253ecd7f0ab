use crate::error::DexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric chain identifier used by the aggregator (1 = Ethereum, 56 = BSC, ...).
pub type ChainIndex = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum SwapMode {
    /// Sell an exact input amount
    #[default]
    ExactIn,
    /// Buy an exact output amount
    ExactOut,
}

impl SwapMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapMode::ExactIn => "exactIn",
            SwapMode::ExactOut => "exactOut",
        }
    }
}

impl fmt::Display for SwapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwapMode {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exactIn" => Ok(SwapMode::ExactIn),
            "exactOut" => Ok(SwapMode::ExactOut),
            other => Err(DexError::invalid(format!(
                "swap mode must be exactIn or exactOut, got {other:?}"
            ))),
        }
    }
}

/// Token amount in minimal units (wei, lamports, ...), kept as a digit string
/// so values beyond `u128` pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(String);

impl Amount {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Amount {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DexError::invalid(format!(
                "amount must be a non-negative integer in minimal units, got {s:?}"
            )));
        }
        Ok(Amount(s.to_string()))
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Amount(v.to_string())
    }
}

impl From<u128> for Amount {
    fn from(v: u128) -> Self {
        Amount(v.to_string())
    }
}
