//! Thin, signed client for the OKX DEX aggregator API.
//!
//! [`request::DexRequest`] builds the canonical path and body for each
//! endpoint, [`auth`] signs it, and [`client::DexClient`] sends it and hands
//! back the JSON untouched. [`chain`] holds the read-only RPC helpers used
//! for approval and gas preflight.

pub mod auth;
pub mod chain;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth::{sign, timestamp_now, AuthHeaders, Credentials};
pub use client::DexClient;
pub use config::Config;
pub use error::{DexError, DexResult};
pub use request::{DexRequest, GasLimitParams, QuoteParams, SwapParams};
pub use types::{Amount, ChainIndex, SwapMode};
