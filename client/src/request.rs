//! Canonical request descriptors for every supported aggregator endpoint.
//!
//! Query parameters are appended in a fixed order and never percent-encoded,
//! so the path that gets signed is byte-identical to the path that is sent.

use crate::error::{DexError, DexResult};
use crate::types::{Amount, ChainIndex, SwapMode};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Display;

pub const SUPPORTED_CHAIN_PATH: &str = "/api/v5/dex/aggregator/supported/chain";
pub const ALL_TOKENS_PATH: &str = "/api/v5/dex/aggregator/all-tokens";
pub const LIQUIDITY_PATH: &str = "/api/v5/dex/aggregator/get-liquidity";
pub const APPROVE_TRANSACTION_PATH: &str = "/api/v5/dex/aggregator/approve-transaction";
pub const QUOTE_PATH: &str = "/api/v5/dex/aggregator/quote";
pub const SWAP_PATH: &str = "/api/v5/dex/aggregator/swap";
pub const HISTORY_PATH: &str = "/api/v5/dex/aggregator/history";
pub const GAS_LIMIT_PATH: &str = "/api/v5/dex/pre-transaction/gas-limit";

/// Everything that goes into the signature: method, path with query, body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexRequest {
    pub method: Method,
    pub path: String,
    /// Serialized JSON payload; empty for GET.
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct QuoteParams {
    pub chain_index: ChainIndex,
    pub swap_mode: SwapMode,
    pub amount: Amount,
    pub from_token_address: String,
    pub to_token_address: String,
    pub slippage: Decimal,
}

#[derive(Debug, Clone)]
pub struct SwapParams {
    pub chain_index: ChainIndex,
    pub swap_mode: SwapMode,
    pub amount: Amount,
    pub from_token_address: String,
    pub to_token_address: String,
    pub user_wallet_address: String,
    pub slippage: Decimal,
}

/// Body of the gas-limit POST. Field order is the wire order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GasLimitParams {
    pub chain_index: ChainIndex,
    pub from_address: String,
    pub to_address: String,
    pub tx_amount: u128,
    pub ext_json: ExtJson,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtJson {
    pub input_data: String,
}

impl GasLimitParams {
    pub fn new(
        chain_index: ChainIndex,
        from_address: &str,
        to_address: &str,
        tx_amount: u128,
        input_data: &str,
    ) -> Self {
        Self {
            chain_index,
            from_address: from_address.to_string(),
            to_address: to_address.to_string(),
            tx_amount,
            ext_json: ExtJson {
                input_data: input_data.to_string(),
            },
        }
    }
}

/// Ordered query builder. Values are written as-is.
struct PathBuilder {
    path: String,
    first: bool,
}

impl PathBuilder {
    fn new(route: &str) -> Self {
        Self {
            path: route.to_string(),
            first: true,
        }
    }

    fn param(mut self, key: &str, value: impl Display) -> Self {
        self.path.push(if self.first { '?' } else { '&' });
        self.first = false;
        self.path.push_str(key);
        self.path.push('=');
        self.path.push_str(&value.to_string());
        self
    }

    fn build(self) -> String {
        self.path
    }
}

/// Reject values that would break the unencoded query string.
fn check_token<'a>(name: &str, value: &'a str) -> DexResult<&'a str> {
    if value.is_empty() {
        return Err(DexError::invalid(format!("{name} must not be empty")));
    }
    if value
        .chars()
        .any(|c| matches!(c, '&' | '=' | '?' | '#') || c.is_whitespace())
    {
        return Err(DexError::invalid(format!(
            "{name} contains a reserved character: {value:?}"
        )));
    }
    Ok(value)
}

fn check_slippage(slippage: Decimal) -> DexResult<Decimal> {
    if slippage < Decimal::ZERO || slippage > Decimal::ONE {
        return Err(DexError::invalid(format!(
            "slippage must be a fraction between 0 and 1, got {slippage}"
        )));
    }
    Ok(slippage.normalize())
}

impl DexRequest {
    fn get(path: String) -> Self {
        Self {
            method: Method::GET,
            path,
            body: String::new(),
        }
    }

    pub fn supported_chain(chain_index: ChainIndex) -> Self {
        Self::get(
            PathBuilder::new(SUPPORTED_CHAIN_PATH)
                .param("chainIndex", chain_index)
                .build(),
        )
    }

    pub fn all_tokens(chain_index: ChainIndex) -> Self {
        Self::get(
            PathBuilder::new(ALL_TOKENS_PATH)
                .param("chainIndex", chain_index)
                .build(),
        )
    }

    pub fn liquidity(chain_index: ChainIndex) -> Self {
        Self::get(
            PathBuilder::new(LIQUIDITY_PATH)
                .param("chainIndex", chain_index)
                .build(),
        )
    }

    pub fn approve_transaction(
        chain_index: ChainIndex,
        token_contract_address: &str,
        approve_amount: &Amount,
    ) -> DexResult<Self> {
        let token = check_token("tokenContractAddress", token_contract_address)?;
        Ok(Self::get(
            PathBuilder::new(APPROVE_TRANSACTION_PATH)
                .param("chainIndex", chain_index)
                .param("tokenContractAddress", token)
                .param("approveAmount", approve_amount)
                .build(),
        ))
    }

    pub fn quote(params: &QuoteParams) -> DexResult<Self> {
        let from = check_token("fromTokenAddress", &params.from_token_address)?;
        let to = check_token("toTokenAddress", &params.to_token_address)?;
        let slippage = check_slippage(params.slippage)?;
        Ok(Self::get(
            PathBuilder::new(QUOTE_PATH)
                .param("chainIndex", params.chain_index)
                .param("swapMode", params.swap_mode)
                .param("amount", &params.amount)
                .param("fromTokenAddress", from)
                .param("toTokenAddress", to)
                .param("slippage", slippage)
                .build(),
        ))
    }

    pub fn swap(params: &SwapParams) -> DexResult<Self> {
        let from = check_token("fromTokenAddress", &params.from_token_address)?;
        let to = check_token("toTokenAddress", &params.to_token_address)?;
        let wallet = check_token("userWalletAddress", &params.user_wallet_address)?;
        let slippage = check_slippage(params.slippage)?;
        Ok(Self::get(
            PathBuilder::new(SWAP_PATH)
                .param("chainIndex", params.chain_index)
                .param("swapMode", params.swap_mode)
                .param("amount", &params.amount)
                .param("fromTokenAddress", from)
                .param("toTokenAddress", to)
                .param("userWalletAddress", wallet)
                .param("slippage", slippage)
                .build(),
        ))
    }

    pub fn history(chain_index: ChainIndex, tx_hash: &str) -> DexResult<Self> {
        let tx_hash = check_token("txHash", tx_hash)?;
        Ok(Self::get(
            PathBuilder::new(HISTORY_PATH)
                .param("chainIndex", chain_index)
                .param("txHash", tx_hash)
                .build(),
        ))
    }

    pub fn gas_limit(params: &GasLimitParams) -> DexResult<Self> {
        check_token("fromAddress", &params.from_address)?;
        check_token("toAddress", &params.to_address)?;
        if params.ext_json.input_data.is_empty() {
            return Err(DexError::invalid("inputData must not be empty"));
        }

        let body = serde_json::to_string(params)
            .map_err(|e| DexError::invalid(format!("gas-limit body: {e}")))?;

        Ok(Self {
            method: Method::POST,
            path: GAS_LIMIT_PATH.to_string(),
            body,
        })
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }
}
