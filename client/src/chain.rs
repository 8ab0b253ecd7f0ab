//! Read-only EVM helpers used before building a swap: ERC-20 allowance and
//! gas estimation against a caller-supplied RPC node.
//!
//! An unreachable node yields `Ok(None)` so callers can tell "no data" apart
//! from a failed call.

use crate::error::{DexError, DexResult};
use ethers::abi::{encode, Token};
use ethers::contract::abigen;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use ethers::utils::id;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

abigen!(
    Erc20Allowance,
    r#"[
        function allowance(address owner, address spender) external view returns (uint256)
    ]"#
);

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const CALL_TIMEOUT: Duration = Duration::from_secs(15);

fn connect(node_url: &str) -> DexResult<Provider<Http>> {
    Provider::<Http>::try_from(node_url)
        .map_err(|e| DexError::invalid(format!("node url {node_url:?}: {e}")))
}

fn parse_address(name: &str, value: &str) -> DexResult<Address> {
    value
        .parse::<Address>()
        .map_err(|e| DexError::invalid(format!("{name} {value:?} is not an EVM address: {e}")))
}

/// `eth_chainId` probe; anything but a timely answer counts as unreachable.
async fn is_reachable(provider: &Provider<Http>) -> bool {
    match timeout(PROBE_TIMEOUT, provider.get_chainid()).await {
        Ok(Ok(chain_id)) => {
            debug!("RPC node reachable (chain id {chain_id})");
            true
        }
        Ok(Err(e)) => {
            warn!("RPC node unreachable: {e}");
            false
        }
        Err(_) => {
            warn!("RPC node did not answer within {PROBE_TIMEOUT:?}");
            false
        }
    }
}

/// Calldata for ERC-20 `approve(spender, amount)`, suitable for [`estimate_gas`].
pub fn approve_calldata(spender: &str, amount: U256) -> DexResult<Bytes> {
    let spender = parse_address("spender", spender)?;
    let mut data = id("approve(address,uint256)").to_vec();
    data.extend(encode(&[Token::Address(spender), Token::Uint(amount)]));
    Ok(Bytes::from(data))
}

/// ERC-20 `allowance(owner, spender)` on `token`.
pub async fn check_allowance(
    node_url: &str,
    token: &str,
    owner: &str,
    spender: &str,
) -> DexResult<Option<U256>> {
    let token = parse_address("token", token)?;
    let owner = parse_address("owner", owner)?;
    let spender = parse_address("spender", spender)?;

    let provider = connect(node_url)?;
    if !is_reachable(&provider).await {
        return Ok(None);
    }

    let contract = Erc20Allowance::new(token, Arc::new(provider));
    let call = contract.allowance(owner, spender);
    let allowance = timeout(CALL_TIMEOUT, call.call())
        .await
        .map_err(|_| DexError::Timeout(CALL_TIMEOUT))?
        .map_err(|e| DexError::Rpc(e.to_string()))?;

    debug!("allowance({owner:?}, {spender:?}) on {token:?} = {allowance}");
    Ok(Some(allowance))
}

/// `eth_estimateGas` for a raw call from `caller` to `to`.
pub async fn estimate_gas(
    node_url: &str,
    to: &str,
    caller: &str,
    value: U256,
    data: Bytes,
) -> DexResult<Option<U256>> {
    let to = parse_address("to", to)?;
    let caller = parse_address("caller", caller)?;

    let provider = connect(node_url)?;
    if !is_reachable(&provider).await {
        return Ok(None);
    }

    let tx: TypedTransaction = TransactionRequest::new()
        .from(caller)
        .to(to)
        .value(value)
        .data(data)
        .into();

    let gas = timeout(CALL_TIMEOUT, provider.estimate_gas(&tx, None))
        .await
        .map_err(|_| DexError::Timeout(CALL_TIMEOUT))?
        .map_err(|e| DexError::Rpc(e.to_string()))?;

    debug!("estimateGas {caller:?} -> {to:?} = {gas}");
    Ok(Some(gas))
}

/// Allowance check and `approve()` gas estimate for one token/spender pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preflight {
    pub allowance: Option<U256>,
    pub approve_gas: Option<U256>,
    /// `None` when the allowance could not be read.
    pub needs_approval: Option<bool>,
}

/// Fetch the allowance and estimate an `approve(spender, amount)` from
/// `owner` concurrently. Either half may be `None` if the node is down.
pub async fn preflight(
    node_url: &str,
    token: &str,
    owner: &str,
    spender: &str,
    amount: U256,
) -> DexResult<Preflight> {
    let calldata = approve_calldata(spender, amount)?;

    let (allowance, approve_gas) = tokio::join!(
        check_allowance(node_url, token, owner, spender),
        estimate_gas(node_url, token, owner, U256::zero(), calldata),
    );
    let (allowance, approve_gas) = (allowance?, approve_gas?);
    if allowance.is_none() || approve_gas.is_none() {
        warn!("RPC node unreachable, preflight incomplete");
    }

    Ok(Preflight {
        allowance,
        approve_gas,
        needs_approval: allowance.map(|a| a < amount),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closed_port, json_rpc_server};
    use serde_json::{json, Value};

    const TOKEN: &str = "0xb1b5d6ae7cb737357766e924d11793f0dc4d4444";
    const OWNER: &str = "0x429752d5f5b595340381b158d80e846f9b20b6da";
    const SPENDER: &str = "0x5c952063c7fc8610ffdb798152d69f0b9550762b";

    fn healthy_node(method: &str, _params: &Value) -> Result<Value, (i64, &'static str)> {
        match method {
            "eth_chainId" => Ok(json!("0x38")),
            // uint256(1000), ABI-encoded
            "eth_call" => Ok(json!(format!("0x{:064x}", 1000))),
            "eth_estimateGas" => Ok(json!("0xb411")),
            _ => Err((-32601, "method not found")),
        }
    }

    fn reverting_node(method: &str, _params: &Value) -> Result<Value, (i64, &'static str)> {
        match method {
            "eth_chainId" => Ok(json!("0x1")),
            _ => Err((3, "execution reverted")),
        }
    }

    #[test]
    fn test_approve_calldata() {
        let amount = U256::from_dec_str("649516185485251500000000").unwrap();
        let data = approve_calldata(SPENDER, amount).unwrap();
        assert_eq!(
            hex::encode(&data),
            "095ea7b30000000000000000000000005c952063c7fc8610ffdb798152d69f0b9550762b00000000000000000000000000000000000000000000898a57ccc69947eb4300"
        );
    }

    #[tokio::test]
    async fn test_allowance_unreachable_is_none() {
        let url = closed_port().await;
        let result = check_allowance(&url, TOKEN, OWNER, SPENDER).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_estimate_gas_unreachable_is_none() {
        let url = closed_port().await;
        let data = Bytes::from(vec![0x09, 0x5e, 0xa7, 0xb3]);
        let result = estimate_gas(&url, TOKEN, OWNER, U256::zero(), data)
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_allowance_decodes_uint256() {
        let url = json_rpc_server(healthy_node).await;
        let result = check_allowance(&url, TOKEN, OWNER, SPENDER).await.unwrap();
        assert_eq!(result, Some(U256::from(1000u64)));
    }

    #[tokio::test]
    async fn test_estimate_gas_reads_result() {
        let url = json_rpc_server(healthy_node).await;
        let result = estimate_gas(&url, TOKEN, OWNER, U256::zero(), Bytes::default())
            .await
            .unwrap();
        assert_eq!(result, Some(U256::from(0xb411u64)));
    }

    #[tokio::test]
    async fn test_revert_after_connect_is_rpc_error() {
        let url = json_rpc_server(reverting_node).await;
        let err = estimate_gas(&url, TOKEN, OWNER, U256::zero(), Bytes::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DexError::Rpc(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_preflight_below_allowance() {
        let url = json_rpc_server(healthy_node).await;
        let result = preflight(&url, TOKEN, OWNER, SPENDER, U256::from(1000u64))
            .await
            .unwrap();
        assert_eq!(result.allowance, Some(U256::from(1000u64)));
        assert_eq!(result.approve_gas, Some(U256::from(0xb411u64)));
        assert_eq!(result.needs_approval, Some(false));
    }

    #[tokio::test]
    async fn test_preflight_above_allowance_needs_approval() {
        let url = json_rpc_server(healthy_node).await;
        let result = preflight(&url, TOKEN, OWNER, SPENDER, U256::from(5000u64))
            .await
            .unwrap();
        assert_eq!(result.needs_approval, Some(true));
    }

    #[tokio::test]
    async fn test_preflight_unreachable_is_empty() {
        let url = closed_port().await;
        let result = preflight(&url, TOKEN, OWNER, SPENDER, U256::from(5000u64))
            .await
            .unwrap();
        assert_eq!(
            result,
            Preflight {
                allowance: None,
                approve_gas: None,
                needs_approval: None,
            }
        );
    }

    #[tokio::test]
    async fn test_preflight_bad_spender_is_invalid_input() {
        let err = preflight("http://127.0.0.1:1", TOKEN, OWNER, "0x12", U256::one())
            .await
            .unwrap_err();
        assert!(matches!(err, DexError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_bad_address_is_invalid_input() {
        let err = check_allowance("http://127.0.0.1:1", "not-an-address", OWNER, SPENDER)
            .await
            .unwrap_err();
        assert!(matches!(err, DexError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_bad_node_url_is_invalid_input() {
        let err = check_allowance("not a url", TOKEN, OWNER, SPENDER)
            .await
            .unwrap_err();
        assert!(matches!(err, DexError::InvalidInput(_)));
    }
}
