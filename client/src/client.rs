use crate::auth::Credentials;
use crate::config::Config;
use crate::error::{DexError, DexResult};
use crate::request::{DexRequest, GasLimitParams, QuoteParams, SwapParams};
use crate::types::{Amount, ChainIndex};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Signed client for the OKX DEX aggregator API.
///
/// Responses are handed back as parsed JSON without interpretation; the
/// `code`/`msg` envelope is the caller's business.
#[derive(Clone)]
pub struct DexClient {
    base_url: String,
    credentials: Credentials,
    client: reqwest::Client,
}

impl DexClient {
    pub fn new(config: &Config) -> DexResult<Self> {
        let mut builder = reqwest::Client::builder();

        if let Some(proxy_url) = config.proxy_url.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| DexError::invalid(format!("CLIENT_PROXY {proxy_url:?}: {e}")))?;
            debug!("Routing DEX API traffic through proxy");
            builder = builder.proxy(proxy);
        } else {
            // Only CLIENT_PROXY routes traffic; ignore HTTP(S)_PROXY from the environment.
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(DexError::Transport)?;

        Ok(Self {
            base_url: config.api_base.trim_end_matches('/').to_string(),
            credentials: config.credentials.clone(),
            client,
        })
    }

    /// Sign and dispatch one request. A single attempt; no retries.
    pub async fn send(&self, request: &DexRequest, timeout: Duration) -> DexResult<Value> {
        let auth = self
            .credentials
            .sign_request(request.method.as_str(), &request.path, &request.body);
        let mut headers: HeaderMap = HeaderMap::try_from(auth).map_err(|e| {
            DexError::invalid(format!("credential is not a valid header value: {e}"))
        })?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let url = format!("{}{}", self.base_url, request.path);
        debug!("DEX {} {}", request.method, request.path);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(headers)
            .timeout(timeout);

        if !request.is_get() {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(request.body.clone());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| DexError::from_reqwest(e, timeout))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| DexError::from_reqwest(e, timeout))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            warn!("DEX {} {} returned {status}", request.method, request.path);
            return Err(DexError::Status {
                status,
                body: body.chars().take(300).collect(),
            });
        }

        let value: Value = serde_json::from_slice(&bytes).map_err(DexError::Decode)?;
        debug!("DEX {} {} -> {status}", request.method, request.path);
        Ok(value)
    }

    pub async fn supported_chain(
        &self,
        chain_index: ChainIndex,
        timeout: Duration,
    ) -> DexResult<Value> {
        self.send(&DexRequest::supported_chain(chain_index), timeout).await
    }

    pub async fn all_tokens(&self, chain_index: ChainIndex, timeout: Duration) -> DexResult<Value> {
        self.send(&DexRequest::all_tokens(chain_index), timeout).await
    }

    pub async fn liquidity(&self, chain_index: ChainIndex, timeout: Duration) -> DexResult<Value> {
        self.send(&DexRequest::liquidity(chain_index), timeout).await
    }

    pub async fn approve_transaction(
        &self,
        chain_index: ChainIndex,
        token_contract_address: &str,
        approve_amount: &Amount,
        timeout: Duration,
    ) -> DexResult<Value> {
        let request =
            DexRequest::approve_transaction(chain_index, token_contract_address, approve_amount)?;
        self.send(&request, timeout).await
    }

    pub async fn quote(&self, params: &QuoteParams, timeout: Duration) -> DexResult<Value> {
        self.send(&DexRequest::quote(params)?, timeout).await
    }

    pub async fn swap(&self, params: &SwapParams, timeout: Duration) -> DexResult<Value> {
        self.send(&DexRequest::swap(params)?, timeout).await
    }

    pub async fn history(
        &self,
        chain_index: ChainIndex,
        tx_hash: &str,
        timeout: Duration,
    ) -> DexResult<Value> {
        self.send(&DexRequest::history(chain_index, tx_hash)?, timeout).await
    }

    pub async fn gas_limit(&self, params: &GasLimitParams, timeout: Duration) -> DexResult<Value> {
        self.send(&DexRequest::gas_limit(params)?, timeout).await
    }
}
