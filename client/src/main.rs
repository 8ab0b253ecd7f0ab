use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethers::types::{Bytes, U256};
use okx_dex::chain;
use okx_dex::{
    Amount, ChainIndex, Config, DexClient, GasLimitParams, QuoteParams, SwapMode, SwapParams,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "okxdex", about = "Signed command-line client for the OKX DEX aggregator API")]
struct Cli {
    /// Load config from a specific .env file
    #[arg(long, global = true)]
    config_file: Option<String>,

    /// Per-request timeout in seconds (overrides REQUEST_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Supported chain info
    Chains {
        #[arg(long, default_value_t = 1)]
        chain: ChainIndex,
    },
    /// All tradable tokens on a chain
    Tokens {
        #[arg(long, default_value_t = 1)]
        chain: ChainIndex,
    },
    /// Liquidity sources on a chain
    Liquidity {
        #[arg(long, default_value_t = 1)]
        chain: ChainIndex,
    },
    /// Build an ERC-20 approve transaction
    Approve {
        #[arg(long, default_value_t = 1)]
        chain: ChainIndex,
        #[arg(long)]
        token: String,
        #[arg(long)]
        amount: Amount,
    },
    /// Best-route quote
    Quote {
        #[arg(long, default_value_t = 1)]
        chain: ChainIndex,
        #[arg(long, default_value = "exactIn")]
        mode: SwapMode,
        #[arg(long)]
        amount: Amount,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, default_value = "0.005")]
        slippage: Decimal,
    },
    /// Build swap transaction data
    Swap {
        #[arg(long, default_value_t = 1)]
        chain: ChainIndex,
        #[arg(long, default_value = "exactIn")]
        mode: SwapMode,
        #[arg(long)]
        amount: Amount,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        wallet: String,
        #[arg(long, default_value = "0.005")]
        slippage: Decimal,
    },
    /// Status of a swap transaction
    History {
        #[arg(long, default_value_t = 1)]
        chain: ChainIndex,
        #[arg(long)]
        tx_hash: String,
    },
    /// Gas limit via the aggregator's pre-transaction API
    GasLimit {
        #[arg(long, default_value_t = 1)]
        chain: ChainIndex,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = 0)]
        value: u128,
        #[arg(long)]
        input_data: String,
    },
    /// ERC-20 allowance via RPC node
    Allowance {
        #[arg(long)]
        node_url: Option<String>,
        #[arg(long)]
        token: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        spender: String,
    },
    /// eth_estimateGas via RPC node
    EstimateGas {
        #[arg(long)]
        node_url: Option<String>,
        #[arg(long)]
        to: String,
        #[arg(long)]
        caller: String,
        #[arg(long, default_value_t = 0)]
        value: u128,
        /// Hex calldata, with or without 0x
        #[arg(long, default_value = "")]
        data: String,
    },
    /// Allowance and approve() gas estimate, fetched concurrently
    Preflight {
        #[arg(long)]
        node_url: Option<String>,
        #[arg(long)]
        token: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        spender: String,
        #[arg(long)]
        amount: Amount,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env_file(cli.config_file.as_deref())?;
    let timeout = cli
        .timeout
        .map(Duration::from_secs)
        .unwrap_or(cfg.request_timeout);

    let output = run(cli.command, &cfg, timeout).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(command: Command, cfg: &Config, timeout: Duration) -> Result<Value> {
    let client = DexClient::new(cfg)?;

    let value = match command {
        Command::Chains { chain } => client.supported_chain(chain, timeout).await?,
        Command::Tokens { chain } => client.all_tokens(chain, timeout).await?,
        Command::Liquidity { chain } => client.liquidity(chain, timeout).await?,
        Command::Approve { chain, token, amount } => {
            client.approve_transaction(chain, &token, &amount, timeout).await?
        }
        Command::Quote { chain, mode, amount, from, to, slippage } => {
            let params = QuoteParams {
                chain_index: chain,
                swap_mode: mode,
                amount,
                from_token_address: from,
                to_token_address: to,
                slippage,
            };
            client.quote(&params, timeout).await?
        }
        Command::Swap { chain, mode, amount, from, to, wallet, slippage } => {
            let params = SwapParams {
                chain_index: chain,
                swap_mode: mode,
                amount,
                from_token_address: from,
                to_token_address: to,
                user_wallet_address: wallet,
                slippage,
            };
            client.swap(&params, timeout).await?
        }
        Command::History { chain, tx_hash } => client.history(chain, &tx_hash, timeout).await?,
        Command::GasLimit { chain, from, to, value, input_data } => {
            let params = GasLimitParams::new(chain, &from, &to, value, &input_data);
            client.gas_limit(&params, timeout).await?
        }
        Command::Allowance { node_url, token, owner, spender } => {
            let node_url = node_url_or_config(node_url, cfg)?;
            let allowance = chain::check_allowance(&node_url, &token, &owner, &spender).await?;
            json!({ "allowance": allowance.map(|a| a.to_string()) })
        }
        Command::EstimateGas { node_url, to, caller, value, data } => {
            let node_url = node_url_or_config(node_url, cfg)?;
            let data = parse_hex(&data)?;
            let gas = chain::estimate_gas(&node_url, &to, &caller, U256::from(value), data).await?;
            json!({ "gas": gas.map(|g| g.to_string()) })
        }
        Command::Preflight { node_url, token, owner, spender, amount } => {
            let node_url = node_url_or_config(node_url, cfg)?;
            let amount = U256::from_dec_str(amount.as_str())
                .map_err(|e| anyhow::anyhow!("amount {amount} does not fit in uint256: {e:?}"))?;

            info!("Preflight: allowance + approve gas on {token}");
            let result = chain::preflight(&node_url, &token, &owner, &spender, amount).await?;
            json!({
                "allowance": result.allowance.map(|a| a.to_string()),
                "approveGas": result.approve_gas.map(|g| g.to_string()),
                "needsApproval": result.needs_approval,
            })
        }
    };

    Ok(value)
}

fn node_url_or_config(arg: Option<String>, cfg: &Config) -> Result<String> {
    arg.or_else(|| cfg.node_url.clone())
        .context("NODE_URL is required (set it or pass --node-url)")
}

fn parse_hex(data: &str) -> Result<Bytes> {
    let raw = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(raw).with_context(|| format!("Invalid hex calldata: {data}"))?;
    Ok(Bytes::from(bytes))
}
