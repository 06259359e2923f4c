//! gorbagana-wallet CLI
//!
//!   gorbagana-wallet health                       → {"healthy": true, "endpoint": ...}
//!   gorbagana-wallet slot                         → {"slot": 123}
//!   gorbagana-wallet balance <address>            → {"address": ..., "balance": 1.5, "display": "1.50 G"}
//!   gorbagana-wallet account <address>            → account info or null
//!   gorbagana-wallet tokens <address> [program]   → token accounts
//!   gorbagana-wallet nfts <address>               → NFT token accounts
//!   gorbagana-wallet blockhash                    → latest finalized blockhash
//!   gorbagana-wallet send <base64-tx>             → {"signature": ...}
//!   gorbagana-wallet confirm <signature> [ms]     → {"confirmed": true}
//!   gorbagana-wallet providers                    → known wallet providers
//!   gorbagana-wallet status                       → restored session view
//!
//! Configuration comes from GORBAGANA_RPC_URL, GORBAGANA_EXPLORER_URL and
//! GORBAGANA_RPC_TIMEOUT_SECS.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use gorbagana_wallet::logging::init_logging;
use gorbagana_wallet::rpc::DEFAULT_CONFIRM_TIMEOUT;
use gorbagana_wallet::wallet::adapters;
use gorbagana_wallet::{
    ExplorerLink, FileStore, NetworkConfig, ProviderEnvironment, RpcClient, WalletApp,
};

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        print_usage();
        return;
    }

    match run(&args).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(args: &[String]) -> Result<Value> {
    let config = NetworkConfig::from_env();
    debug!(endpoint = %config.rpc_endpoint, "Using RPC endpoint");
    let rpc = RpcClient::from_config(&config)?;

    let command = args[0].as_str();
    let arg = |index: usize, name: &'static str| arg_at(args, index, name);

    let output = match command {
        "health" => json!({
            "healthy": rpc.is_healthy().await,
            "endpoint": config.rpc_endpoint,
            "network": config.network_label,
        }),
        "slot" => json!({ "slot": rpc.get_slot().await? }),
        "balance" => {
            let address = arg(1, "address")?;
            let balance = rpc.get_balance(address).await?;
            json!({
                "address": address,
                "balance": balance,
                "display": config.format_amount(balance, 2),
                "explorer": config.explorer_link(ExplorerLink::Address, address),
            })
        }
        "account" => serde_json::to_value(rpc.get_account_info(arg(1, "address")?).await?)?,
        "tokens" => {
            let owner = arg(1, "address")?;
            let program = args.get(2).map(String::as_str);
            serde_json::to_value(rpc.get_token_accounts_by_owner(owner, program).await?)?
        }
        "nfts" => serde_json::to_value(rpc.get_nfts_by_owner(arg(1, "address")?).await?)?,
        "blockhash" => serde_json::to_value(rpc.get_recent_blockhash().await?)?,
        "send" => {
            let signature = rpc.send_transaction(arg(1, "base64-tx")?).await?;
            json!({
                "signature": signature,
                "explorer": config.explorer_link(ExplorerLink::Tx, &signature),
            })
        }
        "confirm" => {
            let signature = arg(1, "signature")?;
            let timeout = match args.get(2) {
                Some(ms) => Duration::from_millis(ms.parse().context("timeout must be milliseconds")?),
                None => DEFAULT_CONFIRM_TIMEOUT,
            };
            json!({ "confirmed": rpc.confirm_transaction(signature, timeout).await? })
        }
        // No wallet extension can inject into a terminal; the listing still
        // reports which providers are known.
        "providers" => provider_listing(&ProviderEnvironment::new())?,
        "status" => {
            let store = Arc::new(FileStore::new(FileStore::default_path()?)?);
            let mut app = WalletApp::with_rpc(config, Arc::new(rpc), Arc::new(ProviderEnvironment::new()), store);
            app.start().await;
            serde_json::to_value(app.view())?
        }
        other => return Err(anyhow!("Unknown command: {}", other)),
    };

    Ok(output)
}

fn arg_at<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing <{}> for '{}'", name, args[0]))
}

/// Known providers and whether each is injected. Touches no storage.
fn provider_listing(env: &ProviderEnvironment) -> Result<Value> {
    let providers: Vec<_> = adapters().iter().map(|adapter| adapter.describe(env)).collect();
    Ok(serde_json::to_value(providers)?)
}

fn print_usage() {
    println!(
        "gorbagana-wallet - Gorbagana wallet & RPC client

USAGE:
    gorbagana-wallet <command> [args]

COMMANDS:
    health                      Check that the RPC endpoint answers
    slot                        Current slot
    balance <address>           Native balance in GOR
    account <address>           Account info
    tokens <address> [program]  Token accounts owned by address
    nfts <address>              NFTs owned by address
    blockhash                   Latest finalized blockhash
    send <base64-tx>            Submit a signed transaction
    confirm <signature> [ms]    Wait for confirmation (default 30000 ms)
    providers                   Known wallet providers
    status                      Restore and show the wallet session

ENVIRONMENT:
    GORBAGANA_RPC_URL           RPC endpoint (default https://rpc.gorbagana.wtf)
    GORBAGANA_EXPLORER_URL      Explorer base URL
    GORBAGANA_RPC_TIMEOUT_SECS  HTTP timeout in seconds
    RUST_LOG                    Log filter (default info)"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_listing_needs_no_store() {
        let listing = provider_listing(&ProviderEnvironment::new()).unwrap();

        let providers = listing.as_array().unwrap();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0]["id"], json!("backpack"));
        assert_eq!(providers[1]["id"], json!("gorbag"));
        assert!(providers.iter().all(|p| p["installed"] == json!(false)));
    }
}
