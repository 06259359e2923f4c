mod confirm;
pub mod transport;
pub mod types;

pub use confirm::{ConfirmOptions, DEFAULT_CONFIRM_TIMEOUT, DEFAULT_POLL_INTERVAL};
pub use transport::{HttpTransport, RpcTransport};
pub use types::{
    AccountInfo, BlockhashInfo, CommitmentLevel, RpcRequest, RpcResponse, SignatureStatus,
    TokenAccount, TokenAmount, TransactionConfirmation, TOKEN_PROGRAM_ID,
};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::NetworkConfig;
use crate::error::RpcError;
use crate::wallet::BalanceSource;
use types::WithContext;

/// JSON-RPC client for a single Gorbagana endpoint.
///
/// Request ids are monotonic per client instance. Every response is paired
/// with its own request by the transport, so ids are only checked for equality.
pub struct RpcClient {
    transport: Arc<dyn RpcTransport>,
    next_id: AtomicU64,
    decimals: u8,
}

impl RpcClient {
    /// Create a client for `endpoint` with the default network settings.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RpcError> {
        let config = NetworkConfig {
            rpc_endpoint: endpoint.into(),
            ..NetworkConfig::default()
        };
        Self::from_config(&config)
    }

    pub fn from_config(config: &NetworkConfig) -> Result<Self, RpcError> {
        let transport = HttpTransport::new(config.rpc_endpoint.clone(), config.request_timeout)?;
        Ok(Self::with_transport(Arc::new(transport), config.currency.decimals))
    }

    pub fn with_transport(transport: Arc<dyn RpcTransport>, decimals: u8) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(0),
            decimals,
        }
    }

    /// Decimal places of the native currency.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Issue one JSON-RPC call and decode its `result`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let result = self.dispatch(id, method, params).await;
        if let Err(e) = &result {
            warn!(method, id, "RPC request failed: {}", e);
        }
        result
    }

    async fn dispatch<T: DeserializeOwned>(&self, id: u64, method: &str, params: Value) -> Result<T, RpcError> {
        let request = RpcRequest::new(id, method, params);
        let response = self.transport.send(&request).await?;

        // An error envelope wins over whatever the HTTP layer reported.
        if let Some(error) = response.error {
            return Err(RpcError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        if !response.id.is_null() && response.id != Value::from(id) {
            return Err(RpcError::UnexpectedId {
                expected: id,
                got: response.id,
            });
        }

        Ok(serde_json::from_value(response.result.unwrap_or(Value::Null))?)
    }

    /// Balance in lamport-equivalent units
    pub async fn get_balance_lamports(&self, address: &str) -> Result<u64, RpcError> {
        parse_address(address)?;
        let result: WithContext<u64> = self.request("getBalance", json!([address])).await?;
        Ok(result.value)
    }

    /// Balance in whole GOR
    pub async fn get_balance(&self, address: &str) -> Result<f64, RpcError> {
        let lamports = self.get_balance_lamports(address).await?;
        Ok(to_ui_amount(lamports, self.decimals))
    }

    pub async fn get_account_info(&self, address: &str) -> Result<Option<AccountInfo>, RpcError> {
        parse_address(address)?;
        let result: WithContext<Option<AccountInfo>> = self
            .request("getAccountInfo", json!([address, { "encoding": "base64" }]))
            .await?;
        Ok(result.value)
    }

    /// Latest finalized blockhash; transactions must embed it to be accepted.
    pub async fn get_recent_blockhash(&self) -> Result<BlockhashInfo, RpcError> {
        let result: WithContext<BlockhashInfo> = self
            .request("getLatestBlockhash", json!([{ "commitment": "finalized" }]))
            .await?;
        Ok(result.value)
    }

    /// Token accounts owned by `owner` under `program_id` (SPL token program by default).
    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        program_id: Option<&str>,
    ) -> Result<Vec<TokenAccount>, RpcError> {
        parse_address(owner)?;
        let program_id = program_id.unwrap_or(TOKEN_PROGRAM_ID);
        let result: WithContext<Vec<TokenAccount>> = self
            .request(
                "getTokenAccountsByOwner",
                json!([owner, { "programId": program_id }, { "encoding": "jsonParsed" }]),
            )
            .await?;
        Ok(result.value)
    }

    pub async fn get_nfts_by_owner(&self, owner: &str) -> Result<Vec<TokenAccount>, RpcError> {
        let accounts = self.get_token_accounts_by_owner(owner, None).await?;
        let total = accounts.len();
        let nfts: Vec<TokenAccount> = accounts.into_iter().filter(TokenAccount::is_nft).collect();
        debug!(owner, total, nfts = nfts.len(), "Filtered token accounts");
        Ok(nfts)
    }

    /// Submit a signed, base64-encoded transaction. Returns its signature.
    pub async fn send_transaction(&self, signed_transaction: &str) -> Result<String, RpcError> {
        self.request(
            "sendTransaction",
            json!([
                signed_transaction,
                { "encoding": "base64", "preflightCommitment": "confirmed" }
            ]),
        )
        .await
    }

    pub async fn get_signature_statuses(
        &self,
        signatures: &[&str],
    ) -> Result<Vec<Option<SignatureStatus>>, RpcError> {
        let result: WithContext<Vec<Option<SignatureStatus>>> = self
            .request("getSignatureStatuses", json!([signatures]))
            .await?;
        Ok(result.value)
    }

    pub async fn get_slot(&self) -> Result<u64, RpcError> {
        self.request("getSlot", json!([])).await
    }

    pub async fn get_block_time(&self, slot: u64) -> Result<Option<i64>, RpcError> {
        self.request("getBlockTime", json!([slot])).await
    }

    pub async fn is_healthy(&self) -> bool {
        self.get_slot().await.is_ok()
    }
}

#[async_trait]
impl BalanceSource for RpcClient {
    async fn fetch_balance(&self, address: &str) -> Result<f64, RpcError> {
        self.get_balance(address).await
    }
}

fn parse_address(address: &str) -> Result<Pubkey, RpcError> {
    Pubkey::from_str(address).map_err(|_| RpcError::InvalidAddress(address.to_string()))
}

/// Raw integer units to a human-denominated value.
pub fn to_ui_amount(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Canned reply for one request.
    #[derive(Debug, Clone)]
    pub enum Reply {
        Result(Value),
        Failure(i64, String),
        /// Result carried under an arbitrary response id.
        WithId(Value, Value),
        Error(RpcError),
        /// Never answers.
        Hang,
    }

    /// In-memory transport replaying scripted replies in order.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        fallback: Mutex<Option<Reply>>,
        requests: Mutex<Vec<RpcRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Default::default()
            })
        }

        /// Reply used once the script runs out.
        pub fn with_fallback(self: Arc<Self>, reply: Reply) -> Arc<Self> {
            *self.fallback.lock().unwrap() = Some(reply);
            self
        }

        pub fn requests(&self) -> Vec<RpcRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedTransport {
        async fn send(&self, request: &RpcRequest) -> Result<RpcResponse, RpcError> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .or_else(|| self.fallback.lock().unwrap().clone())
                .unwrap_or_else(|| Reply::Error(RpcError::Transport("script exhausted".into())));

            match reply {
                Reply::Result(value) => Ok(RpcResponse::success(request.id, value)),
                Reply::Failure(code, message) => Ok(RpcResponse::failure(request.id, code, message)),
                Reply::WithId(id, value) => Ok(RpcResponse {
                    id,
                    ..RpcResponse::success(request.id, value)
                }),
                Reply::Error(e) => Err(e),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    pub fn client(transport: Arc<ScriptedTransport>) -> RpcClient {
        RpcClient::with_transport(transport, 9)
    }
}
