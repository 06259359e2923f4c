use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// SPL token program, the default owner program for token account queries.
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Value::from(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Value::from(id),
            result: None,
            error: Some(RpcErrorObject {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `{ context, value }` wrapper most account-level methods return.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WithContext<T> {
    pub value: T,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// `[payload, encoding]`
    pub data: Vec<String>,
    pub executable: bool,
    pub lamports: u64,
    pub owner: String,
    pub rent_epoch: u64,
    #[serde(default)]
    pub space: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockhashInfo {
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenAccount {
    pub pubkey: String,
    pub account: TokenAccountData,
}

impl TokenAccount {
    pub fn token_amount(&self) -> &TokenAmount {
        &self.account.data.parsed.info.token_amount
    }

    pub fn mint(&self) -> &str {
        &self.account.data.parsed.info.mint
    }

    /// Exactly one whole unit with zero decimals marks a non-fungible holding.
    pub fn is_nft(&self) -> bool {
        let amount = self.token_amount();
        amount.decimals == 0 && amount.ui_amount == Some(1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenAccountData {
    pub data: ParsedAccountData,
    pub executable: bool,
    pub lamports: u64,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedAccountData {
    pub parsed: ParsedTokenAccount,
    pub program: String,
    pub space: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedTokenAccount {
    pub info: TokenAccountInfo,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenAccountInfo {
    pub mint: String,
    pub owner: String,
    pub token_amount: TokenAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    /// Raw amount as a decimal string
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount: Option<f64>,
}

/// Commitment level reported by `getSignatureStatuses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitmentLevel {
    Processed,
    Confirmed,
    Finalized,
}

impl CommitmentLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "processed" => Some(CommitmentLevel::Processed),
            "confirmed" => Some(CommitmentLevel::Confirmed),
            "finalized" => Some(CommitmentLevel::Finalized),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub confirmations: Option<u64>,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

impl SignatureStatus {
    pub fn commitment(&self) -> Option<CommitmentLevel> {
        self.confirmation_status.as_deref().and_then(CommitmentLevel::parse)
    }

    /// Chain-reported failure payload, if any. `null` counts as no error.
    pub fn error(&self) -> Option<&Value> {
        self.err.as_ref().filter(|e| !e.is_null())
    }
}

/// Derived state of a submitted transaction. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionConfirmation {
    Pending,
    Confirmed,
    Finalized,
    Failed(Value),
    /// Deadline passed before a terminal status; only produced by
    /// `RpcClient::wait_for_confirmation`.
    TimedOut,
}

impl TransactionConfirmation {
    pub fn from_status(status: Option<&SignatureStatus>) -> Self {
        let Some(status) = status else {
            return TransactionConfirmation::Pending;
        };
        if let Some(err) = status.error() {
            return TransactionConfirmation::Failed(err.clone());
        }
        match status.commitment() {
            Some(CommitmentLevel::Confirmed) => TransactionConfirmation::Confirmed,
            Some(CommitmentLevel::Finalized) => TransactionConfirmation::Finalized,
            _ => TransactionConfirmation::Pending,
        }
    }

    /// Confirmed or finalized.
    pub fn is_landed(&self) -> bool {
        matches!(self, TransactionConfirmation::Confirmed | TransactionConfirmation::Finalized)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionConfirmation::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_account(ui_amount: Option<f64>, decimals: u8) -> TokenAccount {
        serde_json::from_value(json!({
            "pubkey": "Acct1111",
            "account": {
                "data": {
                    "parsed": {
                        "info": {
                            "mint": "Mint1111",
                            "owner": "Owner1111",
                            "tokenAmount": {
                                "amount": "1",
                                "decimals": decimals,
                                "uiAmount": ui_amount
                            }
                        },
                        "type": "account"
                    },
                    "program": "spl-token",
                    "space": 165
                },
                "executable": false,
                "lamports": 2039280,
                "owner": TOKEN_PROGRAM_ID
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_nft_detection() {
        assert!(token_account(Some(1.0), 0).is_nft());
        assert!(!token_account(Some(2.0), 0).is_nft());
        assert!(!token_account(Some(1.0), 6).is_nft());
        assert!(!token_account(None, 0).is_nft());
    }

    #[test]
    fn test_request_envelope_shape() {
        let request = RpcRequest::new(7, "getSlot", json!([]));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 7, "method": "getSlot", "params": []}));
    }

    #[test]
    fn test_confirmation_from_status() {
        let confirmed: SignatureStatus =
            serde_json::from_value(json!({"slot": 10, "confirmations": 1, "err": null, "confirmationStatus": "confirmed"})).unwrap();
        assert_eq!(TransactionConfirmation::from_status(Some(&confirmed)), TransactionConfirmation::Confirmed);

        let processed: SignatureStatus =
            serde_json::from_value(json!({"slot": 10, "err": null, "confirmationStatus": "processed"})).unwrap();
        assert_eq!(TransactionConfirmation::from_status(Some(&processed)), TransactionConfirmation::Pending);

        let failed: SignatureStatus =
            serde_json::from_value(json!({"slot": 10, "err": {"InstructionError": [0, "Custom"]}, "confirmationStatus": "confirmed"})).unwrap();
        assert!(matches!(
            TransactionConfirmation::from_status(Some(&failed)),
            TransactionConfirmation::Failed(_)
        ));

        assert_eq!(TransactionConfirmation::from_status(None), TransactionConfirmation::Pending);
        assert!(!TransactionConfirmation::Pending.is_terminal());
        assert!(TransactionConfirmation::Finalized.is_landed());
    }
}
