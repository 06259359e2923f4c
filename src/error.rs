use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while establishing a wallet session.
///
/// The display strings are shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectError {
    #[error("{provider} not detected. Please install it from {install_url}")]
    ProviderNotFound {
        provider: String,
        install_url: String,
    },

    #[error("Failed to get wallet address")]
    NoAddressReturned,

    #[error("{0}")]
    Provider(String),

    #[error("Unknown wallet provider: {0}")]
    UnknownProvider(String),
}

/// Error raised by an injected wallet provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<ProviderError> for ConnectError {
    fn from(e: ProviderError) -> Self {
        ConnectError::Provider(e.0)
    }
}

/// Errors raised by the JSON-RPC client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("RPC error {code}: {message}")]
    Protocol { code: i64, message: String },

    #[error("Failed to decode RPC response: {0}")]
    Decode(String),

    #[error("Response id {got} does not match request id {expected}")]
    UnexpectedId { expected: u64, got: Value },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Transaction {signature} failed: {err}")]
    TransactionFailed { signature: String, err: Value },

    #[error("Transaction {signature} not confirmed within {timeout:?}")]
    ConfirmationTimeout { signature: String, timeout: Duration },

    #[error("Confirmation of transaction cancelled")]
    Cancelled,
}

impl RpcError {
    /// Network or HTTP-level failure, as opposed to an RPC-level rejection.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_) | RpcError::HttpStatus(_))
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_not_found_message() {
        let err = ConnectError::ProviderNotFound {
            provider: "Backpack".to_string(),
            install_url: "https://www.backpack.app/".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Backpack not detected. Please install it from https://www.backpack.app/"
        );
    }

    #[test]
    fn test_transport_classification() {
        assert!(RpcError::HttpStatus(502).is_transport());
        assert!(RpcError::Transport("connection refused".into()).is_transport());
        assert!(!RpcError::Protocol { code: -32602, message: "bad".into() }.is_transport());
        assert!(!RpcError::Cancelled.is_transport());
    }
}
