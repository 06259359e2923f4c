//! Wallet session management and JSON-RPC access for the Gorbagana network.
//!
//! [`wallet::SessionManager`] tracks the connection to an injected wallet
//! provider; [`rpc::RpcClient`] talks to the network's JSON-RPC endpoint.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod rpc;
pub mod wallet;

pub use app::{SessionEvent, WalletApp, WalletView};
pub use config::{ExplorerLink, Network, NetworkConfig};
pub use error::{ConnectError, ProviderError, RpcError};
pub use rpc::{ConfirmOptions, RpcClient, TransactionConfirmation};
pub use wallet::{
    FileStore, InjectedWallet, KeyValueStore, MemoryStore, ProviderEnvironment, ProviderId,
    SessionManager, WalletSession,
};
