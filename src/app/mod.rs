mod events;
mod state;

pub use events::SessionEvent;
pub use state::{short_address, WalletView};

use std::sync::Arc;

use crate::config::NetworkConfig;
use crate::error::RpcError;
use crate::rpc::RpcClient;
use crate::wallet::{KeyValueStore, ProviderEnvironment, SessionManager};

/// Owns the network config, the shared RPC client and the wallet session.
///
/// UI code receives this (or borrows from it) instead of reaching for globals.
pub struct WalletApp {
    config: NetworkConfig,
    rpc: Arc<RpcClient>,
    session: SessionManager,
}

impl WalletApp {
    pub fn new(
        config: NetworkConfig,
        environment: Arc<ProviderEnvironment>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, RpcError> {
        let rpc = Arc::new(RpcClient::from_config(&config)?);
        Ok(Self::with_rpc(config, rpc, environment, store))
    }

    pub fn with_rpc(
        config: NetworkConfig,
        rpc: Arc<RpcClient>,
        environment: Arc<ProviderEnvironment>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let session = SessionManager::new(environment, rpc.clone(), store);
        Self { config, rpc, session }
    }

    /// Startup hook: restore the last wallet session, if any.
    pub async fn start(&mut self) -> bool {
        self.session.restore_session().await
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn rpc(&self) -> &Arc<RpcClient> {
        &self.rpc
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }

    pub fn view(&self) -> WalletView {
        WalletView::new(&self.session, &self.config)
    }
}
