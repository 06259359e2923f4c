pub mod provider;
pub mod session;
pub mod storage;

pub use provider::{
    adapters, ConnectResponse, EventHandler, InjectedWallet, ListenerId, ProviderAdapter,
    ProviderDescriptor, ProviderEnvironment, ProviderEventKind, ProviderId,
};
pub use session::{BalanceSource, SessionManager, WalletSession, RESTORE_DELAY};
pub use storage::{FileStore, KeyValueStore, MemoryStore, LAST_WALLET_KEY};

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::{ProviderError, RpcError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Injected wallet double with scripted handshake results.
    pub struct ScriptedWallet {
        response: Mutex<Result<ConnectResponse, ProviderError>>,
        fail_disconnect: bool,
        listeners: Mutex<HashMap<ListenerId, (ProviderEventKind, EventHandler)>>,
        connects: AtomicUsize,
        disconnects: AtomicUsize,
    }

    impl ScriptedWallet {
        fn build(response: Result<ConnectResponse, ProviderError>) -> Self {
            Self {
                response: Mutex::new(response),
                fail_disconnect: false,
                listeners: Mutex::new(HashMap::new()),
                connects: AtomicUsize::new(0),
                disconnects: AtomicUsize::new(0),
            }
        }

        pub fn with_address(address: &str) -> Arc<Self> {
            Arc::new(Self::build(Ok(ConnectResponse::with_address(address))))
        }

        pub fn with_public_key(key: &str) -> Arc<Self> {
            Arc::new(Self::build(Ok(ConnectResponse::with_public_key(key))))
        }

        pub fn without_address() -> Arc<Self> {
            Arc::new(Self::build(Ok(ConnectResponse::default())))
        }

        pub fn rejecting(message: &str) -> Arc<Self> {
            Arc::new(Self::build(Err(ProviderError::new(message))))
        }

        pub fn failing_disconnect(self: Arc<Self>) -> Arc<Self> {
            let mut wallet = Arc::try_unwrap(self).unwrap_or_else(|_| panic!("wallet already shared"));
            wallet.fail_disconnect = true;
            Arc::new(wallet)
        }

        pub fn set_address(&self, address: &str) {
            *self.response.lock().unwrap() = Ok(ConnectResponse::with_address(address));
        }

        /// Fire every handler registered for `kind`.
        pub fn emit(&self, kind: ProviderEventKind) {
            let handlers: Vec<EventHandler> = self
                .listeners
                .lock()
                .unwrap()
                .values()
                .filter(|(k, _)| *k == kind)
                .map(|(_, h)| h.clone())
                .collect();
            for handler in handlers {
                handler();
            }
        }

        pub fn handler(&self, kind: ProviderEventKind) -> Option<EventHandler> {
            self.listeners
                .lock()
                .unwrap()
                .values()
                .find(|(k, _)| *k == kind)
                .map(|(_, h)| h.clone())
        }

        pub fn listener_count(&self) -> usize {
            self.listeners.lock().unwrap().len()
        }

        pub fn connect_calls(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }

        pub fn disconnect_calls(&self) -> usize {
            self.disconnects.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InjectedWallet for ScriptedWallet {
        async fn connect(&self) -> Result<ConnectResponse, ProviderError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.response.lock().unwrap().clone()
        }

        async fn disconnect(&self) -> Result<(), ProviderError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            if self.fail_disconnect {
                Err(ProviderError::new("provider exploded"))
            } else {
                Ok(())
            }
        }

        fn on(&self, event: ProviderEventKind, handler: EventHandler) -> Option<ListenerId> {
            let id = ListenerId::new();
            self.listeners.lock().unwrap().insert(id, (event, handler));
            Some(id)
        }

        fn off(&self, _event: ProviderEventKind, listener: ListenerId) {
            self.listeners.lock().unwrap().remove(&listener);
        }
    }

    /// Balance source returning a fixed value or always failing.
    pub struct StubBalances(Option<f64>);

    impl StubBalances {
        pub fn fixed(balance: f64) -> Self {
            Self(Some(balance))
        }

        pub fn failing() -> Self {
            Self(None)
        }
    }

    #[async_trait]
    impl BalanceSource for StubBalances {
        async fn fetch_balance(&self, _address: &str) -> Result<f64, RpcError> {
            self.0.ok_or_else(|| RpcError::Transport("connection refused".into()))
        }
    }
}
