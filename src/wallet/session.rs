use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use super::provider::{
    adapters, EventHandler, InjectedWallet, ListenerId, ProviderAdapter, ProviderDescriptor,
    ProviderEnvironment, ProviderEventKind, ProviderId,
};
use super::storage::{KeyValueStore, LAST_WALLET_KEY};
use crate::app::SessionEvent;
use crate::error::{ConnectError, RpcError};

/// Wait before restoring a persisted session, giving providers time to inject.
pub const RESTORE_DELAY: Duration = Duration::from_millis(500);

const EVENT_CAPACITY: usize = 32;

/// Best-effort balance lookup used while connecting.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch_balance(&self, address: &str) -> Result<f64, RpcError>;
}

/// The single logical wallet session.
///
/// `connected` implies `address` is set; `balance` may still be `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WalletSession {
    pub connected: bool,
    pub address: Option<String>,
    pub provider: Option<ProviderId>,
    pub balance: Option<f64>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl WalletSession {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy)]
struct ProviderSignal {
    generation: u64,
    kind: ProviderEventKind,
}

struct Subscription {
    wallet: Arc<dyn InjectedWallet>,
    listeners: Vec<(ProviderEventKind, ListenerId)>,
}

/// Owns the wallet session and mediates between the UI and injected providers.
///
/// All mutation goes through `&mut self`, so overlapping connect/disconnect
/// calls cannot be expressed.
pub struct SessionManager {
    environment: Arc<ProviderEnvironment>,
    balances: Arc<dyn BalanceSource>,
    store: Arc<dyn KeyValueStore>,
    session: WalletSession,
    error: Option<String>,
    connecting: bool,
    restore_delay: Duration,
    subscription: Option<Subscription>,
    generation: u64,
    signal_tx: mpsc::UnboundedSender<ProviderSignal>,
    signal_rx: mpsc::UnboundedReceiver<ProviderSignal>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(
        environment: Arc<ProviderEnvironment>,
        balances: Arc<dyn BalanceSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            environment,
            balances,
            store,
            session: WalletSession::empty(),
            error: None,
            connecting: false,
            restore_delay: RESTORE_DELAY,
            subscription: None,
            generation: 0,
            signal_tx,
            signal_rx,
            events,
        }
    }

    pub fn with_restore_delay(mut self, delay: Duration) -> Self {
        self.restore_delay = delay;
        self
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Probe every known provider. Re-probe before presenting choices:
    /// providers can inject after startup.
    pub fn list_available_providers(&self) -> Vec<ProviderDescriptor> {
        adapters()
            .iter()
            .map(|adapter| adapter.describe(&self.environment))
            .collect()
    }

    /// Parse a provider name and connect to it.
    pub async fn connect_by_name(&mut self, name: &str) -> Result<WalletSession, ConnectError> {
        match name.parse::<ProviderId>() {
            Ok(provider) => self.connect(provider).await,
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Connect to `provider`, replacing any current session.
    pub async fn connect(&mut self, provider: ProviderId) -> Result<WalletSession, ConnectError> {
        self.connecting = true;
        self.error = None;

        let outcome = self.establish(provider).await;
        self.connecting = false;

        match outcome {
            Ok((wallet, session)) => {
                self.session = session.clone();
                if let Err(e) = self.store.set(LAST_WALLET_KEY, provider.as_str()) {
                    warn!("Failed to persist last wallet: {}", e);
                }
                self.subscribe(wallet);

                let address = session.address.clone().unwrap_or_default();
                info!(%provider, %address, "Wallet connected");
                self.emit(SessionEvent::Connected {
                    provider,
                    address,
                    balance: session.balance,
                });
                Ok(session)
            }
            Err(e) => {
                error!(%provider, "Wallet connection error: {}", e);
                self.error = Some(e.to_string());
                self.session = WalletSession::empty();
                self.unsubscribe();
                self.emit(SessionEvent::ConnectFailed {
                    provider,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        provider: ProviderId,
    ) -> Result<(Arc<dyn InjectedWallet>, WalletSession), ConnectError> {
        let wallet = ProviderAdapter::new(provider)
            .detect(&self.environment)
            .ok_or_else(|| provider.not_found())?;

        let response = wallet.connect().await?;
        let address = response
            .address()
            .ok_or(ConnectError::NoAddressReturned)?
            .to_string();

        let balance = self.fetch_balance(&address).await;

        let session = WalletSession {
            connected: true,
            address: Some(address),
            provider: Some(provider),
            balance,
            connected_at: Some(Utc::now()),
        };
        Ok((wallet, session))
    }

    async fn fetch_balance(&self, address: &str) -> Option<f64> {
        match self.balances.fetch_balance(address).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(address, "Failed to fetch balance: {}", e);
                None
            }
        }
    }

    /// Re-fetch the balance of the connected address.
    pub async fn refresh_balance(&mut self) -> Option<f64> {
        let address = self.session.address.clone()?;
        let balance = self.fetch_balance(&address).await;
        self.session.balance = balance;
        self.emit(SessionEvent::BalanceUpdated { address, balance });
        balance
    }

    /// Tear down the session. Never fails; provider errors are logged and dropped.
    pub async fn disconnect(&mut self) {
        // The subscribed object is the one that was connected, even if the
        // environment has since dropped or replaced it.
        let wallet = match &self.subscription {
            Some(subscription) => Some(subscription.wallet.clone()),
            None => self
                .session
                .provider
                .and_then(|provider| ProviderAdapter::new(provider).detect(&self.environment)),
        };

        if let Some(wallet) = wallet {
            if let Err(e) = wallet.disconnect().await {
                error!("Error disconnecting: {}", e);
            }
        }

        self.unsubscribe();
        self.session = WalletSession::empty();
        if let Err(e) = self.store.remove(LAST_WALLET_KEY) {
            warn!("Failed to clear last wallet: {}", e);
        }
        self.error = None;
        self.emit(SessionEvent::Disconnected);
    }

    /// Reconnect to the last used provider, if it is injected.
    ///
    /// Returns whether a session was restored. A provider that has not
    /// injected yet is an expected miss.
    pub async fn restore_session(&mut self) -> bool {
        let stored = match self.store.get(LAST_WALLET_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read last wallet: {}", e);
                return false;
            }
        };
        let Some(raw) = stored else {
            debug!("No previous wallet session");
            return false;
        };
        let provider = match raw.parse::<ProviderId>() {
            Ok(provider) => provider,
            Err(e) => {
                warn!("Ignoring persisted wallet: {}", e);
                return false;
            }
        };

        tokio::time::sleep(self.restore_delay).await;

        if !ProviderAdapter::new(provider).is_installed(&self.environment) {
            info!(%provider, "Last wallet not injected, skipping restore");
            return false;
        }

        self.connect(provider).await.is_ok()
    }

    /// Handle every provider event queued so far. Returns how many were acted on.
    pub async fn process_provider_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(signal) = self.signal_rx.try_recv() {
            if self.handle_signal(signal).await {
                handled += 1;
            }
        }
        handled
    }

    /// Wait for the next live provider event and handle it.
    ///
    /// Pends until a subscribed provider emits.
    pub async fn next_provider_event(&mut self) -> Option<ProviderEventKind> {
        loop {
            let signal = self.signal_rx.recv().await?;
            if self.handle_signal(signal).await {
                return Some(signal.kind);
            }
        }
    }

    async fn handle_signal(&mut self, signal: ProviderSignal) -> bool {
        if signal.generation != self.generation || !self.session.connected {
            debug!(event = signal.kind.as_str(), "Ignoring stale provider event");
            return false;
        }
        let Some(provider) = self.session.provider else {
            return false;
        };

        match signal.kind {
            ProviderEventKind::AccountChanged => {
                let _ = self.connect(provider).await;
            }
            ProviderEventKind::Disconnect => self.disconnect().await,
        }
        true
    }

    fn subscribe(&mut self, wallet: Arc<dyn InjectedWallet>) {
        self.unsubscribe();
        let generation = self.generation;

        let mut listeners = Vec::new();
        for kind in [ProviderEventKind::AccountChanged, ProviderEventKind::Disconnect] {
            let tx = self.signal_tx.clone();
            let handler: EventHandler = Arc::new(move || {
                let _ = tx.send(ProviderSignal { generation, kind });
            });
            if let Some(listener) = wallet.on(kind, handler) {
                listeners.push((kind, listener));
            }
        }

        self.subscription = Some(Subscription { wallet, listeners });
    }

    fn unsubscribe(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            for (kind, listener) in subscription.listeners {
                subscription.wallet.off(kind, listener);
            }
        }
        // Anything still queued belongs to the old subscription.
        self.generation += 1;
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}
