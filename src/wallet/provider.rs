use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::error::{ConnectError, ProviderError};

/// Wallet products the storefront knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Backpack,
    Gorbag,
}

impl ProviderId {
    /// Fixed probing and display order.
    pub const ALL: [ProviderId; 2] = [ProviderId::Backpack, ProviderId::Gorbag];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Backpack => "backpack",
            ProviderId::Gorbag => "gorbag",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::Backpack => "Backpack",
            ProviderId::Gorbag => "Gorbag Wallet",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ProviderId::Backpack => "🎒",
            ProviderId::Gorbag => "🗑️",
        }
    }

    pub fn install_url(&self) -> &'static str {
        match self {
            ProviderId::Backpack => "https://www.backpack.app/",
            ProviderId::Gorbag => "https://gorbagana.wtf/wallet",
        }
    }

    /// Global injection points, most specific first.
    pub fn injection_points(&self) -> &'static [&'static str] {
        match self {
            ProviderId::Backpack => &["backpack.gorbagana", "backpack"],
            ProviderId::Gorbag => &["gorbag", "gorbagWallet"],
        }
    }

    pub fn not_found(&self) -> ConnectError {
        ConnectError::ProviderNotFound {
            provider: self.display_name().to_string(),
            install_url: self.install_url().to_string(),
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "backpack" => Ok(ProviderId::Backpack),
            "gorbag" => Ok(ProviderId::Gorbag),
            other => Err(ConnectError::UnknownProvider(other.to_string())),
        }
    }
}

/// A provider as presented in a wallet picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub installed: bool,
}

/// Events a provider may emit while connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderEventKind {
    AccountChanged,
    Disconnect,
}

impl ProviderEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderEventKind::AccountChanged => "accountChanged",
            ProviderEventKind::Disconnect => "disconnect",
        }
    }
}

/// Handle returned by `InjectedWallet::on`, passed back to `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

pub type EventHandler = Arc<dyn Fn() + Send + Sync>;

/// What a provider hands back from its connection handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ConnectResponse {
    pub fn with_public_key(key: impl Into<String>) -> Self {
        Self {
            public_key: Some(key.into()),
            address: None,
        }
    }

    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            public_key: None,
            address: Some(address.into()),
        }
    }

    /// First usable address, public key preferred.
    pub fn address(&self) -> Option<&str> {
        [self.public_key.as_deref(), self.address.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Capabilities of a wallet provider injected into the environment.
///
/// Only `connect` is mandatory; the rest default to "not supported".
#[async_trait]
pub trait InjectedWallet: Send + Sync {
    async fn connect(&self) -> Result<ConnectResponse, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn on(&self, _event: ProviderEventKind, _handler: EventHandler) -> Option<ListenerId> {
        None
    }

    fn off(&self, _event: ProviderEventKind, _listener: ListenerId) {}
}

/// Registry of injected provider objects, keyed by injection point.
///
/// Providers may appear or vanish at any time, so lookups are never cached.
#[derive(Default)]
pub struct ProviderEnvironment {
    injected: RwLock<HashMap<String, Arc<dyn InjectedWallet>>>,
}

impl ProviderEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&self, point: impl Into<String>, wallet: Arc<dyn InjectedWallet>) {
        if let Ok(mut injected) = self.injected.write() {
            injected.insert(point.into(), wallet);
        }
    }

    pub fn remove(&self, point: &str) -> Option<Arc<dyn InjectedWallet>> {
        self.injected.write().ok().and_then(|mut injected| injected.remove(point))
    }

    pub fn get(&self, point: &str) -> Option<Arc<dyn InjectedWallet>> {
        self.injected.read().ok().and_then(|injected| injected.get(point).cloned())
    }

    pub fn contains(&self, point: &str) -> bool {
        self.injected
            .read()
            .map(|injected| injected.contains_key(point))
            .unwrap_or(false)
    }
}

/// Detection routine for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderAdapter {
    id: ProviderId,
}

impl ProviderAdapter {
    pub fn new(id: ProviderId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> ProviderId {
        self.id
    }

    pub fn detect(&self, env: &ProviderEnvironment) -> Option<Arc<dyn InjectedWallet>> {
        self.id.injection_points().iter().find_map(|point| env.get(point))
    }

    pub fn is_installed(&self, env: &ProviderEnvironment) -> bool {
        self.id.injection_points().iter().any(|point| env.contains(point))
    }

    pub fn describe(&self, env: &ProviderEnvironment) -> ProviderDescriptor {
        ProviderDescriptor {
            id: self.id,
            display_name: self.id.display_name(),
            icon: self.id.icon(),
            installed: self.is_installed(env),
        }
    }
}

/// The closed set of adapters, in probing order.
pub fn adapters() -> [ProviderAdapter; 2] {
    ProviderId::ALL.map(ProviderAdapter::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(&'static str);

    #[async_trait]
    impl InjectedWallet for Dummy {
        async fn connect(&self) -> Result<ConnectResponse, ProviderError> {
            Ok(ConnectResponse::with_address(self.0))
        }
    }

    #[test]
    fn test_provider_id_round_trip_names() {
        for id in ProviderId::ALL {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), id);
        }
        assert_eq!(
            "phantom".parse::<ProviderId>(),
            Err(ConnectError::UnknownProvider("phantom".into()))
        );
    }

    #[test]
    fn test_connect_response_address_preference() {
        let both = ConnectResponse {
            public_key: Some("KeyA".into()),
            address: Some("AddrB".into()),
        };
        assert_eq!(both.address(), Some("KeyA"));

        let blank_key = ConnectResponse {
            public_key: Some("  ".into()),
            address: Some("AddrB".into()),
        };
        assert_eq!(blank_key.address(), Some("AddrB"));

        assert_eq!(ConnectResponse::default().address(), None);
    }

    #[tokio::test]
    async fn test_detect_prefers_specific_injection_point() {
        let env = ProviderEnvironment::new();
        env.inject("backpack", Arc::new(Dummy("generic")));
        env.inject("backpack.gorbagana", Arc::new(Dummy("gorbagana")));

        let adapter = ProviderAdapter::new(ProviderId::Backpack);
        let wallet = adapter.detect(&env).unwrap();
        assert_eq!(wallet.connect().await.unwrap().address(), Some("gorbagana"));
    }

    #[test]
    fn test_descriptors_follow_environment() {
        let env = ProviderEnvironment::new();
        let described: Vec<bool> = adapters().iter().map(|a| a.describe(&env).installed).collect();
        assert_eq!(described, vec![false, false]);

        env.inject("gorbagWallet", Arc::new(Dummy("g")));
        let gorbag = adapters()[1].describe(&env);
        assert_eq!(gorbag.id, ProviderId::Gorbag);
        assert_eq!(gorbag.display_name, "Gorbag Wallet");
        assert!(gorbag.installed);

        env.remove("gorbagWallet");
        assert!(!adapters()[1].is_installed(&env));
    }

    #[test]
    fn test_not_found_carries_install_url() {
        let message = ProviderId::Gorbag.not_found().to_string();
        assert!(message.contains("Gorbag Wallet not detected"));
        assert!(message.contains("https://gorbagana.wtf/wallet"));
    }
}
