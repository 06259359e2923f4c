use std::time::Duration;
use tracing::warn;

pub const DEFAULT_RPC_URL: &str = "https://rpc.gorbagana.wtf";
pub const DEFAULT_EXPLORER_URL: &str = "https://trashscan.io";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Gorbagana network selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Localnet,
    Custom(String), // custom RPC URL
}

impl Network {
    /// RPC endpoint URL
    pub fn rpc_url(&self) -> String {
        match self {
            Network::Mainnet => DEFAULT_RPC_URL.to_string(),
            Network::Localnet => "http://localhost:8899".to_string(),
            Network::Custom(url) => url.clone(),
        }
    }

    /// Network display name
    pub fn name(&self) -> &str {
        match self {
            Network::Mainnet => "Gorbagana",
            Network::Localnet => "Localnet",
            Network::Custom(_) => "Custom",
        }
    }
}

/// Native currency of the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyConfig {
    pub symbol: String,
    pub decimals: u8,
    pub display_symbol: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: "GOR".to_string(),
            decimals: 9,
            display_symbol: "G".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerLink {
    Tx,
    Address,
    Token,
}

impl ExplorerLink {
    fn path(&self) -> &'static str {
        match self {
            ExplorerLink::Tx => "tx",
            ExplorerLink::Address => "address",
            ExplorerLink::Token => "token",
        }
    }
}

/// Network-wide settings shared by the RPC client and the app shell.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: String,
    pub rpc_endpoint: String,
    pub explorer_url: String,
    pub currency: CurrencyConfig,
    pub network_label: String,
    pub tps_label: String,
    pub request_timeout: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::for_network(Network::Mainnet)
    }
}

impl NetworkConfig {
    pub fn for_network(network: Network) -> Self {
        Self {
            name: network.name().to_string(),
            chain_id: "gorbagana-mainnet".to_string(),
            rpc_endpoint: network.rpc_url(),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
            currency: CurrencyConfig::default(),
            network_label: "Gorbagana_L2".to_string(),
            tps_label: "GPS".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Defaults overlaid with `GORBAGANA_RPC_URL`, `GORBAGANA_EXPLORER_URL`
    /// and `GORBAGANA_RPC_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = match lookup("GORBAGANA_RPC_URL") {
            Some(url) if !url.trim().is_empty() => {
                Self::for_network(Network::Custom(url.trim().to_string()))
            }
            _ => Self::default(),
        };

        if let Some(url) = lookup("GORBAGANA_EXPLORER_URL") {
            if !url.trim().is_empty() {
                config.explorer_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Some(raw) = lookup("GORBAGANA_RPC_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring invalid GORBAGANA_RPC_TIMEOUT_SECS value {:?}", raw),
            }
        }

        config
    }

    pub fn explorer_link(&self, kind: ExplorerLink, value: &str) -> String {
        format!("{}/{}/{}", self.explorer_url, kind.path(), value)
    }

    /// Format a human-denominated amount, e.g. `1.50 G`.
    pub fn format_amount(&self, amount: f64, places: usize) -> String {
        format!("{:.*} {}", places, amount, self.currency.display_symbol)
    }
}
