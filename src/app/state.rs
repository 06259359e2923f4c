use serde::Serialize;

use crate::config::NetworkConfig;
use crate::wallet::{ProviderDescriptor, ProviderId, SessionManager};

/// Read-only snapshot of the wallet state for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletView {
    pub connected: bool,
    pub address: Option<String>,
    pub short_address: Option<String>,
    pub provider: Option<ProviderId>,
    pub balance: Option<f64>,
    pub balance_display: Option<String>,
    pub error: Option<String>,
    pub is_connecting: bool,
    pub providers: Vec<ProviderDescriptor>,
}

impl WalletView {
    pub fn new(manager: &SessionManager, config: &NetworkConfig) -> Self {
        let session = manager.session();
        Self {
            connected: session.connected,
            address: session.address.clone(),
            short_address: session.address.as_deref().map(short_address),
            provider: session.provider,
            balance: session.balance,
            balance_display: session.balance.map(|b| config.format_amount(b, 2)),
            error: manager.error().map(str::to_string),
            is_connecting: manager.is_connecting(),
            providers: manager.list_available_providers(),
        }
    }
}

/// Shortened address for display (first 4 and last 4 chars)
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 8 {
        return address.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
