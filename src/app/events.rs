use crate::wallet::ProviderId;

/// Session changes broadcast to UI observers.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Connected {
        provider: ProviderId,
        address: String,
        balance: Option<f64>,
    },
    ConnectFailed {
        provider: ProviderId,
        error: String,
    },
    Disconnected,
    BalanceUpdated {
        address: String,
        balance: Option<f64>,
    },
}
