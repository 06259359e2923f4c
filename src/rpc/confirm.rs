use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::types::TransactionConfirmation;
use super::RpcClient;
use crate::error::RpcError;

pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Bounds for a confirmation wait.
#[derive(Debug, Clone)]
pub struct ConfirmOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub cancel: Option<CancellationToken>,
}

impl Default for ConfirmOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONFIRM_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: None,
        }
    }
}

impl ConfirmOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl RpcClient {
    /// Poll the status of `signature` once.
    pub async fn signature_confirmation(&self, signature: &str) -> Result<TransactionConfirmation, RpcError> {
        let statuses = self.get_signature_statuses(&[signature]).await?;
        let status = statuses.first().and_then(Option::as_ref);
        Ok(TransactionConfirmation::from_status(status))
    }

    /// Wait until `signature` is confirmed or finalized.
    pub async fn confirm_transaction(&self, signature: &str, timeout: Duration) -> Result<bool, RpcError> {
        self.confirm_transaction_with(signature, ConfirmOptions::default().with_timeout(timeout))
            .await
    }

    /// Like [`wait_for_confirmation`](Self::wait_for_confirmation), with a
    /// chain failure or an expired deadline reported as an error.
    pub async fn confirm_transaction_with(
        &self,
        signature: &str,
        options: ConfirmOptions,
    ) -> Result<bool, RpcError> {
        let timeout = options.timeout;
        match self.wait_for_confirmation(signature, options).await? {
            state if state.is_landed() => Ok(true),
            TransactionConfirmation::Failed(err) => Err(RpcError::TransactionFailed {
                signature: signature.to_string(),
                err,
            }),
            _ => Err(RpcError::ConfirmationTimeout {
                signature: signature.to_string(),
                timeout,
            }),
        }
    }

    /// Poll on a fixed interval until the transaction lands, fails on chain,
    /// the deadline passes or the caller cancels.
    ///
    /// Returns the terminal state: `Confirmed`, `Finalized`, `Failed` or
    /// `TimedOut`. The deadline and the cancel token also cut short a poll
    /// that is still in flight. Per-poll request failures are retried on the
    /// next tick; cancellation is the only error.
    pub async fn wait_for_confirmation(
        &self,
        signature: &str,
        options: ConfirmOptions,
    ) -> Result<TransactionConfirmation, RpcError> {
        let cancel = options.cancel.unwrap_or_default();
        let deadline = Instant::now() + options.timeout;

        loop {
            if Instant::now() >= deadline {
                debug!(signature, timeout = ?options.timeout, "Confirmation deadline passed");
                return Ok(TransactionConfirmation::TimedOut);
            }

            let poll = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RpcError::Cancelled),
                _ = sleep_until(deadline) => return Ok(TransactionConfirmation::TimedOut),
                poll = self.signature_confirmation(signature) => poll,
            };

            match poll {
                Ok(state @ TransactionConfirmation::Failed(_)) => return Ok(state),
                Ok(state) if state.is_landed() => {
                    info!(signature, ?state, "Transaction confirmed");
                    return Ok(state);
                }
                Ok(_) => {}
                Err(e) => debug!(signature, "Status poll failed, retrying: {}", e),
            }

            let next_poll = (Instant::now() + options.poll_interval).min(deadline);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(RpcError::Cancelled),
                _ = sleep_until(next_poll) => {}
            }
        }
    }
}
