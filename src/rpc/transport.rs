use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::types::{RpcRequest, RpcResponse};
use crate::error::RpcError;

/// Moves one JSON-RPC envelope to the node and back.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn send(&self, request: &RpcRequest) -> Result<RpcResponse, RpcError>;
}

/// JSON-RPC over HTTP POST.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, request: &RpcRequest) -> Result<RpcResponse, RpcError> {
        debug!(method = %request.method, id = request.id, "POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        Ok(serde_json::from_slice(&body)?)
    }
}
