//! DID resolution over HTTP.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{NetError, Result};

/// Public ION resolver.
pub const DEFAULT_RESOLVER_ENDPOINT: &str = "https://beta.discover.did.microsoft.com/1.0/identifiers";

/// Resolves a DID URI to its resolution result.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve `uri` against `endpoint`.
    async fn resolve(&self, uri: &str, endpoint: &str) -> Result<Value>;
}

/// Configuration for [`HttpResolver`].
#[derive(Debug, Clone)]
pub struct HttpResolverConfig {
    /// Base URL; the DID is appended as the last path segment.
    pub endpoint: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for HttpResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RESOLVER_ENDPOINT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// A resolver that issues `GET {endpoint}/{uri}`.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
    config: HttpResolverConfig,
}

impl HttpResolver {
    pub fn new(config: HttpResolverConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NetError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpResolverConfig {
        &self.config
    }

    /// Resolve against the configured endpoint.
    pub async fn resolve_did(&self, uri: &str) -> Result<Value> {
        self.resolve(uri, &self.config.endpoint).await
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, uri: &str, endpoint: &str) -> Result<Value> {
        let url = format!("{}/{}", endpoint.trim_end_matches('/'), uri);
        debug!(%url, "resolving DID");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| NetError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(NetError::NotFound(uri.to_string()));
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(NetError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| NetError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| NetError::InvalidResponse(e.to_string()))
    }
}
