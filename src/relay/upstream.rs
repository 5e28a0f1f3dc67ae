//! Outbound transport to the Dify API.
//!
//! # Responsibilities
//! - Issue exactly one GET per relayed request
//! - Attach the app key as a bearer token
//! - Hand back status, headers and raw body; parsing is the relay's job

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;

use crate::config::UpstreamConfig;

/// Errors raised by the outbound transport.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed in flight (connect, timeout, body read).
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Transport failure reported by an [`Upstream`] that is not built on
    /// `reqwest` (an in-process or alternative client).
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
}

/// One outbound call: where to send it and which key to present.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub api_base: String,
    pub api_key: String,
    pub sub_path: String,
}

impl ProxyRequest {
    /// Target URL, `api_base` and `sub_path` joined verbatim.
    pub fn url(&self) -> String {
        format!("{}{}", self.api_base, self.sub_path)
    }
}

impl fmt::Debug for ProxyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRequest")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("sub_path", &self.sub_path)
            .finish()
    }
}

/// Raw upstream answer.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Outbound transport seam.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get(&self, request: &ProxyRequest) -> Result<UpstreamReply, UpstreamError>;
}

/// `reqwest`-backed transport. The client pools connections across calls.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());

        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(UpstreamError::Client)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get(&self, request: &ProxyRequest) -> Result<UpstreamReply, UpstreamError> {
        let response = self
            .client
            .get(request.url())
            .bearer_auth(&request.api_key)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamReply {
            status,
            headers,
            body,
        })
    }
}
