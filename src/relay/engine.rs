//! The relay itself: resolve, forward, relay.
//!
//! # State Machine
//! ```text
//! Resolving ──(app found)──▶ Forwarding ──▶ Responded(upstream status, body)
//!     │                          │
//!     │ (absent)                 │ (transport / JSON failure)
//!     ▼                          ▼
//! Responded(404)            Responded(500)
//! ```
//!
//! No retries and no backward transitions. Every route goes through
//! [`DifyRelay::relay`], so all routes build responses the same way.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::registry::{AppConfig, AppRegistry};
use crate::relay::observer::{NoopObserver, RelayObserver};
use crate::relay::types::{RelayError, RelayResponse, Resource};
use crate::relay::upstream::{ProxyRequest, Upstream, UpstreamReply};

const APP_NOT_FOUND: &str = "App not found";

/// Relays Dify sub-resource requests on behalf of registered apps.
#[derive(Clone)]
pub struct DifyRelay {
    registry: Arc<dyn AppRegistry>,
    upstream: Arc<dyn Upstream>,
    observer: Arc<dyn RelayObserver>,
}

impl DifyRelay {
    pub fn new(registry: Arc<dyn AppRegistry>, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            registry,
            upstream,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attach an observability collaborator.
    pub fn with_observer(mut self, observer: Arc<dyn RelayObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Successful relay: upstream status and body, untouched.
    pub fn build_success(status: StatusCode, body: Value) -> RelayResponse {
        RelayResponse::new(status, body)
    }

    /// Error response with an `{ "error": message }` body.
    pub fn build_error(status: StatusCode, message: &str) -> RelayResponse {
        RelayResponse::new(status, json!({ "error": message }))
    }

    /// Issue the outbound call for an already resolved app.
    pub async fn forward(
        &self,
        app: &AppConfig,
        sub_path: &str,
    ) -> Result<UpstreamReply, RelayError> {
        self.send(&Self::proxy_request(app, sub_path)).await
    }

    fn proxy_request(app: &AppConfig, sub_path: &str) -> ProxyRequest {
        ProxyRequest {
            api_base: app.request_config.api_base.clone(),
            api_key: app.request_config.api_key.clone(),
            sub_path: sub_path.to_string(),
        }
    }

    async fn send(&self, request: &ProxyRequest) -> Result<UpstreamReply, RelayError> {
        let reply = self.upstream.get(request).await?;
        self.observer.upstream_replied(reply.status, &reply.headers);
        Ok(reply)
    }

    /// Relay one resource for one app. Never fails: every error becomes a
    /// JSON error response.
    pub async fn relay(&self, app_id: &str, resource: Resource) -> RelayResponse {
        let response = match self.try_relay(app_id, resource).await {
            Ok(response) => response,
            Err(RelayError::AppNotFound(_)) => {
                Self::build_error(StatusCode::NOT_FOUND, APP_NOT_FOUND)
            }
            Err(e) => {
                self.observer.failed(app_id, resource, &e);
                Self::build_error(e.status(), resource.failure_message())
            }
        };

        self.observer.responded(app_id, resource, &response);
        response
    }

    async fn try_relay(
        &self,
        app_id: &str,
        resource: Resource,
    ) -> Result<RelayResponse, RelayError> {
        let app = self
            .registry
            .lookup(app_id)
            .await?
            .ok_or_else(|| RelayError::AppNotFound(app_id.to_string()))?;

        let request = Self::proxy_request(&app, resource.sub_path());
        self.observer.forwarding(app_id, resource, &request.url());

        let reply = self.send(&request).await?;
        let body: Value = serde_json::from_slice(&reply.body)?;
        self.observer.upstream_body(&body);

        let mut response = Self::build_success(reply.status, body);
        if resource.disables_caching() {
            response.disable_caching();
        }
        Ok(response)
    }
}
