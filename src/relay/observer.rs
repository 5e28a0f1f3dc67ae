//! Diagnostic hooks called by the relay at fixed points.
//!
//! The relay never logs on its own; everything goes through a
//! [`RelayObserver`]. Keys are never handed to an observer.

use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::observability::metrics;
use crate::relay::types::{RelayError, RelayResponse, Resource};

/// Observability collaborator. Every hook defaults to doing nothing.
pub trait RelayObserver: Send + Sync {
    /// About to call the upstream.
    fn forwarding(&self, _app_id: &str, _resource: Resource, _url: &str) {}

    /// Upstream answered (before the body is parsed).
    fn upstream_replied(&self, _status: StatusCode, _headers: &HeaderMap) {}

    /// Upstream body parsed as JSON.
    fn upstream_body(&self, _body: &Value) {}

    /// Final response handed back to the caller.
    fn responded(&self, _app_id: &str, _resource: Resource, _response: &RelayResponse) {}

    /// The relay failed and will answer with a generic error.
    fn failed(&self, _app_id: &str, _resource: Resource, _error: &RelayError) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RelayObserver for NoopObserver {}

/// Observer emitting `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RelayObserver for TracingObserver {
    fn forwarding(&self, app_id: &str, resource: Resource, url: &str) {
        tracing::debug!(
            app_id = %app_id,
            resource = resource.name(),
            url = %url,
            "Fetching from Dify API"
        );
    }

    fn upstream_replied(&self, status: StatusCode, headers: &HeaderMap) {
        tracing::debug!(status = %status, headers = ?headers, "Dify API response");
    }

    fn upstream_body(&self, body: &Value) {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let rendered = serde_json::to_string_pretty(body).unwrap_or_default();
            tracing::debug!(body = %rendered, "Dify API response data");
        }
    }

    fn responded(&self, app_id: &str, resource: Resource, response: &RelayResponse) {
        tracing::debug!(
            app_id = %app_id,
            resource = resource.name(),
            status = %response.status,
            headers = ?response.headers,
            "Relay response"
        );
    }

    fn failed(&self, app_id: &str, resource: Resource, error: &RelayError) {
        tracing::error!(
            app_id = %app_id,
            resource = resource.name(),
            error = %error,
            "Error fetching app {} from Dify API",
            resource.name()
        );
        metrics::record_relay_failure(resource.name());
    }
}
