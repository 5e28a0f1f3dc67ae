//! Relay value types and error definitions.

use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::registry::RegistryError;
use crate::relay::upstream::UpstreamError;

/// A Dify sub-resource served through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Application parameters (static metadata).
    Parameters,
    /// Site settings (mutable, must not be cached downstream).
    Site,
}

impl Resource {
    /// Path appended to the app's `api_base`.
    pub fn sub_path(self) -> &'static str {
        match self {
            Resource::Parameters => "/parameters",
            Resource::Site => "/site",
        }
    }

    /// Message returned to the caller when the relay fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Resource::Parameters => "Failed to fetch app parameters",
            Resource::Site => "Failed to fetch app site settings",
        }
    }

    /// Whether successful responses carry no-cache headers.
    pub fn disables_caching(self) -> bool {
        matches!(self, Resource::Site)
    }

    /// Short label for logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Parameters => "parameters",
            Resource::Site => "site",
        }
    }
}

/// Response produced by the relay: status, JSON body and header overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: Value,
    pub headers: HeaderMap,
}

impl RelayResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body,
            headers: HeaderMap::new(),
        }
    }

    /// Forbid any downstream cache from storing this response.
    pub fn disable_caching(&mut self) {
        self.headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        self.headers
            .insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        self.headers
            .insert(header::EXPIRES, HeaderValue::from_static("0"));
    }
}

/// Errors that end a relay attempt.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No app registered under the requested id.
    #[error("app not found: {0}")]
    AppNotFound(String),

    /// The registry failed to answer.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The outbound call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The upstream body was not valid JSON.
    #[error("upstream returned invalid JSON: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl RelayError {
    /// Status code reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::AppNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_table() {
        assert_eq!(Resource::Parameters.sub_path(), "/parameters");
        assert_eq!(Resource::Site.sub_path(), "/site");
        assert_eq!(
            Resource::Parameters.failure_message(),
            "Failed to fetch app parameters"
        );
        assert_eq!(
            Resource::Site.failure_message(),
            "Failed to fetch app site settings"
        );
        assert!(Resource::Site.disables_caching());
        assert!(!Resource::Parameters.disables_caching());
    }

    #[test]
    fn test_disable_caching_headers() {
        let mut response = RelayResponse::new(StatusCode::OK, json!({}));
        assert!(response.headers.is_empty());

        response.disable_caching();
        assert_eq!(
            response.headers[header::CACHE_CONTROL],
            "no-cache, no-store, must-revalidate"
        );
        assert_eq!(response.headers[header::PRAGMA], "no-cache");
        assert_eq!(response.headers[header::EXPIRES], "0");
    }

    #[test]
    fn test_error_status() {
        assert_eq!(
            RelayError::AppNotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        let err = RelayError::Registry(RegistryError::Unavailable("down".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "registry unavailable: down");
    }
}
