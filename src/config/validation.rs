//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. Validation is a pure function
//! that reports every problem it finds, not just the first.

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("app #{0} has an empty app_id")]
    EmptyAppId(usize),

    #[error("duplicate app_id '{0}'")]
    DuplicateAppId(String),

    #[error("app '{app_id}' has an invalid api_base '{api_base}'")]
    ApiBase { app_id: String, api_base: String },

    #[error("app '{0}' has an empty api_key")]
    EmptyApiKey(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for (index, app) in config.apps.iter().enumerate() {
        if app.app_id.trim().is_empty() {
            errors.push(ValidationError::EmptyAppId(index));
        } else if !seen.insert(app.app_id.as_str()) {
            errors.push(ValidationError::DuplicateAppId(app.app_id.clone()));
        }

        let base_ok = Url::parse(&app.request_config.api_base)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
            .unwrap_or(false);
        if !base_ok {
            errors.push(ValidationError::ApiBase {
                app_id: app.app_id.clone(),
                api_base: app.request_config.api_base.clone(),
            });
        }

        if app.request_config.api_key.is_empty() {
            errors.push(ValidationError::EmptyApiKey(app.app_id.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
