//! Application registry subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (appId)
//!     → AppRegistry::lookup
//!     → Some(AppConfig)  → relay forwards upstream
//!     → None             → relay answers 404
//!     → Err(_)           → relay answers 500
//! ```
//!
//! # Design Decisions
//! - The relay depends on the trait, never on a concrete store
//! - Absence is a normal outcome, not an error
//! - Lookups are side-effect free

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use crate::config::schema::{AppConfig, RequestConfig};
pub use memory::StaticRegistry;

/// Errors raised by a registry backend.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The backing store could not be reached or read.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Resolves application identifiers to connection settings.
#[async_trait]
pub trait AppRegistry: Send + Sync {
    /// Look up one application. `Ok(None)` means the app is not registered.
    async fn lookup(&self, app_id: &str) -> Result<Option<AppConfig>, RegistryError>;
}
