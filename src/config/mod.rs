//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads + validates
//!     → sent to the running server
//!     → registry swaps in the new app table
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - An invalid reload is dropped; the running config stays in place
//! - Only the app table is reloadable; listener changes need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig, RequestConfig,
    UpstreamConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;
