//! Dify relay subsystem.
//!
//! # Data Flow
//! ```text
//! (appId, Resource)
//!     → engine.rs (registry lookup; absent → 404)
//!     → upstream.rs (GET {api_base}{sub_path}, bearer key)
//!     → engine.rs (parse JSON, relay status + body, no-cache for site)
//!     → RelayResponse
//!
//! observer.rs is notified at each step; it never sees the key.
//! ```
//!
//! # Design Decisions
//! - One engine for every route, so response shapes cannot diverge
//! - Upstream 4xx/5xx with a JSON body is relayed, not treated as failure
//! - Failure detail is logged, the caller only sees a fixed message
//! - No retries, no caching of upstream results

pub mod engine;
pub mod observer;
pub mod types;
pub mod upstream;

pub use engine::DifyRelay;
pub use observer::{NoopObserver, RelayObserver, TracingObserver};
pub use types::{RelayError, RelayResponse, Resource};
pub use upstream::{HttpUpstream, ProxyRequest, Upstream, UpstreamError, UpstreamReply};
