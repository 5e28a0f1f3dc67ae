//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use dify_relay::config::{AppConfig, RelayConfig};
use dify_relay::http::HttpServer;
use dify_relay::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// What the mock Dify API answers with.
#[derive(Clone)]
pub struct MockBehavior {
    pub status: u16,
    pub parameters: &'static str,
    pub site: &'static str,
    pub delay: Option<Duration>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            status: 200,
            parameters: r#"{"opening_statement":"Hello","suggested_questions":[]}"#,
            site: r#"{"title":"Support Bot","default_language":"en-US"}"#,
            delay: None,
        }
    }
}

#[derive(Clone)]
struct MockState {
    behavior: MockBehavior,
    hits: Arc<AtomicUsize>,
    authorizations: Arc<Mutex<Vec<String>>>,
}

/// Handle to a running mock Dify API.
pub struct MockDify {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    authorizations: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockDify {
    /// Base URL to register as an app's `api_base`.
    pub fn api_base(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Authorization headers received, in arrival order.
    pub fn authorizations(&self) -> Vec<String> {
        self.authorizations.lock().unwrap().clone()
    }
}

async fn answer(state: MockState, headers: HeaderMap, body: &'static str) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.authorizations.lock().unwrap().push(auth);

    if let Some(delay) = state.behavior.delay {
        tokio::time::sleep(delay).await;
    }

    (
        StatusCode::from_u16(state.behavior.status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// Start a mock Dify API on an ephemeral port.
pub async fn start_mock_dify(behavior: MockBehavior) -> MockDify {
    let hits = Arc::new(AtomicUsize::new(0));
    let authorizations = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        behavior,
        hits: hits.clone(),
        authorizations: authorizations.clone(),
    };

    let app = Router::new()
        .route(
            "/v1/parameters",
            get(|State(s): State<MockState>, headers: HeaderMap| async move {
                let body = s.behavior.parameters;
                answer(s, headers, body).await
            }),
        )
        .route(
            "/v1/site",
            get(|State(s): State<MockState>, headers: HeaderMap| async move {
                let body = s.behavior.site;
                answer(s, headers, body).await
            }),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockDify {
        addr,
        hits,
        authorizations,
    }
}

/// Handle to a running relay.
#[allow(dead_code)]
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<RelayConfig>,
}

#[allow(dead_code)]
impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Relay config with the given apps and no system proxy.
pub fn relay_config(apps: Vec<AppConfig>) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.upstream.use_system_proxy = false;
    config.apps = apps;
    config
}

/// Start the relay on an ephemeral port.
pub async fn start_relay(mut config: RelayConfig) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    RunningRelay {
        addr,
        shutdown,
        config_updates,
    }
}

/// HTTP client for talking to the relay.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
