//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the relay routes
//! - Wire up middleware (request ID, tracing)
//! - Apply app table reloads to the registry
//! - Serve until the shutdown signal fires

use std::sync::Arc;

use axum::{body::Body, http::Request, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::routes::{app_parameters, app_site, health};
use crate::registry::StaticRegistry;
use crate::relay::{DifyRelay, HttpUpstream, TracingObserver, Upstream, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<DifyRelay>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    registry: Arc<StaticRegistry>,
}

impl HttpServer {
    /// Create a server that reaches the Dify API over HTTP.
    pub fn new(config: RelayConfig) -> Result<Self, UpstreamError> {
        let upstream = Arc::new(HttpUpstream::new(&config.upstream)?);
        Ok(Self::with_upstream(config, upstream))
    }

    /// Create a server with a custom outbound transport.
    pub fn with_upstream(config: RelayConfig, upstream: Arc<dyn Upstream>) -> Self {
        let registry = Arc::new(StaticRegistry::from_apps(config.apps.clone()));
        let relay = DifyRelay::new(registry.clone(), upstream)
            .with_observer(Arc::new(TracingObserver));

        let state = AppState {
            relay: Arc::new(relay),
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/api/client/dify/{app_id}/parameters", get(app_parameters))
            .route("/api/client/dify/{app_id}/site", get(app_site))
            .route("/health", get(health))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::debug_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request.headers().request_id(),
                        )
                    }))
                    .layer(propagate_request_id_layer()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the registered apps.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RelayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            apps = self.registry.len(),
            "HTTP server starting"
        );

        let registry = self.registry.clone();
        let running = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                let ignored = restart_required(&running, &new_config);
                if !ignored.is_empty() {
                    tracing::warn!(
                        sections = ?ignored,
                        "Config sections changed that require a restart; ignoring them"
                    );
                }
                registry.replace(new_config.apps);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A clone of the router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The registry backing this server.
    pub fn registry(&self) -> Arc<StaticRegistry> {
        self.registry.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

/// Sections of `requested` that differ from the running config but are only
/// read at startup.
fn restart_required(running: &RelayConfig, requested: &RelayConfig) -> Vec<&'static str> {
    let mut sections = Vec::new();
    if running.listener.bind_address != requested.listener.bind_address {
        sections.push("listener");
    }
    if running.upstream != requested.upstream {
        sections.push("upstream");
    }
    if running.observability != requested.observability {
        sections.push("observability");
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Bytes;
    use axum::http::{header, HeaderMap, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::http::request::X_REQUEST_ID;
    use crate::relay::{ProxyRequest, UpstreamReply};

    struct EchoUpstream;

    struct FixedUpstream(&'static str);

    #[async_trait]
    impl Upstream for FixedUpstream {
        async fn get(&self, _request: &ProxyRequest) -> Result<UpstreamReply, UpstreamError> {
            Ok(UpstreamReply {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from_static(self.0.as_bytes()),
            })
        }
    }

    #[async_trait]
    impl Upstream for EchoUpstream {
        async fn get(&self, request: &ProxyRequest) -> Result<UpstreamReply, UpstreamError> {
            let body = json!({ "url": request.url() }).to_string();
            Ok(UpstreamReply {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from(body),
            })
        }
    }

    fn server() -> HttpServer {
        let mut config = RelayConfig::default();
        config
            .apps
            .push(AppConfig::new("chat", "http://dify.local/v1", "app-1"));
        HttpServer::with_upstream(config, Arc::new(EchoUpstream))
    }

    async fn get(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_routes_map_to_resources() {
        let server = server();

        let response = get(server.router(), "/api/client/dify/chat/parameters").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
        assert_eq!(
            json_body(response).await,
            json!({ "url": "http://dify.local/v1/parameters" })
        );

        let response = get(server.router(), "/api/client/dify/chat/site").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::EXPIRES], "0");
        assert_eq!(
            json_body(response).await,
            json!({ "url": "http://dify.local/v1/site" })
        );
    }

    #[tokio::test]
    async fn test_unknown_app() {
        let response = get(server().router(), "/api/client/dify/nope/site").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({ "error": "App not found" }));
    }

    #[tokio::test]
    async fn test_request_id_is_generated_and_propagated() {
        let response = get(server().router(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(X_REQUEST_ID).is_some());

        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(X_REQUEST_ID, "client-supplied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[X_REQUEST_ID], "client-supplied");
    }

    #[tokio::test]
    async fn test_health() {
        let response = get(server().router(), "/health").await;
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_registry_replace_is_visible_to_routes() {
        let server = server();
        server
            .registry()
            .replace(vec![AppConfig::new("late", "http://other.local", "k")]);

        let response = get(server.router(), "/api/client/dify/late/parameters").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(server.router(), "/api/client/dify/chat/parameters").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/client/dify/chat/site")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_body_bytes_keep_upstream_key_order() {
        let raw = r#"{"zeta":1,"alpha":2,"mid":{"y":1,"b":2}}"#;
        let mut config = RelayConfig::default();
        config
            .apps
            .push(AppConfig::new("chat", "http://dify.local/v1", "app-1"));
        let server = HttpServer::with_upstream(config, Arc::new(FixedUpstream(raw)));

        let response = get(server.router(), "/api/client/dify/chat/parameters").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], raw.as_bytes());
    }

    #[test]
    fn test_restart_required_sections() {
        let running = RelayConfig::default();

        let mut requested = running.clone();
        requested
            .apps
            .push(AppConfig::new("chat", "http://dify.local/v1", "app-1"));
        assert!(restart_required(&running, &requested).is_empty());

        requested.listener.bind_address = "127.0.0.1:9999".into();
        requested.upstream.timeout_secs = Some(5);
        requested.observability.metrics_enabled = true;
        assert_eq!(
            restart_required(&running, &requested),
            vec!["listener", "upstream", "observability"]
        );
    }
}
