//! Route handlers.

use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::request::RequestIdExt;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::Resource;

/// `GET /api/client/dify/{app_id}/parameters`
pub async fn app_parameters(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    relay_resource(&state, &app_id, &headers, Resource::Parameters).await
}

/// `GET /api/client/dify/{app_id}/site`
pub async fn app_site(
    State(state): State<AppState>,
    Path(app_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    relay_resource(&state, &app_id, &headers, Resource::Site).await
}

async fn relay_resource(
    state: &AppState,
    app_id: &str,
    headers: &HeaderMap,
    resource: Resource,
) -> Response {
    let start_time = Instant::now();

    tracing::debug!(
        request_id = %headers.request_id(),
        app_id = %app_id,
        resource = resource.name(),
        "Relaying app resource"
    );

    let response = state.relay.relay(app_id, resource).await;

    tracing::debug!(
        request_id = %headers.request_id(),
        status = %response.status,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Relay complete"
    );
    metrics::record_relay(resource.name(), response.status.as_u16(), start_time);

    response.into_response()
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
