//! Response conversion.
//!
//! A [`RelayResponse`] always becomes a JSON response: the relay status,
//! the body serialized as `application/json`, plus any header overrides.

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::relay::RelayResponse;

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, Json(self.body)).into_response()
    }
}
