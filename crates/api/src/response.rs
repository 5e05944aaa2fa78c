//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard success envelope: `{"data": ...}`.
///
/// Errors are rendered by [`edumatch_common::AppError`] as `{"error": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }

    /// Create a `201 Created` response.
    pub fn created(data: T) -> Response {
        (StatusCode::CREATED, Json(Self { data })).into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Acknowledgement body for operations with nothing to return.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

/// `{"data": {"ok": true}}`
#[must_use]
pub const fn ack() -> ApiResponse<Ack> {
    ApiResponse::ok(Ack { ok: true })
}
