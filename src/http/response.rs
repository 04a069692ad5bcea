//! Canned responses for classification and static failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

pub fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Forbidden").into_response()
}

pub fn bad_gateway(message: &'static str) -> Response {
    (StatusCode::BAD_GATEWAY, message).into_response()
}

pub fn upgrade_required() -> Response {
    (StatusCode::UPGRADE_REQUIRED, "This endpoint only accepts WebSocket upgrades").into_response()
}
