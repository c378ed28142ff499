use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub mod auth;
pub mod follows;
pub mod tweets;
pub mod users;

/// 302 to an in-app location.
pub(crate) fn redirect(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

/// 302 carrying a session cookie change.
pub(crate) fn redirect_with_cookie(location: &str, cookie: String) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location.to_string()),
            (header::SET_COOKIE, cookie),
        ],
    )
        .into_response()
}

/// Non-fatal refusal: the request was understood but performed no mutation.
pub(crate) fn warning(message: &str) -> Response {
    Json(json!({
        "success": false,
        "warning": message
    }))
    .into_response()
}
