// src/server/handlers/mod.rs
//! HTTP request handlers for the rezept server

pub mod recipes;
pub mod render;

use crate::error::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// JSON error response for a service error
///
/// Build failures and internal errors get a generic message; details only
/// go to the log.
pub fn error_response(err: &Error) -> Response {
    let (status, code, message) = match err {
        Error::RecipeNotFound(_) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        Error::BuildFailed(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "build_failed",
            err.to_string(),
        ),
        Error::ConfigError(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
        _ => {
            tracing::error!("Request failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            )
        }
    };

    let body = serde_json::json!({
        "error": code,
        "message": message,
    });
    (status, Json(body)).into_response()
}
