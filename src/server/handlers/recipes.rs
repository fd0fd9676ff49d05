// src/server/handlers/recipes.rs
//! Recipe view and PDF download handlers

use crate::build::blocking;
use crate::markup::Target;
use crate::server::ServerState;
use crate::server::handlers::error_response;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// HTML render model of a recipe
///
/// GET /v1/recipes/:id
pub async fn get_recipe(
    State(state): State<Arc<RwLock<ServerState>>>,
    Path(id): Path<i64>,
) -> Response {
    let assembler = state.read().await.assembler.clone();

    match blocking(move || assembler.assemble(id, Target::Html)).await {
        Ok(model) => (StatusCode::OK, Json(model)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Compiled PDF of a recipe, rebuilt if stale
///
/// GET /v1/recipes/:id/pdf
pub async fn get_recipe_pdf(
    State(state): State<Arc<RwLock<ServerState>>>,
    Path(id): Path<i64>,
) -> Response {
    // Hold the service, not the lock, while building
    let pdf = Arc::clone(&state.read().await.pdf);

    let artifact = match pdf.get_pdf(id).await {
        Ok(artifact) => artifact,
        Err(e) => return error_response(&e),
    };

    if artifact.rebuilt {
        info!("Serving freshly built PDF for recipe {}", id);
    } else {
        debug!("Serving cached PDF for recipe {}", id);
    }

    match tokio::fs::read(&artifact.path).await {
        Ok(data) => {
            let headers = [
                (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
                (
                    header::CONTENT_DISPOSITION,
                    content_disposition(&artifact.download_name),
                ),
            ];
            (StatusCode::OK, headers, data).into_response()
        }
        Err(e) => error_response(&crate::Error::fs(&artifact.path, e)),
    }
}

/// `inline` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        percent_encode(filename)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("inline"))
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        let value = content_disposition("Apfel_Kuchen.pdf");
        assert_eq!(
            value.to_str().unwrap(),
            "inline; filename=\"Apfel_Kuchen.pdf\"; filename*=UTF-8''Apfel_Kuchen.pdf"
        );
    }

    #[test]
    fn test_content_disposition_utf8() {
        let value = content_disposition("Brötchen.pdf");
        assert_eq!(
            value.to_str().unwrap(),
            "inline; filename=\"Br_tchen.pdf\"; filename*=UTF-8''Br%C3%B6tchen.pdf"
        );
    }

    #[test]
    fn test_content_disposition_quotes() {
        let value = content_disposition("Omas \"Bester\".pdf");
        assert!(value.to_str().unwrap().starts_with("inline; filename=\"Omas _Bester_.pdf\""));
    }
}
