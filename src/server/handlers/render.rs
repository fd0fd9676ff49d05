// src/server/handlers/render.rs
//! Preview rendering of ad-hoc step text

use crate::build::blocking;
use crate::markup::{EscapedText, Target};
use crate::server::ServerState;
use crate::server::handlers::error_response;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Request body for preview rendering
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// Step markup
    pub text: String,
    /// Output target, `html` if omitted
    #[serde(default = "default_target")]
    pub target: Target,
}

fn default_target() -> Target {
    Target::Html
}

/// Rendered fragment
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub target: Target,
    pub output: String,
}

/// Render text with the current unit definitions
///
/// POST /v1/render
pub async fn render_text(
    State(state): State<Arc<RwLock<ServerState>>>,
    Json(request): Json<RenderRequest>,
) -> Response {
    let assembler = state.read().await.assembler.clone();
    let RenderRequest { text, target } = request;

    let result = blocking(move || {
        let transpiler = assembler.transpiler()?;
        Ok(match target {
            Target::Html => transpiler.render_html(&text),
            Target::Latex => transpiler.render_typeset(&EscapedText::new(&text)),
        })
    })
    .await;

    match result {
        Ok(output) => (StatusCode::OK, Json(RenderResponse { target, output })).into_response(),
        Err(e) => error_response(&e),
    }
}
