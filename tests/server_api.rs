// tests/server_api.rs

//! HTTP endpoints against a temporary database and a fake compiler.

#![cfg(feature = "server")]

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{FakeCompiler, TestEnv, seed_recipe, setup};
use rezept::config::AppConfig;
use rezept::server::{ServerState, create_router};
use rezept::store::SqliteStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

fn app(env: &TestEnv, compiler: Arc<FakeCompiler>) -> Router {
    let mut config = AppConfig::default();
    config.storage.db_path = env.db_path.clone();
    config.storage.cache_dir = env.cache_root.clone();
    config.build.template = env.template.clone();
    config.build.debug = true;

    let store = Arc::new(SqliteStore::new(&env.db_path));
    let state = ServerState::with_parts(config, store, compiler).unwrap();
    create_router(Arc::new(RwLock::new(state)), &[])
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_get_recipe_model() {
    let env = setup();
    let id = seed_recipe(&env);

    let response = app(&env, Arc::new(FakeCompiler::new()))
        .oneshot(get(&format!("/v1/recipes/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["target"], "html");
    assert_eq!(json["recipe"]["name"], "Omas Brot");
    assert_eq!(json["steps"][0]["text"], "<p><strong>Mix</strong> well</p>\n");
    assert_eq!(json["steps"][0]["ingredients"][0]["quantity"], "2&ndash;8,5&#x202F;g");
}

#[tokio::test]
async fn test_unknown_recipe_is_404() {
    let env = setup();

    let response = app(&env, Arc::new(FakeCompiler::new()))
        .oneshot(get("/v1/recipes/77"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_pdf_download() {
    let env = setup();
    let id = seed_recipe(&env);
    let compiler = Arc::new(FakeCompiler::new());
    let app = app(&env, compiler.clone());

    let response = app
        .clone()
        .oneshot(get(&format!("/v1/recipes/{}/pdf", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("inline; filename=\"Omas_Brot.pdf\""));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    // Second download is served from the cache
    let response = app
        .oneshot(get(&format!("/v1/recipes/{}/pdf", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(compiler.calls(), 1);
}

#[tokio::test]
async fn test_failed_build_is_generic_500() {
    let env = setup();
    let id = seed_recipe(&env);

    let response = app(&env, Arc::new(FakeCompiler::failing()))
        .oneshot(get(&format!("/v1/recipes/{}/pdf", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["error"], "build_failed");
    let message = json["message"].as_str().unwrap();
    assert!(!message.contains("Undefined control sequence"));
}

#[tokio::test]
async fn test_render_preview() {
    let env = setup();
    let app = app(&env, Arc::new(FakeCompiler::new()));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/render")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "**Mix** [2 el] _well_", "target": "latex"}"#))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["target"], "latex");
    assert_eq!(json["output"], "\\textbf{Mix} \\SI{2}{EL} \\textsubscript{well}");

    // Target defaults to html
    let request = Request::builder()
        .method("POST")
        .uri("/v1/render")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": "**Mix** well"}"#))
        .unwrap();
    let json = body_json(app.oneshot(request).await.unwrap()).await;
    assert_eq!(json["target"], "html");
    assert_eq!(json["output"], "<p><strong>Mix</strong> well</p>\n");
}
