//! HTTP gateway
//!
//! A thin JSON layer over [`Engine`]:
//!
//! | Method | Path             | Body             | Response        |
//! |--------|------------------|------------------|-----------------|
//! | POST   | `/api/run`       | `ExecutionRequest` | `RunResponse` |
//! | POST   | `/api/check`     | `CheckRequest`   | `CheckReport`   |
//! | GET    | `/api/languages` |                  | `[LanguageInfo]`|
//! | GET    | `/health`        |                  | status/version  |

mod error;
mod handlers;

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::{Error, Result};

pub use error::AppError;

/// Build the router around a shared engine
pub fn router(engine: Engine, server: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/run", post(handlers::run))
        .route("/check", post(handlers::check))
        .route("/languages", get(handlers::languages));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .with_state(engine)
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

/// Bind and serve until ctrl-c
pub async fn serve(engine: Engine, server: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", server.bind, server.port)
        .parse()
        .map_err(|e| Error::Config(format!("invalid bind address {}:{}: {}", server.bind, server.port, e)))?;

    let app = router(engine, server);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down gateway");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(root: &std::path::Path) -> Router {
        let mut config = Config::default();
        config.execution.workspace_root = root.to_path_buf();
        config.server.max_body_bytes = 4096;
        let server = config.server.clone();
        router(Engine::new(config), &server)
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let root = tempfile::tempdir().unwrap();
        let (status, body) = call(app(root.path()), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_run_javascript() {
        let root = tempfile::tempdir().unwrap();
        let (status, body) = call(
            app(root.path()),
            "POST",
            "/api/run",
            Some(json!({"language": "javascript", "code": "console.log(1+1)"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["output"], "2\n");
        assert_eq!(body["error"], Value::Null);
        assert!(body["executionTime"].is_u64());
        assert!(body.get("timedOut").is_none());
    }

    #[tokio::test]
    async fn test_run_unsupported_is_not_an_http_error() {
        let root = tempfile::tempdir().unwrap();
        let (status, body) = call(
            app(root.path()),
            "POST",
            "/api/run",
            Some(json!({"language": "cobol", "code": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "cannot run this language: cobol");
    }

    #[tokio::test]
    async fn test_empty_code_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let (status, body) = call(app(root.path()), "POST", "/api/run", Some(json!({"code": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("code must not be empty"));
    }

    #[tokio::test]
    async fn test_check_json() {
        let root = tempfile::tempdir().unwrap();
        let (status, body) = call(
            app(root.path()),
            "POST",
            "/api/check",
            Some(json!({"filename": "data.json", "code": "{\"a\":}"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "json");
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(body["errors"][0]["severity"], "error");
        assert_eq!(body["errors"][0]["line"], 1);
    }

    #[tokio::test]
    async fn test_languages_listing() {
        let root = tempfile::tempdir().unwrap();
        let (status, body) = call(app(root.path()), "GET", "/api/languages", None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body.as_array().unwrap().iter().filter_map(|l| l["id"].as_str()).collect();
        assert!(ids.contains(&"javascript"));
        assert!(ids.contains(&"python"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let code = "x".repeat(10_000);
        let (status, _) = call(app(root.path()), "POST", "/api/check", Some(json!({"code": code}))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
