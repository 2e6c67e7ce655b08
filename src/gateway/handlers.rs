//! Route handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::checker::CheckReport;
use crate::engine::{CheckRequest, Engine, ExecutionRequest};
use crate::error::Error;
use crate::gateway::error::AppError;
use crate::languages::LanguageInfo;
use crate::result::RunResponse;

fn require_code(code: &str) -> Result<(), AppError> {
    if code.trim().is_empty() {
        return Err(Error::InvalidInput("code must not be empty".to_string()).into());
    }
    Ok(())
}

pub async fn run(
    State(engine): State<Engine>,
    Json(request): Json<ExecutionRequest>,
) -> Result<Json<RunResponse>, AppError> {
    require_code(&request.code)?;
    let report = engine.run(request).await;
    Ok(Json(report.into()))
}

pub async fn check(
    State(engine): State<Engine>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<CheckReport>, AppError> {
    require_code(&request.code)?;
    Ok(Json(engine.check(request).await))
}

pub async fn languages(State(engine): State<Engine>) -> Result<Json<Vec<LanguageInfo>>, AppError> {
    // PATH probing touches the filesystem.
    let languages = tokio::task::spawn_blocking(move || engine.languages())
        .await
        .map_err(Error::from)?;
    Ok(Json(languages))
}

#[derive(Debug, Serialize)]
pub struct Health {
    status: &'static str,
    name: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        name: crate::NAME,
        version: crate::VERSION,
    })
}
