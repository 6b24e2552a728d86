// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plan generation routes backed by the Ollama model.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::services::{GenerationOutcome, ModelReadiness};
use crate::week;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Routes that require a session.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ollama/after-setup", post(after_setup))
        .route("/api/ollama/generate-next-week", post(generate_next_week))
}

/// Routes open to anyone.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ollama/status", get(model_status))
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<usize>,
}

impl From<GenerationOutcome> for GenerationResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Generated { week_start, tasks } => Self {
                message: "week plan generated".to_string(),
                week_start: Some(week::format_date(week_start)),
                tasks: Some(tasks),
            },
            GenerationOutcome::AlreadyExists { week_start } => Self {
                message: "plan for next week already exists".to_string(),
                week_start: Some(week::format_date(week_start)),
                tasks: None,
            },
        }
    }
}

/// Generate this week's plan right after profile setup.
async fn after_setup(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<GenerationResponse>> {
    // Dropping the request future (client gone) cancels generation
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let outcome = state
        .plan_service
        .generate_for_current_week(user.user_id, &cancel)
        .await?;

    Ok(Json(outcome.into()))
}

/// Generate next week's plan unless it already exists.
async fn generate_next_week(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<GenerationResponse>> {
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let outcome = state
        .plan_service
        .generate_for_next_week(user.user_id, &cancel)
        .await?;

    Ok(Json(outcome.into()))
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub model: ModelReadiness,
}

async fn model_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        model: state.readiness.current(),
    })
}
