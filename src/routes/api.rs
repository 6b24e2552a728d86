// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! General API routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::ScheduledTask;
use crate::week;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Routes that require a session.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/week-plan", get(get_week_plan))
}

/// Routes open to anyone.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ping", get(ping))
}

// ─── Liveness ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct PingResponse {
    pub message: &'static str,
    pub status: &'static str,
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong",
        status: "ok",
    })
}

// ─── Week Plan ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WeekPlanQuery {
    /// Monday of the requested week, `YYYY-MM-DD`. Defaults to this week.
    pub week_start: Option<String>,
}

#[derive(Serialize)]
pub struct WeekPlanResponse {
    pub week_start: String,
    pub tasks: Vec<ScheduledTask>,
}

/// Get the scheduled tasks of the current user for one week.
async fn get_week_plan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WeekPlanQuery>,
) -> Result<Json<WeekPlanResponse>> {
    let week_start = match query.week_start.as_deref() {
        Some(raw) => week::parse_week_start(raw).ok_or_else(|| {
            AppError::BadRequest(format!("week_start '{}' is not a Monday (YYYY-MM-DD)", raw))
        })?,
        None => week::week_start(week::today()),
    };

    let tasks = state
        .db
        .get_scheduled_tasks(user.user_id, week_start)
        .await?;

    Ok(Json(WeekPlanResponse {
        week_start: week::format_date(week_start),
        tasks,
    }))
}
