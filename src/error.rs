// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::cipher::CipherError;

/// Failures of the profile → prompt → model → storage pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Failed to decrypt profile field '{field}': {source}")]
    ProfileDecryptionFailed {
        field: &'static str,
        #[source]
        source: CipherError,
    },

    #[error("Invalid birthdate: expected YYYY-MM-DD")]
    InvalidBirthdate,

    #[error("Invalid profile field '{field}'")]
    InvalidProfileField { field: &'static str },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("No JSON object found in model response")]
    NoJsonFound,

    #[error("Failed to parse week plan: {0}")]
    PlanParseFailed(String),

    #[error("Failed to persist week plan: {0}")]
    PersistenceFailed(String),
}

impl PlanError {
    /// Stable category code reported to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::UserNotFound(_)
            | PlanError::ProfileDecryptionFailed { .. }
            | PlanError::InvalidBirthdate
            | PlanError::InvalidProfileField { .. } => "profile_error",
            PlanError::GenerationFailed(_) => "generation_failed",
            PlanError::NoJsonFound | PlanError::PlanParseFailed(_) => "plan_invalid",
            PlanError::PersistenceFailed(_) => "database_error",
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Plan(PlanError::PersistenceFailed(msg)) => {
                tracing::error!(error = %msg, "Week plan persistence failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Plan(err) => {
                tracing::error!(error = %err, code = err.code(), "Week plan generation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.code(),
                    Some(err.to_string()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
