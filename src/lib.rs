// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainora: weekly health plans generated by a local language model
//!
//! This crate provides the backend that decrypts a user's stored health
//! profile, asks the model for a 7-day task plan and persists the validated
//! plan atomically.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod week;

use config::Config;
use db::Database;
use services::{PlanService, ReadinessHandle};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub plan_service: PlanService,
    pub readiness: ReadinessHandle,
}
