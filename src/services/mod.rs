// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cipher;
pub mod extract;
pub mod ollama;
pub mod planner;
pub mod profile;
pub mod prompt;
pub mod readiness;

pub use cipher::{CipherError, FieldCipher};
pub use ollama::OllamaClient;
pub use planner::{GenerationOutcome, PlanService};
pub use readiness::{ModelReadiness, ReadinessHandle, ReadinessPoller};
