// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod plan;
pub mod profile;

pub use plan::{DayPeriod, PlanTask, ScheduledTask, WeekPlan, DAYS_PER_WEEK};
pub use profile::{EncryptedProfile, ProfileInput, UserProfile};
