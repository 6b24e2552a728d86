// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly plan models shared by the extractor, the persister and the API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of weekday slots in a plan.
pub const DAYS_PER_WEEK: usize = 7;

/// Coarse time-of-day bucket for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Noon,
    Afternoon,
    Evening,
    Anytime,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 5] = [
        DayPeriod::Morning,
        DayPeriod::Noon,
        DayPeriod::Afternoon,
        DayPeriod::Evening,
        DayPeriod::Anytime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "morning",
            DayPeriod::Noon => "noon",
            DayPeriod::Afternoon => "afternoon",
            DayPeriod::Evening => "evening",
            DayPeriod::Anytime => "anytime",
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DayPeriod::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown day_period '{}'", s))
    }
}

/// A single task proposed by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTask {
    pub title: String,
    pub description: String,
    /// Estimated duration in minutes (always positive)
    pub duration: u32,
    pub day_period: DayPeriod,
}

/// Seven ordered task lists, indexed by days after the week-start Monday
/// (0 = Monday, 6 = Sunday).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekPlan {
    days: [Vec<PlanTask>; DAYS_PER_WEEK],
}

impl WeekPlan {
    /// Tasks for one weekday slot. Out-of-range slots are empty.
    pub fn day(&self, weekday: usize) -> &[PlanTask] {
        self.days.get(weekday).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace the task list of a weekday slot.
    ///
    /// Panics if `weekday >= DAYS_PER_WEEK`.
    pub fn set_day(&mut self, weekday: usize, tasks: Vec<PlanTask>) {
        self.days[weekday] = tasks;
    }

    /// All tasks in weekday order, then in model order within a day.
    pub fn tasks(&self) -> impl Iterator<Item = (u8, &PlanTask)> {
        self.days
            .iter()
            .enumerate()
            .flat_map(|(weekday, tasks)| tasks.iter().map(move |t| (weekday as u8, t)))
    }

    pub fn task_count(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.task_count() == 0
    }
}

/// A persisted schedule entry joined with its task.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ScheduledTask {
    pub schedule_id: i64,
    pub task_id: i64,
    pub weekday: i64,
    pub day_period: String,
    pub week_start_date: String,
    pub feedback_option: String,
    pub title: String,
    pub description: String,
    pub estimated_duration_minutes: i64,
}
