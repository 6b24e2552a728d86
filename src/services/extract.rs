// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Extraction of the week plan JSON from free-form model output.
//!
//! Models often wrap the requested JSON in prose, so the candidate payload is
//! everything from the first `{` to the last `}`. The parsed plan is then
//! validated strictly; nothing that fails validation reaches storage.

use crate::error::PlanError;
use crate::models::{DayPeriod, PlanTask, WeekPlan, DAYS_PER_WEEK};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;

#[derive(Deserialize)]
struct RawResponse {
    week_plan: RawWeek,
}

/// Day entries in document order, duplicates kept.
struct RawWeek(Vec<(String, Vec<RawTask>)>);

impl<'de> Deserialize<'de> for RawWeek {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct WeekVisitor;

        impl<'de> Visitor<'de> for WeekVisitor {
            type Value = RawWeek;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of weekday keys to task lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawWeek, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, Vec<RawTask>>()? {
                    entries.push(entry);
                }
                Ok(RawWeek(entries))
            }
        }

        deserializer.deserialize_map(WeekVisitor)
    }
}

#[derive(Deserialize)]
struct RawTask {
    title: String,
    description: String,
    duration: i64,
    day_period: String,
}

/// Parse and validate the week plan embedded in `raw`.
pub fn extract_plan(raw: &str) -> Result<WeekPlan, PlanError> {
    let candidate = json_candidate(raw).ok_or(PlanError::NoJsonFound)?;

    let response: RawResponse = serde_json::from_str(candidate)
        .map_err(|e| PlanError::PlanParseFailed(e.to_string()))?;

    let mut plan = WeekPlan::default();
    let mut seen = [false; DAYS_PER_WEEK];
    for (key, raw_tasks) in response.week_plan.0 {
        let weekday = parse_weekday(&key)?;
        if std::mem::replace(&mut seen[weekday], true) {
            return Err(PlanError::PlanParseFailed(format!(
                "weekday key '{}' appears more than once",
                key
            )));
        }
        let tasks = raw_tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| validate_task(&key, index, task))
            .collect::<Result<Vec<_>, _>>()?;
        plan.set_day(weekday, tasks);
    }

    Ok(plan)
}

/// Inclusive substring from the first `{` to the last `}`.
fn json_candidate(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Only the canonical keys `"0"` through `"6"` are accepted.
fn parse_weekday(key: &str) -> Result<usize, PlanError> {
    match key.as_bytes() {
        [digit @ b'0'..=b'6'] => Ok(usize::from(digit - b'0')),
        _ => Err(PlanError::PlanParseFailed(format!(
            "invalid weekday key '{}'",
            key
        ))),
    }
}

fn validate_task(day: &str, index: usize, task: RawTask) -> Result<PlanTask, PlanError> {
    let invalid = |reason: String| {
        PlanError::PlanParseFailed(format!("day {} task {}: {}", day, index, reason))
    };

    let title = task.title.trim().to_string();
    if title.is_empty() {
        return Err(invalid("title is empty".to_string()));
    }

    let duration = u32::try_from(task.duration)
        .ok()
        .filter(|minutes| *minutes > 0)
        .ok_or_else(|| {
            invalid(format!(
                "duration {} is not a positive number of minutes",
                task.duration
            ))
        })?;

    let day_period = task
        .day_period
        .trim()
        .to_ascii_lowercase()
        .parse::<DayPeriod>()
        .map_err(invalid)?;

    Ok(PlanTask {
        title,
        description: task.description.trim().to_string(),
        duration,
        day_period,
    })
}
