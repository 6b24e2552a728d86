// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Week plan generation pipeline.
//!
//! Profile load → prompt → model generation → extraction → atomic persist.
//! Any failing stage aborts the whole run and nothing is written.

use crate::db::{ClaimMode, Database, PersistOutcome};
use crate::error::AppError;
use crate::services::cipher::FieldCipher;
use crate::services::extract::extract_plan;
use crate::services::ollama::OllamaClient;
use crate::services::profile::load_profile;
use crate::services::prompt::build_prompt;
use crate::week;
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Shared per-user generation locks.
pub type GenerationLocks = Arc<DashMap<i64, Arc<Mutex<()>>>>;

/// Result of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// A plan was generated and committed.
    Generated { week_start: NaiveDate, tasks: usize },
    /// The week already had a plan; nothing was generated or written.
    AlreadyExists { week_start: NaiveDate },
}

/// Orchestrates plan generation for users.
#[derive(Clone)]
pub struct PlanService {
    db: Database,
    cipher: FieldCipher,
    ollama: OllamaClient,
    /// Serializes next-week check-then-generate per user.
    generation_locks: GenerationLocks,
}

impl PlanService {
    pub fn new(db: Database, cipher: FieldCipher, ollama: OllamaClient) -> Self {
        Self {
            db,
            cipher,
            ollama,
            generation_locks: Arc::new(DashMap::new()),
        }
    }

    /// Generate and store a plan for the week containing today.
    ///
    /// Runs unconditionally; repeated calls add another set of tasks.
    pub async fn generate_for_current_week(
        &self,
        user_id: i64,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, AppError> {
        let week_start = week::week_start(week::today());
        self.run_pipeline(user_id, week_start, ClaimMode::Shared, cancel)
            .await
    }

    /// Generate and store a plan for next week unless one already exists.
    pub async fn generate_for_next_week(
        &self,
        user_id: i64,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, AppError> {
        let week_start = week::next_week_start(week::today());

        let lock = self
            .generation_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.generate_next_week_locked(user_id, week_start, cancel)
                .await
        };

        drop(lock);
        // Only the map holds the lock now unless another request is waiting
        self.generation_locks
            .remove_if(&user_id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn generate_next_week_locked(
        &self,
        user_id: i64,
        week_start: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, AppError> {
        if self.db.week_plan_exists(user_id, week_start).await? {
            tracing::info!(
                user_id,
                week_start = %week::format_date(week_start),
                "Next week plan already exists, skipping generation"
            );
            return Ok(GenerationOutcome::AlreadyExists { week_start });
        }

        self.run_pipeline(user_id, week_start, ClaimMode::Exclusive, cancel)
            .await
    }

    async fn run_pipeline(
        &self,
        user_id: i64,
        week_start: NaiveDate,
        mode: ClaimMode,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, AppError> {
        let profile = load_profile(&self.db, &self.cipher, user_id, week::today()).await?;
        let prompt = build_prompt(&profile);

        tracing::info!(
            user_id,
            week_start = %week::format_date(week_start),
            model = self.ollama.model(),
            "Generating week plan"
        );
        let raw = self.ollama.generate(&prompt, cancel).await?;

        let plan = extract_plan(&raw).inspect_err(|e| {
            tracing::warn!(user_id, error = %e, "Model output rejected");
        })?;

        match self
            .db
            .persist_week_plan(user_id, week_start, &plan, mode)
            .await?
        {
            PersistOutcome::Inserted { tasks } => Ok(GenerationOutcome::Generated { week_start, tasks }),
            PersistOutcome::AlreadyExists => Ok(GenerationOutcome::AlreadyExists { week_start }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

    async fn service() -> PlanService {
        let db = Database::connect_in_memory().await.unwrap();
        let cipher = FieldCipher::from_hex(KEY).unwrap();
        let ollama = OllamaClient::new("http://127.0.0.1:9", "gemma3:12b", "24h");
        PlanService::new(db, cipher, ollama)
    }

    #[tokio::test]
    async fn test_generation_lock_released_after_request() {
        let service = service().await;

        // No stored profile: the pipeline fails before reaching the model
        for user_id in [1, 2, 3] {
            let result = service
                .generate_for_next_week(user_id, &CancellationToken::new())
                .await;
            assert!(result.is_err());
        }

        assert!(service.generation_locks.is_empty());
    }

    #[tokio::test]
    async fn test_generation_lock_kept_while_contended() {
        let service = service().await;
        let held = Arc::new(Mutex::new(()));
        service.generation_locks.insert(1, held.clone());

        let guard = held.lock().await;
        let waiter = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .generate_for_next_week(1, &CancellationToken::new())
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        assert!(waiter.await.unwrap().is_err());

        // Entry survives while an outside holder keeps a reference
        assert!(service.generation_locks.contains_key(&1));
        drop(held);
    }
}
