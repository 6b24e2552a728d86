// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (encrypted profile columns)
//! - Week plans (tasks, schedule rows and the per-week claim)

use crate::error::{AppError, PlanError};
use crate::models::{EncryptedProfile, ScheduledTask, WeekPlan};
use crate::week::format_date;
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Migrations embedded at compile time from `migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const MAX_CONNECTIONS: u32 = 5;

/// How the per-week claim row is treated when a plan is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMode {
    /// An existing claim for the week is kept and the new tasks are added.
    Shared,
    /// An existing claim aborts the write with `PersistOutcome::AlreadyExists`.
    Exclusive,
}

/// Result of a plan write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// All rows committed.
    Inserted { tasks: usize },
    /// Another generation already claimed this week; nothing was written.
    AlreadyExists,
}

/// SQLite database client.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database at `database_url` and apply pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        let db = Self { pool };
        db.run_migrations().await?;

        tracing::info!(url = database_url, "Connected to database");
        Ok(db)
    }

    /// Create a private in-memory database (for testing).
    ///
    /// The pool holds exactly one connection that never expires, since each
    /// SQLite connection to `:memory:` sees its own database.
    pub async fn connect_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), AppError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;
        tracing::debug!("Database migrations applied");
        Ok(())
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get the encrypted profile columns of a user.
    pub async fn get_encrypted_profile(
        &self,
        user_id: i64,
    ) -> Result<Option<EncryptedProfile>, AppError> {
        let profile = sqlx::query_as::<_, EncryptedProfile>(
            "SELECT birthday_encrypted, height_cm_encrypted, weight_kg_encrypted, \
                    goal_encrypted, activity_level_encrypted, allergies_encrypted \
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Store encrypted profile columns, creating the user row if needed,
    /// and mark setup as completed.
    pub async fn upsert_encrypted_profile(
        &self,
        user_id: i64,
        profile: &EncryptedProfile,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, birthday_encrypted, height_cm_encrypted, weight_kg_encrypted, \
                                goal_encrypted, activity_level_encrypted, allergies_encrypted, \
                                setup_completed) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 1) \
             ON CONFLICT (id) DO UPDATE SET \
                birthday_encrypted = excluded.birthday_encrypted, \
                height_cm_encrypted = excluded.height_cm_encrypted, \
                weight_kg_encrypted = excluded.weight_kg_encrypted, \
                goal_encrypted = excluded.goal_encrypted, \
                activity_level_encrypted = excluded.activity_level_encrypted, \
                allergies_encrypted = excluded.allergies_encrypted, \
                setup_completed = 1",
        )
        .bind(user_id)
        .bind(&profile.birthday_encrypted)
        .bind(&profile.height_cm_encrypted)
        .bind(&profile.weight_kg_encrypted)
        .bind(&profile.goal_encrypted)
        .bind(&profile.activity_level_encrypted)
        .bind(&profile.allergies_encrypted)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ─── Week Plan Operations ────────────────────────────────────

    /// Whether any plan rows exist for the user and week.
    pub async fn week_plan_exists(
        &self,
        user_id: i64,
        week_start: NaiveDate,
    ) -> Result<bool, AppError> {
        let week = format_date(week_start);
        let count: i64 = sqlx::query_scalar(
            "SELECT (SELECT COUNT(*) FROM task_schedule WHERE user_id = ? AND week_start_date = ?) \
                  + (SELECT COUNT(*) FROM week_plans WHERE user_id = ? AND week_start_date = ?)",
        )
        .bind(user_id)
        .bind(&week)
        .bind(user_id)
        .bind(&week)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Get all scheduled tasks of a user for one week, in weekday order.
    pub async fn get_scheduled_tasks(
        &self,
        user_id: i64,
        week_start: NaiveDate,
    ) -> Result<Vec<ScheduledTask>, AppError> {
        let tasks = sqlx::query_as::<_, ScheduledTask>(
            "SELECT s.id AS schedule_id, s.task_id, s.weekday, s.day_period, s.week_start_date, \
                    s.feedback_option, t.title, t.description, t.estimated_duration_minutes \
             FROM task_schedule s \
             JOIN tasks t ON t.id = s.task_id \
             WHERE s.user_id = ? AND s.week_start_date = ? \
             ORDER BY s.weekday ASC, s.id ASC",
        )
        .bind(user_id)
        .bind(format_date(week_start))
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    // ─── Atomic Plan Persistence ─────────────────────────────────

    /// Atomically store a generated week plan.
    ///
    /// Inside one transaction: claim the (user, week) pair, then insert one
    /// `tasks` row and one `task_schedule` row per task. Any failure rolls back
    /// every row of this generation; the commit is not retried.
    pub async fn persist_week_plan(
        &self,
        user_id: i64,
        week_start: NaiveDate,
        plan: &WeekPlan,
        mode: ClaimMode,
    ) -> Result<PersistOutcome, AppError> {
        let week = format_date(week_start);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| persistence_failed("begin transaction", e))?;

        // 1. Claim the week
        match mode {
            ClaimMode::Exclusive => {
                let claimed = sqlx::query(
                    "INSERT INTO week_plans (user_id, week_start_date) VALUES (?, ?)",
                )
                .bind(user_id)
                .bind(&week)
                .execute(&mut *tx)
                .await;

                match claimed {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => {
                        tracing::info!(
                            user_id,
                            week_start = %week,
                            "Week already claimed by another generation"
                        );
                        if let Err(e) = tx.rollback().await {
                            tracing::warn!(error = %e, "Rollback after claim conflict failed");
                        }
                        return Ok(PersistOutcome::AlreadyExists);
                    }
                    Err(e) => return Err(persistence_failed("claim week", e)),
                }
            }
            ClaimMode::Shared => {
                sqlx::query(
                    "INSERT INTO week_plans (user_id, week_start_date) VALUES (?, ?) \
                     ON CONFLICT (user_id, week_start_date) DO NOTHING",
                )
                .bind(user_id)
                .bind(&week)
                .execute(&mut *tx)
                .await
                .map_err(|e| persistence_failed("claim week", e))?;
            }
        }

        // 2. Tasks and their schedule rows. Returning early drops `tx`,
        //    which rolls the transaction back.
        let mut inserted = 0usize;
        for (weekday, task) in plan.tasks() {
            let task_id = sqlx::query(
                "INSERT INTO tasks (title, description, estimated_duration_minutes, created_by) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&task.title)
            .bind(&task.description)
            .bind(i64::from(task.duration))
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| persistence_failed("insert task", e))?
            .last_insert_rowid();

            sqlx::query(
                "INSERT INTO task_schedule \
                    (user_id, task_id, weekday, day_period, week_start_date, feedback_option) \
                 VALUES (?, ?, ?, ?, ?, 'none')",
            )
            .bind(user_id)
            .bind(task_id)
            .bind(i64::from(weekday))
            .bind(task.day_period.as_str())
            .bind(&week)
            .execute(&mut *tx)
            .await
            .map_err(|e| persistence_failed("insert schedule", e))?;

            inserted += 1;
        }

        // 3. Commit
        tx.commit()
            .await
            .map_err(|e| persistence_failed("commit", e))?;

        tracing::info!(
            user_id,
            week_start = %week,
            tasks = inserted,
            "Week plan persisted atomically"
        );

        Ok(PersistOutcome::Inserted { tasks: inserted })
    }
}

fn persistence_failed(step: &str, err: sqlx::Error) -> AppError {
    AppError::Plan(PlanError::PersistenceFailed(format!("{}: {}", step, err)))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
