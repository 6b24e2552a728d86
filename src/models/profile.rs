// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Health profile models.

use serde::{Deserialize, Serialize};

/// Encrypted profile columns as stored in the `users` table.
///
/// Columns are NULL until the user has completed setup.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EncryptedProfile {
    pub birthday_encrypted: Option<String>,
    pub height_cm_encrypted: Option<String>,
    pub weight_kg_encrypted: Option<String>,
    pub goal_encrypted: Option<String>,
    pub activity_level_encrypted: Option<String>,
    pub allergies_encrypted: Option<String>,
}

/// Decrypted, normalized profile used to build the plan prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub age: i32,
    pub height_cm: i32,
    pub weight_kg: f64,
    pub goal: String,
    pub activity_level: String,
    pub allergies: String,
}

/// Plaintext profile as submitted by the setup form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    /// Birthdate as `YYYY-MM-DD`
    pub birthday: String,
    pub height_cm: i32,
    pub weight_kg: f64,
    pub goal: String,
    pub activity_level: String,
    pub allergies: String,
}
