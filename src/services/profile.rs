// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loading and storing the encrypted health profile.

use crate::db::Database;
use crate::error::{AppError, PlanError};
use crate::models::{EncryptedProfile, ProfileInput, UserProfile};
use crate::services::cipher::{CipherError, FieldCipher};
use crate::week::DATE_FORMAT;
use chrono::{Datelike, NaiveDate};

/// Load, decrypt and normalize a user's profile as of `today`.
///
/// Birthday, height and weight are required. Goal, activity level and
/// allergies degrade to an empty string when they cannot be decrypted.
pub async fn load_profile(
    db: &Database,
    cipher: &FieldCipher,
    user_id: i64,
    today: NaiveDate,
) -> Result<UserProfile, AppError> {
    let encrypted = db
        .get_encrypted_profile(user_id)
        .await?
        .ok_or(PlanError::UserNotFound(user_id))?;

    Ok(decrypt_profile(cipher, &encrypted, user_id, today)?)
}

/// Encrypt and store a plaintext profile.
pub async fn store_profile(
    db: &Database,
    cipher: &FieldCipher,
    user_id: i64,
    input: &ProfileInput,
) -> Result<(), AppError> {
    NaiveDate::parse_from_str(&input.birthday, DATE_FORMAT)
        .map_err(|_| AppError::BadRequest(format!("Invalid birthday '{}'", input.birthday)))?;

    let seal = |value: &str| -> Result<Option<String>, AppError> {
        cipher.encrypt(value).map(Some).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Profile encryption failed: {}", e))
        })
    };

    let encrypted = EncryptedProfile {
        birthday_encrypted: seal(&input.birthday)?,
        height_cm_encrypted: seal(&input.height_cm.to_string())?,
        weight_kg_encrypted: seal(&input.weight_kg.to_string())?,
        goal_encrypted: seal(&input.goal)?,
        activity_level_encrypted: seal(&input.activity_level)?,
        allergies_encrypted: seal(&input.allergies)?,
    };

    db.upsert_encrypted_profile(user_id, &encrypted).await?;
    tracing::info!(user_id, "Encrypted profile stored");
    Ok(())
}

fn decrypt_profile(
    cipher: &FieldCipher,
    encrypted: &EncryptedProfile,
    user_id: i64,
    today: NaiveDate,
) -> Result<UserProfile, PlanError> {
    let birthday = decrypt_required(cipher, "birthday", &encrypted.birthday_encrypted)?;
    let height = decrypt_required(cipher, "height_cm", &encrypted.height_cm_encrypted)?;
    let weight = decrypt_required(cipher, "weight_kg", &encrypted.weight_kg_encrypted)?;

    let goal = decrypt_optional(cipher, user_id, "goal", &encrypted.goal_encrypted);
    let activity_level = decrypt_optional(
        cipher,
        user_id,
        "activity_level",
        &encrypted.activity_level_encrypted,
    );
    let allergies = decrypt_optional(cipher, user_id, "allergies", &encrypted.allergies_encrypted);

    let birthday = NaiveDate::parse_from_str(birthday.trim(), DATE_FORMAT)
        .map_err(|_| PlanError::InvalidBirthdate)?;

    Ok(UserProfile {
        age: age_on(birthday, today),
        height_cm: height
            .trim()
            .parse()
            .map_err(|_| PlanError::InvalidProfileField { field: "height_cm" })?,
        weight_kg: weight
            .trim()
            .parse()
            .map_err(|_| PlanError::InvalidProfileField { field: "weight_kg" })?,
        goal,
        activity_level,
        allergies,
    })
}

fn decrypt_required(
    cipher: &FieldCipher,
    field: &'static str,
    value: &Option<String>,
) -> Result<String, PlanError> {
    let value = value
        .as_deref()
        .ok_or(PlanError::ProfileDecryptionFailed {
            field,
            source: CipherError::CiphertextTooShort,
        })?;
    cipher
        .decrypt(value)
        .map_err(|source| PlanError::ProfileDecryptionFailed { field, source })
}

fn decrypt_optional(
    cipher: &FieldCipher,
    user_id: i64,
    field: &'static str,
    value: &Option<String>,
) -> String {
    let Some(value) = value.as_deref() else {
        return String::new();
    };
    cipher.decrypt(value).unwrap_or_else(|e| {
        tracing::warn!(user_id, field, error = %e, "Optional profile field unreadable, using empty value");
        String::new()
    })
}

/// Age in whole years: calendar-year difference, minus one while today's
/// day-of-year is still before the birthday's day-of-year.
pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthday.year();
    if today.ordinal() < birthday.ordinal() {
        age -= 1;
    }
    age
}
