// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honored for local development.

use std::env;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// sqlx connection URL for the SQLite database
    pub database_url: String,

    // --- Secrets ---
    /// Hex-encoded 32-byte key for profile field encryption
    pub secret_key: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    // --- Inference service ---
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_keep_alive: String,
    /// Request JSON-constrained output
    pub ollama_json_format: bool,
    /// Upper bound on one generation call; unbounded when unset
    pub ollama_timeout: Option<Duration>,
    /// Delay between readiness probes
    pub readiness_poll_interval: Duration,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://trainora.db?mode=rwc";
const DEFAULT_OLLAMA_URL: &str = "http://ollama:11434";
const DEFAULT_OLLAMA_MODEL: &str = "gemma3:12b";
const DEFAULT_KEEP_ALIVE: &str = "24h";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: parse_or("PORT", DEFAULT_PORT)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),

            secret_key: env::var("SECRET_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("SECRET_KEY"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            ollama_url: env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: env::var("OLLAMA_MODEL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string()),
            ollama_keep_alive: env::var("OLLAMA_KEEP_ALIVE")
                .unwrap_or_else(|_| DEFAULT_KEEP_ALIVE.to_string()),
            ollama_json_format: parse_or("OLLAMA_JSON_FORMAT", false)?,
            ollama_timeout: parse_optional::<u64>("OLLAMA_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            readiness_poll_interval: Duration::from_millis(parse_or(
                "READINESS_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
        })
    }

    /// Config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: "sqlite::memory:".to_string(),
            secret_key: "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff"
                .to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            ollama_url: "http://127.0.0.1:11434".to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            ollama_keep_alive: DEFAULT_KEEP_ALIVE.to_string(),
            ollama_json_format: false,
            ollama_timeout: None,
            readiness_poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

fn parse_optional<T>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            }),
        _ => Ok(None),
    }
}

fn parse_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(var)?.unwrap_or(default))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
