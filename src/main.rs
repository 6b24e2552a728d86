// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trainora API Server
//!
//! Generates weekly fitness and nutrition plans from encrypted user profiles
//! using a local Ollama model.

use anyhow::Context;
use std::sync::Arc;
use trainora::{
    config::Config,
    db::Database,
    services::{FieldCipher, OllamaClient, PlanService, ReadinessPoller},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Trainora API");

    // Refuse to start without a usable field key
    let cipher =
        FieldCipher::from_hex(&config.secret_key).context("SECRET_KEY is not a valid key")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to open database")?;

    let ollama = OllamaClient::from_config(&config);
    tracing::info!(
        url = %config.ollama_url,
        model = ollama.model(),
        json_format = config.ollama_json_format,
        "Ollama client initialized"
    );

    // Warm the model in the background; requests are served meanwhile
    let readiness = ReadinessPoller::spawn(ollama.clone(), config.readiness_poll_interval);

    let plan_service = PlanService::new(db.clone(), cipher, ollama);

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        plan_service,
        readiness,
    });

    let app = trainora::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trainora=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
