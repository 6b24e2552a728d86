// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background warm-up poller for the language model.
//!
//! A single detached task probes the inference service until it answers,
//! then publishes `Ready` and exits. Readers observe the state through a
//! cloneable [`ReadinessHandle`]; the transition happens at most once.

use crate::services::ollama::OllamaClient;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;

/// Whether the model has answered a probe yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelReadiness {
    NotReady,
    Ready,
}

/// Read side of the readiness cell.
#[derive(Debug, Clone)]
pub struct ReadinessHandle {
    rx: watch::Receiver<ModelReadiness>,
}

impl ReadinessHandle {
    /// A handle that is already `Ready` and has no poller behind it.
    pub fn ready() -> Self {
        let (_tx, rx) = watch::channel(ModelReadiness::Ready);
        Self { rx }
    }

    pub fn current(&self) -> ModelReadiness {
        *self.rx.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.current() == ModelReadiness::Ready
    }

    /// Resolve once the model is ready.
    ///
    /// Never resolves if the poller stops without ever succeeding.
    pub async fn wait_until_ready(&self) {
        let mut rx = self.rx.clone();
        let reached = rx
            .wait_for(|state| *state == ModelReadiness::Ready)
            .await
            .is_ok();
        if !reached {
            std::future::pending::<()>().await;
        }
    }
}

/// Spawns the probe loop.
pub struct ReadinessPoller;

impl ReadinessPoller {
    /// Start probing `client` every `interval` in a detached task.
    pub fn spawn(client: OllamaClient, interval: Duration) -> ReadinessHandle {
        let (tx, rx) = watch::channel(ModelReadiness::NotReady);

        tokio::spawn(async move {
            let mut attempts: u32 = 0;
            loop {
                attempts += 1;
                match client.probe().await {
                    Ok(()) => {
                        tracing::info!(model = client.model(), attempts, "Model is ready");
                        // Receivers may all be gone; the state is still final.
                        tx.send_replace(ModelReadiness::Ready);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            model = client.model(),
                            attempts,
                            error = %e,
                            "Model not ready yet"
                        );
                    }
                }
                tokio::time::sleep(interval).await;
            }
        });

        ReadinessHandle { rx }
    }
}
