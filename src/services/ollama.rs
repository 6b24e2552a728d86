// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ollama API client for streaming text generation.
//!
//! Handles:
//! - Streaming `/api/generate` calls, reassembled into one text blob
//! - Optional JSON-constrained output and client-side timeout
//! - The lightweight warm-up probe used by the readiness poller

use crate::config::Config;
use crate::error::PlanError;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Prompt sent by the warm-up probe.
const PROBE_PROMPT: &str = "Hello";

/// Body of a `/api/generate` request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub keep_alive: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'a str>,
}

/// One streamed unit of a generate response.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    error: Option<String>,
}

/// Ollama API client.
#[derive(Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    keep_alive: String,
    json_format: bool,
    timeout: Option<Duration>,
}

impl OllamaClient {
    /// Create a client for the inference service at `base_url`.
    pub fn new(base_url: &str, model: &str, keep_alive: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            keep_alive: keep_alive.to_string(),
            json_format: false,
            timeout: None,
        }
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.ollama_url,
            &config.ollama_model,
            &config.ollama_keep_alive,
        )
        .with_json_format(config.ollama_json_format)
        .with_timeout(config.ollama_timeout)
    }

    /// Ask the service for JSON-constrained output.
    pub fn with_json_format(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    /// Bound the duration of a whole generation call.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    fn request<'a>(&'a self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            prompt,
            keep_alive: &self.keep_alive,
            format: self.json_format.then_some("json"),
        }
    }

    /// Generate a completion for `prompt` and return the full text.
    ///
    /// Blocks until the stream ends. Cancellation, timeout, transport errors
    /// and malformed fragments all surface as `GenerationFailed`; partial
    /// output is discarded.
    pub async fn generate(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PlanError> {
        let request = self.request(prompt);

        let work = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, self.stream_text(&request))
                    .await
                    .unwrap_or_else(|_| {
                        Err(PlanError::GenerationFailed(format!(
                            "timed out after {:?}",
                            limit
                        )))
                    }),
                None => self.stream_text(&request).await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(model = %self.model, "Generation cancelled");
                Err(PlanError::GenerationFailed("cancelled".to_string()))
            }
            result = work => result,
        }
    }

    async fn stream_text(&self, request: &GenerateRequest<'_>) -> Result<String, PlanError> {
        let started = std::time::Instant::now();

        let response = self
            .http
            .post(self.generate_url())
            .json(request)
            .send()
            .await
            .map_err(|e| PlanError::GenerationFailed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlanError::GenerationFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let mut stream = response.bytes_stream();
        let mut decoder = FragmentDecoder::default();
        let mut text = String::new();

        while let Some(bytes) = stream.next().await {
            let bytes = bytes
                .map_err(|e| PlanError::GenerationFailed(format!("stream read failed: {}", e)))?;
            for fragment in decoder.push(&bytes)? {
                text.push_str(&fragment);
            }
        }
        decoder.finish()?;

        tracing::debug!(
            model = %self.model,
            chars = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generation stream complete"
        );
        Ok(text)
    }

    /// Send a minimal generate request. Succeeds on any non-error status.
    pub async fn probe(&self) -> Result<(), PlanError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: PROBE_PROMPT,
            keep_alive: &self.keep_alive,
            format: None,
        };

        let response = self
            .http
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| PlanError::GenerationFailed(format!("probe request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(PlanError::GenerationFailed(
                "probe returned 404 (model not loaded or wrong route)".to_string(),
            ));
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(PlanError::GenerationFailed(format!("probe returned HTTP {}", status)));
        }

        Ok(())
    }
}

/// Incremental decoder for a body made of concatenated JSON objects.
///
/// Objects may be split across network chunks or packed several to a chunk.
#[derive(Debug, Default)]
pub struct FragmentDecoder {
    buffer: Vec<u8>,
}

impl FragmentDecoder {
    /// Feed bytes; returns the text fragments of every object completed so far.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, PlanError> {
        self.buffer.extend_from_slice(bytes);

        let mut fragments = Vec::new();
        let mut objects =
            serde_json::Deserializer::from_slice(&self.buffer).into_iter::<GenerateChunk>();

        loop {
            match objects.next() {
                Some(Ok(chunk)) => {
                    if let Some(error) = chunk.error {
                        return Err(PlanError::GenerationFailed(format!(
                            "inference service error: {}",
                            error
                        )));
                    }
                    fragments.push(chunk.response);
                }
                // Incomplete trailing object: wait for more bytes
                Some(Err(e)) if e.is_eof() => break,
                Some(Err(e)) => {
                    return Err(PlanError::GenerationFailed(format!(
                        "malformed stream fragment: {}",
                        e
                    )))
                }
                None => break,
            }
        }

        let consumed = objects.byte_offset();
        self.buffer.drain(..consumed);
        Ok(fragments)
    }

    /// Check that the stream did not end inside an object.
    pub fn finish(self) -> Result<(), PlanError> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            Ok(())
        } else {
            Err(PlanError::GenerationFailed(
                "stream ended mid-fragment".to_string(),
            ))
        }
    }
}
