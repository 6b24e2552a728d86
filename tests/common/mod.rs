// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trainora::config::Config;
use trainora::db::Database;
use trainora::models::ProfileInput;
use trainora::routes::create_router;
use trainora::services::profile::store_profile;
use trainora::services::{FieldCipher, OllamaClient, PlanService, ReadinessHandle};
use trainora::AppState;

/// Field key used by every test.
pub const TEST_KEY: &str = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";

/// A small valid plan wrapped in prose, the way models tend to answer.
#[allow(dead_code)]
pub const PLAN_REPLY: &str = r#"Here is your plan:
{
  "week_plan": {
    "0": [
      {"title": "Morning walk", "description": "30 minutes at a brisk pace", "duration": 30, "day_period": "morning"},
      {"title": "Protein lunch", "description": "Lean protein and vegetables", "duration": 20, "day_period": "noon"}
    ],
    "2": [
      {"title": "Yoga", "description": "Gentle flow", "duration": 45, "day_period": "evening"}
    ],
    "6": []
  }
}
Stay healthy!"#;

#[allow(dead_code)]
pub fn test_cipher() -> FieldCipher {
    FieldCipher::from_hex(TEST_KEY).expect("test key is valid")
}

/// Create a fresh in-memory database.
#[allow(dead_code)]
pub async fn test_db() -> Database {
    Database::connect_in_memory()
        .await
        .expect("Failed to open in-memory database")
}

/// Store a complete encrypted profile for `user_id`.
#[allow(dead_code)]
pub async fn seed_profile(db: &Database, user_id: i64) {
    let input = ProfileInput {
        birthday: "1990-04-12".to_string(),
        height_cm: 175,
        weight_kg: 72.5,
        goal: "lose weight".to_string(),
        activity_level: "moderate".to_string(),
        allergies: "none".to_string(),
    };
    store_profile(db, &test_cipher(), user_id, &input)
        .await
        .expect("Failed to seed profile");
}

/// Count rows of a table.
#[allow(dead_code)]
pub async fn count_rows(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .expect("count query")
}

// ─── Fake inference service ──────────────────────────────────

/// Behavior of the fake `/api/generate` endpoint.
#[derive(Clone)]
#[allow(dead_code)]
pub enum FakeReply {
    /// Stream `text` as NDJSON fragments split across small network chunks.
    Stream(String),
    /// Answer every request with this status and no stream.
    Status(StatusCode),
    /// Answer 503 to the first `failures` requests, then stream `text`.
    WarmUp { failures: usize, text: String },
    /// Send one fragment and then never finish the body.
    Hang,
}

struct FakeState {
    reply: FakeReply,
    requests: AtomicUsize,
    bodies: Mutex<Vec<serde_json::Value>>,
}

/// In-process stand-in for the Ollama API.
pub struct FakeOllama {
    pub url: String,
    state: Arc<FakeState>,
}

#[allow(dead_code)]
impl FakeOllama {
    pub async fn start(reply: FakeReply) -> Self {
        let state = Arc::new(FakeState {
            reply,
            requests: AtomicUsize::new(0),
            bodies: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/api/generate", post(fake_generate))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake ollama");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    /// Number of generate requests received so far.
    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Request bodies received so far.
    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.state.bodies.lock().unwrap().clone()
    }

    pub fn client(&self) -> OllamaClient {
        OllamaClient::new(&self.url, "gemma3:12b", "24h")
    }
}

async fn fake_generate(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let seen = state.requests.fetch_add(1, Ordering::SeqCst);
    state.bodies.lock().unwrap().push(body);

    match &state.reply {
        FakeReply::Stream(text) => stream_reply(text),
        FakeReply::Status(status) => (*status, "unavailable").into_response(),
        FakeReply::WarmUp { failures, text } => {
            if seen < *failures {
                (StatusCode::SERVICE_UNAVAILABLE, "loading model").into_response()
            } else {
                stream_reply(text)
            }
        }
        FakeReply::Hang => {
            let first = futures_util::stream::iter([Ok::<_, std::io::Error>(Bytes::from_static(
                b"{\"response\":\"{\\\"week_plan\\\"\",\"done\":false}\n",
            ))]);
            let body = futures_util::StreamExt::chain(first, futures_util::stream::pending());
            Body::from_stream(body).into_response()
        }
    }
}

/// Encode `text` the way Ollama streams it, cut into 16-byte network chunks.
fn stream_reply(text: &str) -> Response {
    let mut payload = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    for piece in chars.chunks(5) {
        let fragment: String = piece.iter().collect();
        let line = serde_json::json!({"model": "gemma3:12b", "response": fragment, "done": false});
        payload.extend_from_slice(line.to_string().as_bytes());
        payload.push(b'\n');
    }
    payload.extend_from_slice(b"{\"model\":\"gemma3:12b\",\"response\":\"\",\"done\":true}\n");

    let chunks: Vec<Result<Bytes, std::io::Error>> = payload
        .chunks(16)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();

    Response::builder()
        .header("content-type", "application/x-ndjson")
        .body(Body::from_stream(futures_util::stream::iter(chunks)))
        .unwrap()
}

// ─── Application ─────────────────────────────────────────────

/// Test config pointing at `ollama_url`.
#[allow(dead_code)]
pub fn test_config(ollama_url: &str) -> Config {
    Config {
        ollama_url: ollama_url.to_string(),
        ..Config::test_default()
    }
}

/// Create a plan service over `db` talking to `ollama_url`.
#[allow(dead_code)]
pub fn test_plan_service(db: &Database, ollama_url: &str) -> PlanService {
    let config = test_config(ollama_url);
    PlanService::new(db.clone(), test_cipher(), OllamaClient::from_config(&config))
}

/// Create a test app over a fresh in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app(ollama_url: &str) -> (axum::Router, Arc<AppState>) {
    let config = test_config(ollama_url);
    let db = test_db().await;
    let plan_service = test_plan_service(&db, ollama_url);

    let state = Arc::new(AppState {
        config,
        db,
        plan_service,
        readiness: ReadinessHandle::ready(),
    });

    (create_router(state.clone()), state)
}

/// Bearer header value for a session of `user_id`.
#[allow(dead_code)]
pub fn bearer(state: &AppState, user_id: i64) -> String {
    let token = trainora::middleware::auth::create_jwt(user_id, &state.config.jwt_signing_key)
        .expect("create jwt");
    format!("Bearer {}", token)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
