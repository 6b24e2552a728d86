// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP surface tests.
//!
//! Run through the full router with `oneshot`, an in-memory database and a
//! fake inference service.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{FakeOllama, FakeReply, PLAN_REPLY};
use tower::ServiceExt;
use trainora::middleware::auth::SESSION_COOKIE;
use trainora::week;

fn post(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

fn get(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let (app, _) = common::create_test_app("http://127.0.0.1:9").await;

    for request in [
        post("/api/ollama/after-setup", None),
        post("/api/ollama/generate-next-week", None),
        get("/api/week-plan", None),
        get("/api/week-plan", Some("Bearer not-a-jwt")),
        get("/api/week-plan", Some("Basic dXNlcjpwYXNz")),
    ] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = common::json_body(response).await;
        assert_eq!(body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_public_routes() {
    let (app, _) = common::create_test_app("http://127.0.0.1:9").await;

    let response = app.clone().oneshot(get("/api/ping", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        common::json_body(response).await,
        serde_json::json!({"message": "pong", "status": "ok"})
    );

    let response = app
        .clone()
        .oneshot(get("/api/ollama/status", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::json_body(response).await["model"], "ready");

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "ready");
    assert!(body["build_id"].is_string());
}

#[tokio::test]
async fn test_after_setup_generates_current_week() {
    let fake = FakeOllama::start(FakeReply::Stream(PLAN_REPLY.to_string())).await;
    let (app, state) = common::create_test_app(&fake.url).await;
    common::seed_profile(&state.db, 5).await;
    let auth = common::bearer(&state, 5);

    let response = app
        .clone()
        .oneshot(post("/api/ollama/after-setup", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["tasks"], 3);

    let this_week = week::format_date(week::week_start(week::today()));
    assert_eq!(body["week_start"], this_week.as_str());

    // Read it back through the API, via the session cookie this time
    let token = auth.trim_start_matches("Bearer ");
    let request = Request::builder()
        .uri("/api/week-plan")
        .header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::json_body(response).await;
    assert_eq!(body["week_start"], this_week.as_str());
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 3);
    assert_eq!(tasks[0]["title"], "Morning walk");
    assert_eq!(tasks[0]["feedback_option"], "none");
    assert_eq!(tasks[2]["weekday"], 2);
}

#[tokio::test]
async fn test_generate_next_week_twice() {
    let fake = FakeOllama::start(FakeReply::Stream(PLAN_REPLY.to_string())).await;
    let (app, state) = common::create_test_app(&fake.url).await;
    common::seed_profile(&state.db, 5).await;
    let auth = common::bearer(&state, 5);

    let first = app
        .clone()
        .oneshot(post("/api/ollama/generate-next-week", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(common::json_body(first).await["tasks"], 3);

    let second = app
        .oneshot(post("/api/ollama/generate-next-week", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(
        common::json_body(second).await["message"],
        "plan for next week already exists"
    );
    assert_eq!(fake.requests(), 1);
}

#[tokio::test]
async fn test_pipeline_errors_map_to_codes() {
    let fake = FakeOllama::start(FakeReply::Stream("no plan today".to_string())).await;
    let (app, state) = common::create_test_app(&fake.url).await;
    common::seed_profile(&state.db, 5).await;

    let response = app
        .clone()
        .oneshot(post(
            "/api/ollama/after-setup",
            Some(&common::bearer(&state, 5)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::json_body(response).await["error"], "plan_invalid");

    // No stored profile
    let response = app
        .oneshot(post(
            "/api/ollama/after-setup",
            Some(&common::bearer(&state, 6)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(common::json_body(response).await["error"], "profile_error");
}

#[tokio::test]
async fn test_unreachable_model_is_generation_failure() {
    let (app, state) = common::create_test_app("http://127.0.0.1:9").await;
    common::seed_profile(&state.db, 5).await;

    let response = app
        .oneshot(post(
            "/api/ollama/after-setup",
            Some(&common::bearer(&state, 5)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = common::json_body(response).await;
    assert_eq!(body["error"], "generation_failed");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn test_week_plan_rejects_non_monday() {
    let (app, state) = common::create_test_app("http://127.0.0.1:9").await;
    let auth = common::bearer(&state, 5);

    for query in ["2024-06-11", "yesterday"] {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/week-plan?week_start={}", query), Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(common::json_body(response).await["error"], "bad_request");
    }

    let response = app
        .oneshot(get("/api/week-plan?week_start=2024-06-10", Some(&auth)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    assert_eq!(body["week_start"], "2024-06-10");
    assert_eq!(body["tasks"].as_array().unwrap().len(), 0);
}
