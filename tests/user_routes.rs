use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use scorekeeper_back::{
    dao::{
        ids::UuidGenerator,
        user_store::{StoreBackend, memory::MemoryUserStore},
    },
    routes,
    state::{AppState, SharedState},
};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn setup_app() -> (Router, SharedState) {
    let state = AppState::new(
        StoreBackend::Memory,
        Arc::new(UuidGenerator),
        Duration::from_secs(1),
    );
    state
        .install_user_store(Arc::new(MemoryUserStore::new()))
        .await;
    (routes::router(state.clone()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn create(app: &Router, username: &str) -> String {
    let (status, body) = send(app, post_json("/user", json!({ "username": username }))).await;
    assert_eq!(status, StatusCode::OK);
    body["entityId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn created_user_can_be_fetched() {
    let (app, _) = setup_app().await;

    let (status, created) = send(&app, post_json("/user", json!({ "username": "alice" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["username"], "alice");
    assert_eq!(created["score"], 0);
    assert_eq!(created["noOfGamesPlayed"], 0);

    let id = created["entityId"].as_str().unwrap();
    let (status, fetched) = send(&app, get(&format!("/user/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn blank_or_missing_username_is_rejected() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, post_json("/user", json!({ "username": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());

    let (status, _) = send(&app, post_json("/user", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let (app, _) = setup_app().await;

    let (status, _) = send(&app, get("/user/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/user/score?entityId=does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        post_json("/user/score", json!({ "entityId": "does-not-exist", "score": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn score_update_replaces_only_the_score() {
    let (app, _) = setup_app().await;
    let id = create(&app, "alice").await;

    let (status, body) = send(
        &app,
        post_json("/user/score", json!({ "entityId": id, "score": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, get(&format!("/user/score?entityId={id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "score": 42 }));

    let (_, record) = send(&app, get(&format!("/user/{id}"))).await;
    assert_eq!(record["username"], "alice");
    assert_eq!(record["noOfGamesPlayed"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_score_updates_keep_a_submitted_value() {
    let (app, _) = setup_app().await;
    let id = create(&app, "bob").await;

    let updates = [5, 7].map(|score| {
        let app = app.clone();
        let id = id.clone();
        tokio::spawn(async move {
            send(
                &app,
                post_json("/user/score", json!({ "entityId": id, "score": score })),
            )
            .await
            .0
        })
    });
    for update in updates {
        assert_eq!(update.await.unwrap(), StatusCode::NO_CONTENT);
    }

    let (_, record) = send(&app, get(&format!("/user/{id}"))).await;
    let score = record["score"].as_i64().unwrap();
    assert!(score == 5 || score == 7, "unexpected score {score}");
    assert_eq!(record["username"], "bob");
}

#[tokio::test]
async fn malformed_score_requests_are_bad_requests() {
    let (app, _) = setup_app().await;

    let (status, _) = send(&app, get("/user/score")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_json("/user/score", json!({ "entityId": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json("/user/score", json!({ "entityId": "x", "score": "high" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn degraded_mode_answers_service_unavailable() {
    let (app, state) = setup_app().await;
    let id = create(&app, "carol").await;

    state.update_degraded(true);

    let (status, _) = send(&app, get(&format!("/user/{id}"))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = send(&app, get("/healthcheck")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");

    state.update_degraded(false);
    let (status, _) = send(&app, get(&format!("/user/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn healthcheck_reports_backend() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, get("/healthcheck")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "backend": "memory" }));
}

#[tokio::test]
async fn openapi_document_lists_user_routes() {
    let (app, _) = setup_app().await;

    let (status, doc) = send(&app, get("/api-doc/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/user"].is_object());
    assert!(doc["paths"]["/user/score"]["post"].is_object());
}
