// Common test utilities and helpers for all test modules

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use eventhub::api::{create_router, AppState};
use eventhub::config::Config;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Secret used by `Config::test_config`
pub const TEST_JWT_SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

/// Router over a fresh in-memory store
pub fn test_app() -> Router {
    create_router(AppState::with_memory_store(Config::test_config()))
}

/// Build a request with an optional JSON body and token
pub fn request(method: Method, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Run a request through the router and decode the JSON body
///
/// An empty body decodes to `Value::Null`.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Sign up and return the new user's id
pub async fn signup(app: &Router, email: &str, password: &str) -> i64 {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/signup",
            Some(json!({ "email": email, "password": password })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    body["user"]["id"].as_i64().unwrap()
}

/// Log in and return the token
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/login",
            Some(json!({ "email": email, "password": password })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// Sign up then log in; returns (user id, token)
pub async fn user_with_token(app: &Router, email: &str) -> (i64, String) {
    let id = signup(app, email, "s3cret").await;
    let token = login(app, email, "s3cret").await;
    (id, token)
}

/// A valid event body
pub fn event_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Monthly get-together",
        "location": "Berlin",
        "dateTime": "2025-01-01T15:30:00Z"
    })
}

/// Create an event as the token holder and return its id
pub async fn create_event(app: &Router, token: &str, body: Value) -> i64 {
    let (status, response) = send(app, request(Method::POST, "/events", Some(body), Some(token))).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {response}");
    response["event"]["id"].as_i64().unwrap()
}
