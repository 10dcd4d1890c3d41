// Signup, login and the auth gate over HTTP

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use eventhub::auth::token::TokenService;
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_signup_then_login() {
    let app = test_app();

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/signup",
            Some(json!({ "email": "a@b.c", "password": "s3cret" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "a@b.c");
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());

    let token = login(&app, "a@b.c", "s3cret").await;
    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = test_app();
    signup(&app, "a@b.c", "s3cret").await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/login",
            Some(json!({ "email": "a@b.c", "password": "nope" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid credentials");
}

#[tokio::test]
async fn test_login_unknown_email_same_error() {
    let app = test_app();

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/login",
            Some(json!({ "email": "ghost@b.c", "password": "s3cret" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid credentials");
}

#[tokio::test]
async fn test_duplicate_email_conflict() {
    let app = test_app();
    signup(&app, "a@b.c", "s3cret").await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/signup",
            Some(json!({ "email": "A@B.C", "password": "other" })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "email already registered");
}

#[tokio::test]
async fn test_signup_rejects_bad_body() {
    let app = test_app();

    let (status, _) = send(
        &app,
        request(Method::POST, "/signup", Some(json!({ "email": "a@b.c" })), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/signup",
            Some(json!({ "email": "not-an-email", "password": "x" })),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_token_rejected_before_handler() {
    let app = test_app();

    let (status, body) = send(
        &app,
        request(Method::POST, "/events", Some(event_body("Meetup")), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "not authorized");

    // Nothing was created
    let (_, events) = send(&app, request(Method::GET, "/events", None, None)).await;
    assert_eq!(events, json!([]));
}

#[tokio::test]
async fn test_bearer_prefix_accepted() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "a@b.c").await;

    let bearer = format!("Bearer {token}");
    let (status, _) = send(
        &app,
        request(Method::POST, "/events", Some(event_body("Meetup")), Some(&bearer)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = test_app();
    let (user_id, _) = user_with_token(&app, "a@b.c").await;

    let service = TokenService::new(TEST_JWT_SECRET.as_bytes(), Duration::hours(2));
    let expired = service
        .issue_at(user_id, "a@b.c", Utc::now() - Duration::hours(3))
        .unwrap();

    let (status, body) = send(
        &app,
        request(Method::POST, "/events", Some(event_body("Meetup")), Some(&expired)),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "not authorized");
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "a@b.c").await;

    // Change the first signature character
    let (unsigned, signature) = token.rsplit_once('.').unwrap();
    let first = signature.chars().next().unwrap();
    let replacement = if first == 'A' { 'B' } else { 'A' };
    let tampered = format!("{unsigned}.{replacement}{}", &signature[1..]);

    let (status, _) = send(
        &app,
        request(Method::POST, "/events", Some(event_body("Meetup")), Some(&tampered)),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
