// Event CRUD, ownership and search over HTTP

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_create_and_get_event() {
    let app = test_app();
    let (user_id, token) = user_with_token(&app, "owner@b.c").await;

    let mut body = event_body("Meetup");
    // Owner in the body is ignored
    body["userId"] = json!(999);
    let id = create_event(&app, &token, body).await;

    let (status, event) = send(&app, request(Method::GET, &format!("/events/{id}"), None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["id"], id);
    assert_eq!(event["name"], "Meetup");
    assert_eq!(event["userId"], user_id);
    let date: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(event["dateTime"].clone()).unwrap();
    assert_eq!(date.to_rfc3339(), "2025-01-01T15:30:00+00:00");
}

#[tokio::test]
async fn test_list_events() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "owner@b.c").await;
    create_event(&app, &token, event_body("One")).await;
    create_event(&app, &token, event_body("Two")).await;

    let (status, events) = send(&app, request(Method::GET, "/events", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_get_missing_event_404() {
    let app = test_app();
    let (status, body) = send(&app, request(Method::GET, "/events/42", None, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "event not found");
}

#[tokio::test]
async fn test_non_numeric_id_400() {
    let app = test_app();
    let (status, body) = send(&app, request(Method::GET, "/events/abc", None, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "could not parse event id");
}

#[tokio::test]
async fn test_create_rejects_missing_fields() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "owner@b.c").await;

    let mut body = event_body("Meetup");
    body["name"] = json!("   ");
    let (status, response) = send(&app, request(Method::POST, "/events", Some(body), Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "name is required");

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/events",
            Some(json!({ "name": "x", "description": "d", "location": "l" })),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, events) = send(&app, request(Method::GET, "/events", None, None)).await;
    assert_eq!(events, json!([]));
}

#[tokio::test]
async fn test_owner_can_update() {
    let app = test_app();
    let (user_id, token) = user_with_token(&app, "owner@b.c").await;
    let id = create_event(&app, &token, event_body("Meetup")).await;

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            &format!("/events/{id}"),
            Some(event_body("Renamed")),
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["name"], "Renamed");
    assert_eq!(body["event"]["id"], id);
    assert_eq!(body["event"]["userId"], user_id);
}

#[tokio::test]
async fn test_non_owner_cannot_update() {
    let app = test_app();
    let (_, owner) = user_with_token(&app, "owner@b.c").await;
    let (_, other) = user_with_token(&app, "other@b.c").await;
    let id = create_event(&app, &owner, event_body("Meetup")).await;

    let (status, _) = send(
        &app,
        request(
            Method::PUT,
            &format!("/events/{id}"),
            Some(event_body("Hijacked")),
            Some(&other),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, event) = send(&app, request(Method::GET, &format!("/events/{id}"), None, None)).await;
    assert_eq!(event["name"], "Meetup");
}

#[tokio::test]
async fn test_update_missing_event_404() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "owner@b.c").await;

    let (status, _) = send(
        &app,
        request(Method::PUT, "/events/77", Some(event_body("x")), Some(&token)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_owner_cannot_delete() {
    let app = test_app();
    let (_, owner) = user_with_token(&app, "owner@b.c").await;
    let (_, other) = user_with_token(&app, "other@b.c").await;
    let id = create_event(&app, &owner, event_body("Meetup")).await;

    let (status, _) = send(
        &app,
        request(Method::DELETE, &format!("/events/{id}"), None, Some(&other)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request(Method::GET, &format!("/events/{id}"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_can_delete() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "owner@b.c").await;
    let id = create_event(&app, &token, event_body("Meetup")).await;

    let (status, body) = send(
        &app,
        request(Method::DELETE, &format!("/events/{id}"), None, Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "event deleted successfully");

    let (status, _) = send(&app, request(Method::GET, &format!("/events/{id}"), None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "owner@b.c").await;
    create_event(&app, &token, event_body("Go Meetup")).await;
    let mut other = event_body("Book club");
    other["description"] = json!("Reading");
    other["location"] = json!("Hamburg");
    create_event(&app, &token, other).await;

    let (status, found) = send(&app, request(Method::POST, "/events/search/meet", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let found = found.as_array().unwrap().clone();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Go Meetup");

    let (status, none) = send(&app, request(Method::POST, "/events/search/xyz", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn test_undecodable_search_term_is_json_400() {
    let app = test_app();
    let mut req = request(Method::POST, "/events/search/%FF", None, None);
    req.headers_mut()
        .insert("x-request-id", "req-search".parse().unwrap());

    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "could not parse search term");
    assert_eq!(body["request_id"], "req-search");
}
