// Registration ledger over HTTP

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::common::*;

#[tokio::test]
async fn test_register_once() {
    let app = test_app();
    let (_, owner) = user_with_token(&app, "owner@b.c").await;
    let (_, guest) = user_with_token(&app, "guest@b.c").await;
    let id = create_event(&app, &owner, event_body("Meetup")).await;
    let uri = format!("/events/{id}/register");

    let (status, body) = send(&app, request(Method::POST, &uri, None, Some(&guest))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "registered successfully");

    let (status, body) = send(&app, request(Method::POST, &uri, None, Some(&guest))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "already registered for this event");
}

#[tokio::test]
async fn test_register_missing_event_404() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "guest@b.c").await;

    let (status, _) = send(
        &app,
        request(Method::POST, "/events/404/register", None, Some(&token)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_requires_token() {
    let app = test_app();
    let (_, owner) = user_with_token(&app, "owner@b.c").await;
    let id = create_event(&app, &owner, event_body("Meetup")).await;

    let (status, _) = send(
        &app,
        request(Method::POST, &format!("/events/{id}/register"), None, None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let app = test_app();
    let (_, owner) = user_with_token(&app, "owner@b.c").await;
    let (_, guest) = user_with_token(&app, "guest@b.c").await;
    let id = create_event(&app, &owner, event_body("Meetup")).await;
    let uri = format!("/events/{id}/register");

    // Never registered
    let (status, body) = send(&app, request(Method::DELETE, &uri, None, Some(&guest))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "unregistered successfully");

    send(&app, request(Method::POST, &uri, None, Some(&guest))).await;
    let (status, _) = send(&app, request(Method::DELETE, &uri, None, Some(&guest))).await;
    assert_eq!(status, StatusCode::OK);

    // Can register again after cancelling
    let (status, _) = send(&app, request(Method::POST, &uri, None, Some(&guest))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_owner_lists_registrations() {
    let app = test_app();
    let (_, owner) = user_with_token(&app, "owner@b.c").await;
    let (guest_id, guest) = user_with_token(&app, "guest@b.c").await;
    let id = create_event(&app, &owner, event_body("Meetup")).await;
    send(
        &app,
        request(Method::POST, &format!("/events/{id}/register"), None, Some(&guest)),
    )
    .await;

    let uri = format!("/events/{id}/registrations");
    let (status, list) = send(&app, request(Method::GET, &uri, None, Some(&owner))).await;
    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap().clone();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["eventId"], id);
    assert_eq!(list[0]["userId"], guest_id);

    // Guests may not see the list
    let (status, _) = send(&app, request(Method::GET, &uri, None, Some(&guest))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_event_removes_registrations() {
    let app = test_app();
    let (_, owner) = user_with_token(&app, "owner@b.c").await;
    let (_, guest) = user_with_token(&app, "guest@b.c").await;
    let id = create_event(&app, &owner, event_body("Meetup")).await;
    send(
        &app,
        request(Method::POST, &format!("/events/{id}/register"), None, Some(&guest)),
    )
    .await;

    let (status, _) = send(
        &app,
        request(Method::DELETE, &format!("/events/{id}"), None, Some(&owner)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A new event never inherits the old registrations
    let new_id = create_event(&app, &owner, event_body("Next")).await;
    let (_, list) = send(
        &app,
        request(
            Method::GET,
            &format!("/events/{new_id}/registrations"),
            None,
            Some(&owner),
        ),
    )
    .await;
    assert_eq!(list, json!([]));

    let (status, _) = send(
        &app,
        request(Method::POST, &format!("/events/{id}/register"), None, Some(&guest)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
