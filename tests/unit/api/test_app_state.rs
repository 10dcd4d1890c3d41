// Unit tests for AppState wiring

use eventhub::api::AppState;
use eventhub::auth::audit_logger::AuditLogger;
use eventhub::auth::token::TokenService;
use eventhub::config::Config;
use eventhub::store::{EventStore, MemoryStore, PgStore, RegistrationLedger, UserStore};
use static_assertions::assert_impl_all;

// Required by Axum state and by sharing across tasks
assert_impl_all!(AppState: Clone, Send, Sync);
assert_impl_all!(Config: Send, Sync);
assert_impl_all!(TokenService: Send, Sync);
assert_impl_all!(AuditLogger: Send, Sync);
assert_impl_all!(MemoryStore: EventStore, RegistrationLedger, UserStore, Send, Sync);
assert_impl_all!(PgStore: EventStore, RegistrationLedger, UserStore, Send, Sync);

#[test]
fn test_memory_state_uses_config() {
    let state = AppState::with_memory_store(Config::test_config());

    assert!(state.config.database_url.is_none());
    assert_eq!(state.token_service.ttl().num_seconds(), 2 * 60 * 60);
}

#[tokio::test]
async fn test_memory_state_shares_one_store() {
    let state = AppState::with_memory_store(Config::test_config());

    let user = state
        .users
        .create("a@b.c", eventhub::core::models::PasswordHash::new("hash".to_string()))
        .await
        .unwrap();
    let event = state
        .events
        .create(eventhub::core::models::NewEvent {
            name: "Meetup".to_string(),
            description: "d".to_string(),
            location: "l".to_string(),
            date_time: chrono::Utc::now(),
            user_id: user.id,
        })
        .await
        .unwrap();

    // The ledger sees events created through the event store
    state.registrations.register(event.id, user.id).await.unwrap();
    let registrations = state.registrations.registrations_for_event(event.id).await.unwrap();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].user_id, user.id);
}
