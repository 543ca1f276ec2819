//! Auth session tests
//! Drives startup, login, register, logout and account operations end to end
//! against a stub server
//!
//! Run with: cargo test --test auth_session_tests

use kayd::api::{NewUser, UserPatch};
use kayd::auth::{AuthSession, PasswordChangeForm, RegistrationForm, SessionState};
use kayd::config::ApiConfig;
use kayd::error::Error;
use kayd::session::{FileStorage, MemoryStorage, SessionStore, Token};
use kayd::ApiClient;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(server: &MockServer, store: SessionStore) -> AuthSession {
    let config = ApiConfig {
        base_url: format!("{}/api", server.uri()),
        timeout_secs: 5,
    };
    let api = ApiClient::new(&config, store).expect("client should build");
    AuthSession::new(api)
}

fn memory_store() -> SessionStore {
    SessionStore::new(MemoryStorage::new())
}

async fn mock_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok1",
            "user": {"id": "u1", "username": "alice"}
        })))
        .mount(server)
        .await;
}

async fn signed_in(server: &MockServer, store: SessionStore) -> AuthSession {
    mock_login_ok(server).await;
    let session = session_for(server, store);
    session.login("555-0100", "secret").await.unwrap();
    session
}

// ============================================================================
// Startup
// ============================================================================

#[tokio::test]
async fn test_start_without_token_is_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server, memory_store());
    assert_eq!(session.state(), SessionState::Unknown);

    let state = session.start().await;
    assert_eq!(state, SessionState::Anonymous);
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn test_start_restores_stored_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("Authorization", "Bearer tok1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"_id": "u1", "username": "alice"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = SessionStore::new(FileStorage::new(dir.path().join("session.json")));
    store.set(&Token::from("tok1")).await.unwrap();

    let session = session_for(&server, store);
    session.start().await;

    assert!(session.state().is_authenticated());
    assert_eq!(session.current_user().unwrap().username, "alice");
}

#[tokio::test]
async fn test_start_with_rejected_token_clears_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&server)
        .await;

    let store = memory_store();
    store.set(&Token::from("stale")).await.unwrap();
    let session = session_for(&server, store.clone());

    assert_eq!(session.start().await, SessionState::Anonymous);
    assert_eq!(
        session.error().as_deref(),
        Some("Failed to load user data. Please log in again.")
    );
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn test_start_server_failure_keeps_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = memory_store();
    store.set(&Token::from("tok1")).await.unwrap();
    let session = session_for(&server, store.clone());

    assert_eq!(session.start().await, SessionState::Anonymous);
    assert!(session.error().is_some());
    assert_eq!(store.get().await.unwrap(), Some(Token::from("tok1")));
}

// ============================================================================
// Login and register
// ============================================================================

#[tokio::test]
async fn test_login_stores_token_and_user() {
    let server = MockServer::start().await;
    let store = memory_store();
    let session = signed_in(&server, store.clone()).await;

    assert_eq!(store.get().await.unwrap(), Some(Token::from("tok1")));
    let user = session.current_user().unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.username, "alice");
    assert_eq!(session.error(), None);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_login_token_used_by_next_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/books"))
        .and(header("Authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let session = signed_in(&server, memory_store()).await;
    session.api().fetch_books().await.unwrap();
}

#[tokio::test]
async fn test_login_failure_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let store = memory_store();
    let session = session_for(&server, store.clone());
    session.start().await;

    let err = session.login("555-0100", "wrong").await.unwrap_err();
    assert!(err.is_auth_rejection());
    assert_eq!(session.error().as_deref(), Some("Invalid credentials"));
    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn test_login_failure_without_message_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = session_for(&server, memory_store());
    session.start().await;

    assert!(session.login("555-0100", "secret").await.is_err());
    assert_eq!(
        session.error().as_deref(),
        Some("Login failed. Please try again.")
    );
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let server = MockServer::start().await;
    let store = memory_store();
    let session = signed_in(&server, store.clone()).await;

    server.reset().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Nope"})))
        .mount(&server)
        .await;

    assert!(session.login("555-0199", "wrong").await.is_err());
    assert_eq!(session.current_user().unwrap().id, "u1");
    assert_eq!(store.get().await.unwrap(), Some(Token::from("tok1")));
}

#[tokio::test]
async fn test_register_signs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "tok2",
            "user": {"_id": "u2", "username": "bob"}
        })))
        .mount(&server)
        .await;

    let store = memory_store();
    let session = session_for(&server, store.clone());

    let user = session
        .register(&NewUser {
            username: "bob".to_string(),
            phone: "555-0101".to_string(),
            password: "pw".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, "u2");
    assert!(session.state().is_authenticated());
    assert_eq!(store.get().await.unwrap(), Some(Token::from("tok2")));
}

#[tokio::test]
async fn test_register_failure_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"message": "Phone number already registered"})),
        )
        .mount(&server)
        .await;

    let session = session_for(&server, memory_store());
    session.start().await;

    let form = RegistrationForm {
        username: "bob".to_string(),
        phone: "555-0101".to_string(),
        password: "pw".to_string(),
        confirm_password: "pw".to_string(),
    };
    assert!(session.register_with_confirmation(&form).await.is_err());
    assert_eq!(
        session.error().as_deref(),
        Some("Phone number already registered")
    );
    assert!(!session.state().is_authenticated());
}

#[tokio::test]
async fn test_password_mismatch_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server, memory_store());
    session.start().await;

    let form = RegistrationForm {
        username: "bob".to_string(),
        phone: "555-0101".to_string(),
        password: "pw1".to_string(),
        confirm_password: "pw2".to_string(),
    };
    let err = session.register_with_confirmation(&form).await.unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(session.error().as_deref(), Some("Passwords don't match"));
    assert_eq!(session.state(), SessionState::Anonymous);
}

// ============================================================================
// Logout
// ============================================================================

#[tokio::test]
async fn test_login_then_logout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("Authorization", "Bearer tok1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = memory_store();
    let session = signed_in(&server, store.clone()).await;

    session.logout().await.unwrap();

    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(session.current_user(), None);
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn test_logout_server_failure_still_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = memory_store();
    let session = signed_in(&server, store.clone()).await;

    session.logout().await.unwrap();

    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn test_logout_when_anonymous_is_harmless() {
    let server = MockServer::start().await;
    let session = session_for(&server, memory_store());
    session.start().await;

    session.logout().await.unwrap();
    assert_eq!(session.state(), SessionState::Anonymous);
}

// ============================================================================
// Observation and cancellation
// ============================================================================

#[tokio::test]
async fn test_subscriber_sees_sign_in() {
    let server = MockServer::start().await;
    mock_login_ok(&server).await;
    let session = session_for(&server, memory_store());
    let mut rx = session.subscribe();

    session.login("555-0100", "secret").await.unwrap();

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert!(snapshot.state.is_authenticated());
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn test_clear_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = session_for(&server, memory_store());
    assert!(session.login("555-0100", "wrong").await.is_err());
    assert!(session.error().is_some());

    session.clear_error();
    assert_eq!(session.error(), None);
}

#[tokio::test]
async fn test_abandoned_login_does_not_stay_loading() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "tok1", "user": {"id": "u1", "username": "alice"}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let store = memory_store();
    let session = session_for(&server, store.clone());
    session.start().await;

    let outcome = tokio::time::timeout(
        Duration::from_millis(200),
        session.login("555-0100", "secret"),
    )
    .await;

    assert!(outcome.is_err(), "login should still have been in flight");
    assert!(!session.is_loading());
    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(store.get().await.unwrap(), None);
}

// ============================================================================
// Account operations
// ============================================================================

#[tokio::test]
async fn test_update_profile_replaces_current_user() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "u1", "username": "alicia", "phone": "555-0100"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = signed_in(&server, memory_store()).await;
    let patch = UserPatch {
        username: Some("alicia".to_string()),
        ..Default::default()
    };

    let updated = session.update_profile(&patch).await.unwrap();
    assert_eq!(updated.username, "alicia");
    assert_eq!(session.current_user().unwrap().username, "alicia");
}

#[tokio::test]
async fn test_empty_profile_update_rejected() {
    let server = MockServer::start().await;
    let session = signed_in(&server, memory_store()).await;

    let err = session.update_profile(&UserPatch::default()).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(session.error().as_deref(), Some("Nothing to update"));
}

#[tokio::test]
async fn test_account_operations_require_sign_in() {
    let server = MockServer::start().await;
    let session = session_for(&server, memory_store());
    session.start().await;

    let patch = UserPatch {
        username: Some("x".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        session.update_profile(&patch).await,
        Err(Error::NotAuthenticated)
    ));
    assert!(matches!(
        session.delete_account().await,
        Err(Error::NotAuthenticated)
    ));
    assert!(matches!(
        session.refresh_profile().await,
        Err(Error::NotAuthenticated)
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_change_password_mismatch_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/users/u1/change-password"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = signed_in(&server, memory_store()).await;
    let form = PasswordChangeForm {
        current_password: "old".to_string(),
        new_password: "new1".to_string(),
        confirm_password: "new2".to_string(),
    };

    assert!(session.change_password(&form).await.is_err());
    assert_eq!(
        session.error().as_deref(),
        Some("New passwords do not match")
    );
}

#[tokio::test]
async fn test_delete_account_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/users/u1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let store = memory_store();
    let session = signed_in(&server, store.clone()).await;

    session.delete_account().await.unwrap();

    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn test_refresh_profile_updates_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "u1", "username": "alice", "booksRead": 12, "currentlyReading": 2
        })))
        .mount(&server)
        .await;

    let session = signed_in(&server, memory_store()).await;
    let profile = session.refresh_profile().await.unwrap();

    assert_eq!(profile.books_read, Some(12));
    assert_eq!(session.current_user().unwrap().currently_reading, Some(2));
}
