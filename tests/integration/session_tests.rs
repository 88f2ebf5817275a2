//! Session lifecycle over real HTTP

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::Notify;

use library_client::{
    api::{
        auth::{AuthGateway, HttpAuthGateway, ProbeOutcome},
        ApiClient,
    },
    config::ApiConfig,
    models::{Identity, Role, SessionStatus, SessionTrust},
    services::navigation,
    AppError,
};

use crate::support::{client_state, spawn_backend};

#[tokio::test]
async fn test_fresh_client_is_anonymous() {
    let (base_url, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = client_state(&base_url, dir.path());

    let session = state.services.session.bootstrap().await;
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(navigation::visible(&session).is_empty());
}

#[tokio::test]
async fn test_login_and_logout() {
    let (base_url, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let hint_path = dir.path().join("last_identity.json");
    let state = client_state(&base_url, dir.path());
    let sessions = &state.services.session;

    sessions.bootstrap().await;
    let session = sessions.login("librarian_jane", "jane-pw").await.unwrap();
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.trust(), Some(SessionTrust::ServerConfirmed));
    assert!(session.has_role(Role::Librarian));
    assert!(session.has_role(Role::Employee));
    assert!(hint_path.exists());

    sessions.logout().await.unwrap();
    assert_eq!(sessions.status(), SessionStatus::Anonymous);
    assert!(!hint_path.exists());
}

#[tokio::test]
async fn test_wrong_password_leaves_session_alone() {
    let (base_url, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = client_state(&base_url, dir.path());
    let sessions = &state.services.session;

    sessions.bootstrap().await;
    match sessions.login("librarian_jane", "wrong").await {
        Err(AppError::Authentication(reason)) => {
            assert_eq!(reason, "Invalid login credentials")
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
    assert_eq!(sessions.status(), SessionStatus::Anonymous);
    assert!(!dir.path().join("last_identity.json").exists());
}

#[tokio::test]
async fn test_restart_with_unreachable_probe_uses_hint() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();

    let first = client_state(&base_url, dir.path());
    first.services.session.bootstrap().await;
    first
        .services
        .session
        .login("librarian_jane", "jane-pw")
        .await
        .unwrap();

    backend.probe_fails.store(true, Ordering::SeqCst);
    let second = client_state(&base_url, dir.path());
    let session = second.services.session.bootstrap().await;

    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.trust(), Some(SessionTrust::HintReconstructed));
    assert!(session.has_role(Role::Librarian));
    assert!(session.describe().ends_with("[unconfirmed]"));

    // The new process holds no server session, so the backend refuses reads
    match second.services.catalog.list_books().await {
        Err(err @ AppError::Authentication(_)) => {
            assert!(err.user_message().contains("log in again"))
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_restart_with_guest_probe_clears_hint() {
    let (base_url, _backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let hint_path = dir.path().join("last_identity.json");

    let first = client_state(&base_url, dir.path());
    first.services.session.bootstrap().await;
    first
        .services
        .session
        .login("member_bob", "bob-pw")
        .await
        .unwrap();
    assert!(hint_path.exists());

    let second = client_state(&base_url, dir.path());
    let session = second.services.session.bootstrap().await;
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(!hint_path.exists());
}

#[tokio::test]
async fn test_failed_server_logout_still_ends_session() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let state = client_state(&base_url, dir.path());
    let sessions = &state.services.session;

    sessions.bootstrap().await;
    sessions.login("Administrator", "admin-pw").await.unwrap();

    backend.logout_fails.store(true, Ordering::SeqCst);
    assert!(sessions.logout().await.is_err());
    assert_eq!(sessions.status(), SessionStatus::Anonymous);
    assert!(!dir.path().join("last_identity.json").exists());
}

#[tokio::test]
async fn test_sid_from_login_during_logout_survives() {
    let (base_url, backend) = spawn_backend().await;
    let client = ApiClient::new(&ApiConfig {
        base_url,
        timeout_seconds: 5,
        ..ApiConfig::default()
    })
    .unwrap();
    let gateway = Arc::new(HttpAuthGateway::new(client.clone()));
    gateway.login("member_bob", "bob-pw").await.unwrap();

    let gate = Arc::new(Notify::new());
    *backend.logout_gate.lock().unwrap() = Some(gate.clone());
    let logout = tokio::spawn({
        let gateway = gateway.clone();
        async move { gateway.logout().await }
    });
    backend.logout_started.notified().await;

    gateway.login("librarian_jane", "jane-pw").await.unwrap();
    let jane_sid = client.session_cookie();
    assert!(jane_sid.is_some());

    gate.notify_one();
    logout.await.unwrap().unwrap();

    assert_eq!(client.session_cookie(), jane_sid);
    assert_eq!(
        gateway.probe_current_identity().await,
        ProbeOutcome::Identified(Identity::new("librarian_jane"))
    );
}

#[tokio::test]
async fn test_login_waits_out_slow_logout() {
    let (base_url, backend) = spawn_backend().await;
    let dir = tempfile::tempdir().unwrap();
    let hint_path = dir.path().join("last_identity.json");
    let state = client_state(&base_url, dir.path());
    let sessions = state.services.session.clone();

    sessions.bootstrap().await;
    sessions.login("member_bob", "bob-pw").await.unwrap();

    let gate = Arc::new(Notify::new());
    *backend.logout_gate.lock().unwrap() = Some(gate.clone());
    let logout = tokio::spawn({
        let sessions = sessions.clone();
        async move { sessions.logout().await }
    });
    backend.logout_started.notified().await;

    assert!(matches!(
        sessions.login("librarian_jane", "jane-pw").await,
        Err(AppError::LoginInProgress)
    ));

    gate.notify_one();
    logout.await.unwrap().unwrap();
    *backend.logout_gate.lock().unwrap() = None;

    let session = sessions.login("librarian_jane", "jane-pw").await.unwrap();
    assert!(session.has_role(Role::Librarian));
    assert!(hint_path.exists());
    // The transport session of the new login is intact
    assert_eq!(state.services.catalog.list_books().await.unwrap().len(), 2);
}
