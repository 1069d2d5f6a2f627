mod common;

use std::sync::Arc;

use igazolas::api::{ApiHttpClient, AuthErrorHandler, Backend, Credentials};
use igazolas::config::ClientConfig;
use igazolas::db::LocalStore;
use igazolas::error::ErrorKind;
use igazolas::models::{Role, Theme};
use igazolas::session::{LogoutOnAuthError, Session};

fn client_with_logout(mock: &common::MockBackend, credentials: &Credentials) -> ApiHttpClient {
    let config = ClientConfig::new(mock.url());
    ApiHttpClient::new(&config, credentials.clone())
        .expect("client")
        .with_auth_error_handler(Arc::new(LogoutOnAuthError::new(credentials.clone())))
}

#[tokio::test]
async fn test_login_persists_token_and_loads_profile() {
    let mock = common::spawn_mock().await;
    let store = LocalStore::in_memory().await.expect("store");
    store.set_theme(Theme::Dark).await.expect("theme");
    let credentials = Credentials::default();
    let client = client_with_logout(&mock, &credentials);

    let session = Session::login(common::GOOD_TOKEN, credentials.clone(), &client, &store)
        .await
        .expect("login");
    assert_eq!(session.role(), Role::Student);
    assert_eq!(session.student_class().map(|c| c.id), Some(5));
    assert_eq!(session.theme(), Theme::Dark);
    assert!(!session.can_review());
    assert!(!session.is_admin());
    assert!(session.is_active());
    assert_eq!(store.auth_token().await.expect("token").as_deref(), Some(common::GOOD_TOKEN));

    session.logout(&store).await.expect("logout");
    assert!(!session.is_active());
    assert_eq!(credentials.token(), None);
    assert_eq!(store.auth_token().await.expect("token"), None);
}

#[tokio::test]
async fn test_rejected_token_is_not_persisted() {
    let mock = common::spawn_mock().await;
    let store = LocalStore::in_memory().await.expect("store");
    store.set_auth_token("stale").await.expect("seed");
    let credentials = Credentials::default();
    let client = client_with_logout(&mock, &credentials);

    let err = Session::resume(credentials.clone(), &client, &store)
        .await
        .expect_err("stale token");
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(!credentials.is_present());
    assert_eq!(store.auth_token().await.expect("token"), None);
}

#[tokio::test]
async fn test_resume_without_stored_token() {
    let mock = common::spawn_mock().await;
    let store = LocalStore::in_memory().await.expect("store");
    let credentials = Credentials::default();
    let client = client_with_logout(&mock, &credentials);

    let session = Session::resume(credentials, &client, &store).await.expect("resume");
    assert!(session.is_none());
}

#[tokio::test]
async fn test_auth_error_mid_session_deactivates_it() {
    let mock = common::spawn_mock().await;
    let store = LocalStore::in_memory().await.expect("store");
    let credentials = Credentials::default();
    let client = client_with_logout(&mock, &credentials);

    let session = Session::login(common::GOOD_TOKEN, credentials.clone(), &client, &store)
        .await
        .expect("login");

    // the backend revokes the token
    LogoutOnAuthError::new(credentials.clone()).on_auth_error(401);
    assert!(!session.is_active());

    let err = client.fetch_profile().await.expect_err("no token left");
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_empty_token_is_a_validation_error() {
    let mock = common::spawn_mock().await;
    let store = LocalStore::in_memory().await.expect("store");
    let client = mock.client(Credentials::default());

    let err = Session::login("  ", Credentials::default(), &client, &store)
        .await
        .expect_err("empty token");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_auth_error_clears_stored_token() {
    let mock = common::spawn_mock().await;
    let store = LocalStore::in_memory().await.expect("store");
    let credentials = Credentials::default();
    let config = ClientConfig::new(mock.url());
    let client = ApiHttpClient::new(&config, credentials.clone())
        .expect("client")
        .with_auth_error_handler(Arc::new(
            LogoutOnAuthError::new(credentials.clone()).with_store(store.clone()),
        ));

    let session = Session::login(common::GOOD_TOKEN, credentials.clone(), &client, &store)
        .await
        .expect("login");
    assert!(store.auth_token().await.expect("token").is_some());

    // token revoked server-side
    credentials.set("revoked");
    let err = client.fetch_profile().await.expect_err("revoked token");
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(!session.is_active());

    let mut cleared = false;
    for _ in 0..100 {
        if store.auth_token().await.expect("token").is_none() {
            cleared = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(cleared, "stored token should be removed after an auth error");
}

#[tokio::test]
async fn test_session_debug_output_names_profile() {
    let mock = common::spawn_mock().await;
    let store = LocalStore::in_memory().await.expect("store");
    let credentials = Credentials::default();
    let client = client_with_logout(&mock, &credentials);

    let session = Session::login(common::GOOD_TOKEN, credentials, &client, &store)
        .await
        .expect("login");
    assert!(format!("{:?}", session).contains("Session"));
}
