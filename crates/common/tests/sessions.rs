//! Integration tests for file-backed sessions and flash messages

mod common;

use ::common::prelude::*;
use ::common::session::{sha256_hex, PLAINTEXT_PASSWORD_ADVISORY};

#[tokio::test]
async fn test_session_lifecycle() {
    let site = common::setup_site();
    let store = SessionStore::new(site.layout.clone());
    let hashed = sha256_hex("correct horse");

    // Log in with the right password
    let outcome = store
        .login("correct horse", Some(hashed.as_str()))
        .await
        .unwrap();
    assert!(outcome.advisory.is_none());
    let token = outcome.session.token.clone();
    assert!(token.len() >= 20);
    assert!(site.path(&format!("tmp/{}.session", token)).exists());

    // The token validates until logout
    let session = store.validate(&token).await.unwrap();
    assert_eq!(session.token, token);

    // Pending flash goes away with the session
    store
        .flash()
        .set(&session, "hello", Severity::Info)
        .await
        .unwrap();
    store.logout(&token).await.unwrap();
    assert!(store.validate(&token).await.is_none());
    assert!(common::file_names(&site.layout.work_dir()).is_empty());

    // Logging out again is harmless
    store.logout(&token).await.unwrap();
}

#[tokio::test]
async fn test_bad_credentials_create_nothing() {
    let site = common::setup_site();
    let store = SessionStore::new(site.layout.clone());

    let err = store
        .login("guess", Some(sha256_hex("secret").as_str()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadCredentials);

    let err = store.login("guess", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);

    assert!(common::file_names(&site.layout.work_dir()).is_empty());
}

#[tokio::test]
async fn test_plaintext_password_logs_in_with_advisory() {
    let site = common::setup_site();
    let store = SessionStore::new(site.layout.clone());

    let outcome = store.login("hunter2", Some("hunter2")).await.unwrap();
    assert_eq!(outcome.advisory.as_deref(), Some(PLAINTEXT_PASSWORD_ADVISORY));

    // The advisory is waiting as the session's first flash, exactly once
    let flash = store.flash().take(&outcome.session).await.unwrap().unwrap();
    assert_eq!(flash.severity, Severity::Warning);
    assert_eq!(flash.text, PLAINTEXT_PASSWORD_ADVISORY);
    assert!(store.flash().take(&outcome.session).await.unwrap().is_none());
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let site = common::setup_site();
    let store = SessionStore::new(site.layout.clone());
    let hashed = sha256_hex("pw");

    let a = store.login("pw", Some(hashed.as_str())).await.unwrap().session;
    let b = store.login("pw", Some(hashed.as_str())).await.unwrap().session;
    assert_ne!(a.token, b.token);

    store.flash().set(&a, "for a", Severity::Success).await.unwrap();
    assert!(store.flash().take(&b).await.unwrap().is_none());

    store.logout(&a.token).await.unwrap();
    assert!(store.validate(&b.token).await.is_some());
}
