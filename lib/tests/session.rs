// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::time::Duration;

use para_bridge::{Config, Environment, Error, ParaHandle, Readiness, SessionState};
use para_bridge_sim::*;

mod helpers;
use helpers::{config, settled, setup, setup_with, EMAIL};

#[tokio::test]
async fn probe_without_session() {
    let (_app, h) = setup(RemoteApp::new(), SimOptions::default()).await;

    assert_eq!(settled(&h).await, SessionState::Inactive);
}

#[tokio::test]
async fn probe_partial_session() {
    let (_app, h) = setup(RemoteApp::with_session(EMAIL, false), SimOptions::default()).await;

    assert_eq!(settled(&h).await, SessionState::Active);
}

#[tokio::test]
async fn probe_logged_in_session() -> anyhow::Result<()> {
    let (_app, h) = setup(RemoteApp::with_session(EMAIL, true), SimOptions::default()).await;

    assert_eq!(settled(&h).await, SessionState::ActiveLoggedIn);
    assert_eq!(h.get_email().await?, EMAIL);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn probe_session_check_fails() {
    let c = Config {
        request_timeout_s: Some(1),
        ..config()
    };
    let opts = SimOptions {
        silent_methods: vec!["isSessionActive".to_string()],
        ..Default::default()
    };
    let (_app, h) = setup_with(c, RemoteApp::with_session(EMAIL, true), opts).await;

    assert_eq!(settled(&h).await, SessionState::Inactive);
    assert_eq!(h.bridge().pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn probe_login_check_fails() {
    let c = Config {
        request_timeout_s: Some(1),
        ..config()
    };
    let opts = SimOptions {
        silent_methods: vec!["isFullyLoggedIn".to_string()],
        ..Default::default()
    };
    let (_app, h) = setup_with(c, RemoteApp::with_session(EMAIL, true), opts).await;

    // An active session with unknown login status stays active
    assert_eq!(settled(&h).await, SessionState::Active);
    assert_eq!(h.bridge().pending_count(), 0);
}

#[tokio::test]
async fn unbounded_request_timeout() -> anyhow::Result<()> {
    let c = Config {
        request_timeout_s: Some(u64::MAX),
        ..config()
    };
    let (_app, h) = setup_with(
        c,
        RemoteApp::with_session(EMAIL, true),
        SimOptions::default(),
    )
    .await;

    assert_eq!(settled(&h).await, SessionState::ActiveLoggedIn);
    assert_eq!(h.get_email().await?, EMAIL);

    Ok(())
}

#[tokio::test]
async fn load_failure() {
    let opts = SimOptions {
        load_failure: Some("net::ERR_NAME_NOT_RESOLVED".to_string()),
        ..Default::default()
    };
    let (_app, h) = setup(RemoteApp::with_session(EMAIL, true), opts).await;

    assert_eq!(settled(&h).await, SessionState::Inactive);
    assert_eq!(h.bridge().readiness(), Readiness::Failed);
    assert!(h
        .bridge()
        .last_error()
        .unwrap()
        .contains("ERR_NAME_NOT_RESOLVED"));

    assert!(matches!(h.ensure_ready().await, Err(Error::NotReady)));
    assert!(matches!(
        h.check_user_exists(EMAIL).await,
        Err(Error::NotReady)
    ));

    // Nothing reaches the page once failed
    assert!(h.bridge().host().invocations().is_empty());
}

#[tokio::test]
async fn init_rejected() {
    let opts = SimOptions {
        reject_scripts: true,
        ..Default::default()
    };
    let (_app, h) = setup(RemoteApp::new(), opts).await;

    assert_eq!(settled(&h).await, SessionState::Inactive);
    assert_eq!(h.bridge().readiness(), Readiness::Failed);
}

#[tokio::test(start_paused = true)]
async fn startup_timeout() {
    let opts = SimOptions {
        ack_init: false,
        ..Default::default()
    };
    let (_app, h) = setup(RemoteApp::with_session(EMAIL, true), opts).await;

    let start = tokio::time::Instant::now();

    assert_eq!(settled(&h).await, SessionState::Inactive);
    assert!(start.elapsed() >= Duration::from_secs(30));
    assert_eq!(h.bridge().readiness(), Readiness::NotReady);

    assert!(matches!(h.ensure_ready().await, Err(Error::NotReady)));
}

#[tokio::test]
async fn missing_api_key() {
    let app = std::sync::Arc::new(RemoteApp::new());
    let c = Config::new(Environment::Sandbox, " ");

    let r = ParaHandle::new(c, SimHost::new(app));
    assert!(matches!(r, Err(Error::MissingApiKey)));
}

#[tokio::test]
async fn start_once() {
    let (_app, h) = setup(RemoteApp::new(), SimOptions::default()).await;

    assert!(matches!(h.start().await, Err(Error::AlreadyInitialised)));
    assert_eq!(settled(&h).await, SessionState::Inactive);
}

#[tokio::test]
async fn dev_environment() {
    let app = std::sync::Arc::new(RemoteApp::new());
    let c = Config {
        environment: "dev".parse().unwrap(),
        ..config()
    };

    let h = ParaHandle::connect(c, SimHost::new(app.clone())).await.unwrap();
    h.ensure_ready().await.unwrap();

    assert_eq!(app.init_args().unwrap().environment, "DEV");
    assert_eq!(h.config().environment.relying_party_id(), "localhost");
}
