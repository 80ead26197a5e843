// Copyright (c) 2022-2023 The MobileCoin Foundation

#![allow(unused)]

use std::{str::FromStr, sync::Arc};

use log::LevelFilter;
use simplelog::SimpleLogger;

use para_bridge::{Config, Environment, ParaHandle, SessionState};
use para_bridge_sim::*;

pub const EMAIL: &str = "test@example.com";

/// Setup logging with the level from `LOG_LEVEL`
pub fn setup_logging() {
    let log_level = match std::env::var("LOG_LEVEL").map(|v| LevelFilter::from_str(&v)) {
        Ok(Ok(l)) => l,
        _ => LevelFilter::Debug,
    };

    let _ = SimpleLogger::init(log_level, simplelog::Config::default());
}

/// Test configuration for the sandbox environment
pub fn config() -> Config {
    Config {
        deeplink_url: Some("com.example.app".to_string()),
        ..Config::new(Environment::Sandbox, "test-api-key")
    }
}

/// Setup a simulated application and connected handle
pub async fn setup(app: RemoteApp, opts: SimOptions) -> (Arc<RemoteApp>, ParaHandle<SimHost>) {
    setup_with(config(), app, opts).await
}

/// Setup a simulated application and handle connected with `config`
pub async fn setup_with(
    config: Config,
    app: RemoteApp,
    opts: SimOptions,
) -> (Arc<RemoteApp>, ParaHandle<SimHost>) {
    setup_logging();

    let app = Arc::new(app);
    let host = SimHost::with_options(app.clone(), opts);

    let h = ParaHandle::connect(config, host)
        .await
        .expect("Failed to connect bridge");

    (app, h)
}

/// Setup with default options, waiting for the session probe to complete
pub async fn setup_ready() -> (Arc<RemoteApp>, ParaHandle<SimHost>) {
    let (app, h) = setup(RemoteApp::new(), SimOptions::default()).await;

    h.ensure_ready().await.expect("Bridge not ready");
    settled(&h).await;

    (app, h)
}

/// Wait for the startup session probe to settle
pub async fn settled(h: &ParaHandle<SimHost>) -> SessionState {
    let mut rx = h.session().subscribe_state();

    let s = rx
        .wait_for(|s| *s != SessionState::Unknown)
        .await
        .expect("Session store dropped");

    let state = *s;
    state
}
