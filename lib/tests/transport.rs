// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::{collections::HashSet, time::Duration};

use futures::future::join_all;

use para_bridge::{Config, Error, ParaHandle};
use para_bridge_sim::*;

mod helpers;
use helpers::{config, setup, setup_logging, setup_ready, EMAIL};

#[tokio::test]
async fn concurrent_requests() {
    let opts = SimOptions {
        response_delay: Duration::from_millis(5),
        ..Default::default()
    };
    let (_app, h) = setup(RemoteApp::new(), opts).await;
    h.ensure_ready().await.unwrap();

    let emails: Vec<_> = (0..32).map(|i| format!("user{i}@example.com")).collect();
    let results = join_all(emails.iter().map(|e| h.check_user_exists(e))).await;

    for r in results {
        assert!(!r.unwrap());
    }
    assert_eq!(h.bridge().pending_count(), 0);

    // Every request carried a distinct id
    let ids: HashSet<_> = h
        .bridge()
        .host()
        .invocations()
        .into_iter()
        .filter(|m| m.method_name == "checkIfUserExists")
        .map(|m| m.request_id)
        .collect();
    assert_eq!(ids.len(), 32);
}

#[tokio::test(start_paused = true)]
async fn request_timeout() {
    setup_logging();

    let app = std::sync::Arc::new(RemoteApp::with_session(EMAIL, true));
    let host = SimHost::with_options(
        app,
        SimOptions {
            silent_methods: vec!["exportSession".to_string()],
            ..Default::default()
        },
    );
    let c = Config {
        request_timeout_s: Some(5),
        ..config()
    };

    let h = ParaHandle::connect(c, host).await.unwrap();
    h.ensure_ready().await.unwrap();

    let start = tokio::time::Instant::now();

    match h.export_session().await {
        Err(Error::Timeout { method, timeout }) => {
            assert_eq!(method, "exportSession");
            assert_eq!(timeout, Duration::from_secs(5));
        }
        r => panic!("unexpected result: {r:?}"),
    }

    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(h.bridge().pending_count(), 0);

    // Other methods are unaffected
    assert!(h.is_session_active().await.unwrap());
}

#[tokio::test]
async fn remote_errors() {
    let (_app, h) = setup_ready().await;

    // Unknown methods are reported by the application
    let r = h.bridge().call("mintMoney", &[1, 2, 3]).await;
    match r {
        Err(Error::Remote(e)) => assert_eq!(e, "unknown method: mintMoney"),
        r => panic!("unexpected result: {r:?}"),
    }

    // Arguments must encode as an array
    let r = h.bridge().call("getEmail", &EMAIL).await;
    assert!(matches!(r, Err(Error::Serialization(_))), "{r:?}");

    assert_eq!(h.bridge().pending_count(), 0);
}

#[tokio::test]
async fn shared_handles() {
    let (_app, h) = setup_ready().await;
    let passkeys = SimPasskeys::new();

    let h2: ParaHandle<SimHost> = h.clone();

    h.create_user(EMAIL).await.unwrap();
    let biometrics_id = h2.verify(VERIFICATION_CODE).await.unwrap();
    h2.generate_passkey(EMAIL, &biometrics_id, &passkeys)
        .await
        .unwrap();

    h2.create_wallet(para_bridge::WalletType::Evm, true)
        .await
        .unwrap();

    // Session state is shared between clones
    assert_eq!(h.session().wallets().len(), 1);
}
