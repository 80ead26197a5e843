// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Simulated script host for Para bridge clients
//!
//! [SimHost] implements [para_bridge::ScriptHost] over an in-memory
//! [RemoteApp], providing deterministic behaviour with configurable
//! latency and fault injection for tests and the `para-bridge-sim` CLI.

mod app;
pub use app::{RemoteApp, VERIFICATION_CODE};

mod error;
pub use error::SimError;

mod host;
pub use host::{SimHost, SimOptions};

mod passkeys;
pub use passkeys::{SimOAuth, SimPasskeys};
