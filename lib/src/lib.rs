// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Para bridge client library
//!
//! Drives a remote Para application hosted within a script host (web view),
//! correlating requests and responses over the message bridge and exposing
//! typed authentication, wallet and signing APIs.
//!
//! A [ParaHandle] is created over a [ScriptHost] implementation, see
//! `para-bridge-sim` for a simulated host.

pub mod bridge;
pub use bridge::{Bridge, Delivery, Readiness, DEFAULT_REQUEST_TIMEOUT};

pub mod config;
pub use config::{Config, Environment};

pub mod decode;

mod error;
pub use error::Error;

pub mod host;
pub use host::{EventSender, HostEvent, ScriptHost};

mod handle;
pub use handle::{ParaHandle, STARTUP_TIMEOUT};

pub mod oauth;
pub use oauth::OAuthProvider;

pub mod passkey;
pub use passkey::{OAuthSession, PasskeyAssertion, PasskeyProvider, PasskeyRegistration};

pub mod session;
pub use session::{SessionState, SessionStore};

pub mod signer;
pub use signer::{EvmSigner, EvmTransaction};

pub mod wallet;
pub use wallet::{WalletRecord, WalletType};

/// Re-export `para-bridge-proto` for consumers
pub use para_bridge_proto::{self as proto};
