// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol definitions for communication with the hosted Para application
//!
//! The native client talks to a remotely-hosted JavaScript application through a
//! script host (an embedded web view). Requests travel as JSON objects posted into the
//! page by evaluating `window.postMessage(...)`, responses come back out-of-band through
//! the host's message handler.
//!
//! ## Outbound (native -> page)
//!
//! ```text
//! { "messageType": "Capsule#init", "arguments": { environment, apiKey, platform, package } }
//! { "messageType": "Capsule#invokeMethod", "methodName": "...", "arguments": [...], "requestId": "..." }
//! ```
//!
//! ## Inbound (page -> native)
//!
//! ```text
//! { "method": "...", "requestId": "...", "responseData": ..., "error": "..." }
//! ```
//!
//! An inbound message with `method == "Capsule#init"` and no `requestId` signals that
//! the application has completed its own initialisation.

pub mod inbound;
pub use inbound::{Inbound, InboundKind};

pub mod outbound;
pub use outbound::{InitArgs, InvokeMethod, Outbound};

/// Namespace prefixed to reserved bridge message types
pub const BRIDGE_NAMESPACE: &str = "Capsule";

/// Message type / method for the initialisation handshake
pub const INIT_MESSAGE: &str = "Capsule#init";

/// Message type for method invocations
pub const INVOKE_MESSAGE: &str = "Capsule#invokeMethod";

/// Name of the host message handler the page posts responses to
pub const CALLBACK_HANDLER: &str = "callback";

/// Protocol encoding / decoding errors
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// Payload could not be encoded as JSON
    #[error("JSON encoding failed: {0}")]
    Encode(serde_json::Error),

    /// Script did not contain a bridge payload
    #[error("Script is not a bridge message")]
    NotBridgeScript,

    /// Payload did not match the expected schema
    #[error("Malformed message: {0}")]
    Malformed(String),
}
