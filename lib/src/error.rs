// Copyright (c) 2022-2023 The MobileCoin Foundation

use core::fmt::Debug;
use std::{fmt::Display, time::Duration};

use para_bridge_proto::ProtoError;

use crate::decode::Expected;

/// Para bridge API Error Type, generic over the script host error
#[derive(Debug, thiserror::Error)]
pub enum Error<E: Display + Debug> {
    /// Request attempted before the application signalled readiness
    #[error("Bridge is not ready to accept requests")]
    NotReady,

    /// Bridge initialisation already started
    #[error("Bridge already initialised")]
    AlreadyInitialised,

    /// Arguments could not be encoded
    #[error("Failed to encode arguments: {0}")]
    Serialization(String),

    /// Script host rejected the script
    #[error("Script evaluation failed: {0}")]
    Evaluation(E),

    /// Script host could not clear persisted page data
    #[error("Failed to clear page data: {0}")]
    Storage(E),

    /// Page load failed
    #[error("Failed to load bridge: {0}")]
    Load(String),

    /// No response within the request timeout
    #[error("Timeout waiting for response to '{method}' ({timeout:?})")]
    Timeout { method: String, timeout: Duration },

    /// Application reported a failure
    #[error("Remote error: {0}")]
    Remote(String),

    /// Inbound payload missing required fields
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Response did not have the expected shape
    #[error("Unexpected result for '{method}' (expected {expected})")]
    Decode { method: String, expected: Expected },

    /// No API key configured
    #[error("Missing API key")]
    MissingApiKey,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Passkey ceremony failed
    #[error("Passkey operation failed: {0}")]
    Passkey(String),

    /// OAuth web session failed
    #[error("OAuth failed: {0}")]
    OAuth(String),

    /// Bridge dropped the request without resolving it
    #[error("Bridge closed")]
    Closed,
}

impl<E: Display + Debug> Error<E> {
    /// Check whether this error was reported by the remote application
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::Remote(_))
    }
}

impl<E: Display + Debug> From<ProtoError> for Error<E> {
    fn from(e: ProtoError) -> Self {
        match e {
            ProtoError::Encode(e) => Error::Serialization(e.to_string()),
            ProtoError::NotBridgeScript => Error::MalformedResponse(e.to_string()),
            ProtoError::Malformed(m) => Error::MalformedResponse(m),
        }
    }
}
