// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Outbound (native -> page) bridge messages

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtoError;

/// Prefix of scripts posting a bridge message into the page
const SCRIPT_PREFIX: &str = "window.postMessage(";

/// Suffix of scripts posting a bridge message into the page
const SCRIPT_SUFFIX: &str = ");";

/// Arguments for the initialisation handshake
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitArgs {
    /// Environment tier name (`DEV`, `SANDBOX`, `BETA`, `PROD`)
    pub environment: String,

    /// Partner API key
    pub api_key: String,

    /// Platform tag
    pub platform: String,

    /// Client package version
    pub package: String,
}

/// Method invocation payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeMethod {
    /// Remote capability name
    pub method_name: String,

    /// Positional arguments
    pub arguments: Vec<Value>,

    /// Correlation id, echoed verbatim in the matching response
    pub request_id: String,
}

impl InvokeMethod {
    /// Create a new method invocation
    pub fn new(method: &str, arguments: Vec<Value>, request_id: &str) -> Self {
        Self {
            method_name: method.to_string(),
            arguments,
            request_id: request_id.to_string(),
        }
    }
}

/// Messages posted into the hosted page
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "messageType")]
pub enum Outbound {
    /// Initialisation handshake, answered by an unsolicited init sentinel
    #[serde(rename = "Capsule#init")]
    Init { arguments: InitArgs },

    /// Method invocation, answered by a response carrying the same request id
    #[serde(rename = "Capsule#invokeMethod")]
    Invoke(InvokeMethod),
}

impl From<InitArgs> for Outbound {
    fn from(arguments: InitArgs) -> Self {
        Self::Init { arguments }
    }
}

impl From<InvokeMethod> for Outbound {
    fn from(m: InvokeMethod) -> Self {
        Self::Invoke(m)
    }
}

impl Outbound {
    /// Render the script posting this message into the page
    pub fn to_script(&self) -> Result<String, ProtoError> {
        let json = serde_json::to_string(self).map_err(ProtoError::Encode)?;

        // Line / paragraph separators are legal in JSON strings but not in
        // older script engines' string literals
        let json = json
            .replace('\u{2028}', "\\u2028")
            .replace('\u{2029}', "\\u2029");

        Ok(format!("{SCRIPT_PREFIX}{json}{SCRIPT_SUFFIX}"))
    }

    /// Recover a message from a script produced by [Outbound::to_script]
    pub fn from_script(script: &str) -> Result<Self, ProtoError> {
        let json = script
            .trim()
            .strip_prefix(SCRIPT_PREFIX)
            .and_then(|s| s.strip_suffix(SCRIPT_SUFFIX))
            .ok_or(ProtoError::NotBridgeScript)?;

        serde_json::from_str(json).map_err(|e| ProtoError::Malformed(e.to_string()))
    }

    /// Request id for invocations, `None` for the init handshake
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Init { .. } => None,
            Self::Invoke(m) => Some(&m.request_id),
        }
    }
}
