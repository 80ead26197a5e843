// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Inbound (page -> native) bridge messages
//!
//! Inbound payloads are loosely typed JSON pushed by the page, so decoding checks
//! each field explicitly and reports a [ProtoError::Malformed] rather than failing
//! on the first unexpected shape.

use serde_json::{Map, Value};

use crate::{ProtoError, INIT_MESSAGE};

/// Message received from the hosted page
#[derive(Clone, Debug, PartialEq)]
pub struct Inbound {
    /// Method this message responds to (or the init sentinel)
    pub method: String,

    /// Correlation id of the originating request, absent for unsolicited messages
    pub request_id: Option<String>,

    /// Response payload, absent or null for methods returning nothing
    pub response_data: Option<Value>,

    /// Error reported by the application
    pub error: Option<String>,
}

/// Classification of an inbound message
#[derive(Clone, Debug, PartialEq)]
pub enum InboundKind {
    /// Application finished its own initialisation
    Ready,

    /// Response to a request
    Response {
        request_id: String,
        result: Result<Value, String>,
    },

    /// Message without a request id that is not the init sentinel
    Unsolicited(String),
}

impl Inbound {
    /// Decode an inbound message from a raw JSON payload
    pub fn from_value(value: Value) -> Result<Self, ProtoError> {
        let mut map = match value {
            Value::Object(m) => m,
            other => {
                return Err(ProtoError::Malformed(format!(
                    "expected an object, got {other}"
                )))
            }
        };

        let method = match map.remove("method") {
            Some(Value::String(s)) => s,
            Some(_) => return Err(ProtoError::Malformed("'method' is not a string".into())),
            None => return Err(ProtoError::Malformed("missing 'method'".into())),
        };

        let request_id = match map.remove("requestId") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(_) => {
                return Err(ProtoError::Malformed(format!(
                    "'requestId' is not a string (method: {method})"
                )))
            }
        };

        // Non-string errors are kept as their JSON text
        let error = match map.remove("error") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            method,
            request_id,
            response_data: map.remove("responseData"),
            error,
        })
    }

    /// Classify this message for dispatch
    pub fn kind(self) -> InboundKind {
        match self.request_id {
            None if self.method == INIT_MESSAGE => InboundKind::Ready,
            None => InboundKind::Unsolicited(self.method),
            Some(request_id) => {
                let result = match self.error {
                    Some(e) => Err(e),
                    None => Ok(self.response_data.unwrap_or(Value::Null)),
                };
                InboundKind::Response { request_id, result }
            }
        }
    }

    /// Init sentinel, sent once the application is ready
    pub fn ready() -> Self {
        Self {
            method: INIT_MESSAGE.to_string(),
            request_id: None,
            response_data: None,
            error: None,
        }
    }

    /// Successful response to a request
    pub fn response(method: &str, request_id: &str, data: Value) -> Self {
        Self {
            method: method.to_string(),
            request_id: Some(request_id.to_string()),
            response_data: Some(data),
            error: None,
        }
    }

    /// Failed response to a request
    pub fn failure(method: &str, request_id: &str, error: &str) -> Self {
        Self {
            method: method.to_string(),
            request_id: Some(request_id.to_string()),
            response_data: None,
            error: Some(error.to_string()),
        }
    }

    /// Encode as the JSON payload a page would post
    pub fn to_value(&self) -> Value {
        let mut m = Map::new();

        m.insert("method".into(), Value::String(self.method.clone()));
        if let Some(id) = &self.request_id {
            m.insert("requestId".into(), Value::String(id.clone()));
        }
        if let Some(d) = &self.response_data {
            m.insert("responseData".into(), d.clone());
        }
        if let Some(e) = &self.error {
            m.insert("error".into(), Value::String(e.clone()));
        }

        Value::Object(m)
    }
}
