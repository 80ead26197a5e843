// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Script host abstraction
//!
//! A [ScriptHost] wraps the embedded surface hosting the remote application
//! (a web view on mobile platforms, a simulator in tests). It loads pages,
//! evaluates scripts and forwards everything the page posts back through the
//! [EventSender] supplied at load time. It performs no interpretation of payloads.

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Events raised by a [ScriptHost]
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    /// Navigation completed
    Loaded,

    /// Navigation failed
    LoadFailed(String),

    /// Message posted by the page
    Message(Value),
}

/// Sink for [HostEvent]s, handed to the host by [ScriptHost::load]
#[derive(Clone, Debug)]
pub struct EventSender(UnboundedSender<HostEvent>);

impl EventSender {
    /// Create a new event channel
    pub fn channel() -> (Self, UnboundedReceiver<HostEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    /// Report navigation completion, returns `false` if the bridge is gone
    pub fn loaded(&self) -> bool {
        self.send(HostEvent::Loaded)
    }

    /// Report navigation failure
    pub fn load_failed(&self, reason: impl ToString) -> bool {
        self.send(HostEvent::LoadFailed(reason.to_string()))
    }

    /// Forward a message posted by the page
    pub fn message(&self, payload: Value) -> bool {
        self.send(HostEvent::Message(payload))
    }

    /// Send a raw event
    pub fn send(&self, evt: HostEvent) -> bool {
        self.0.send(evt).is_ok()
    }
}

/// Surface hosting the remote application
#[async_trait]
pub trait ScriptHost: Send + Sync + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    /// Begin loading `url`, reporting exactly one of [HostEvent::Loaded] or
    /// [HostEvent::LoadFailed] and all subsequent page messages via `events`
    ///
    /// Page messages are those posted to the handler named
    /// [CALLBACK_HANDLER](para_bridge_proto::CALLBACK_HANDLER).
    async fn load(&self, url: &str, events: EventSender) -> Result<(), Self::Error>;

    /// Evaluate a script in the hosted page
    ///
    /// Success only indicates the script ran, responses arrive as
    /// [HostEvent::Message]s
    async fn evaluate(&self, script: &str) -> Result<Value, Self::Error>;

    /// Remove persisted page data (cookies, storage)
    async fn clear_data(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
