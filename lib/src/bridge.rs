// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Bridge transport
//!
//! [Bridge] owns the readiness state and the correlation table for a single
//! [ScriptHost]. Calls are posted into the page as scripts, responses arrive
//! out-of-band as host messages and are matched back to their callers by
//! request id, so any number of calls may be in flight and resolve in whatever
//! order the application answers them.

use std::{
    collections::HashMap,
    fmt::Display,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::{
    sync::{mpsc::UnboundedReceiver, oneshot, watch},
    time::Instant,
};

use para_bridge_proto::{Inbound, InboundKind, InitArgs, InvokeMethod, Outbound};

use crate::{
    host::{EventSender, HostEvent, ScriptHost},
    Error,
};

/// Default time to wait for a response
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bridge readiness
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display)]
pub enum Readiness {
    /// Waiting for the application to complete initialisation
    NotReady,
    /// Application initialised, requests may be dispatched
    Ready,
    /// Page load or initialisation failed, a new bridge is required
    Failed,
}

/// Result of handling an inbound message
#[derive(Clone, Debug, PartialEq)]
pub enum Delivery {
    /// Init sentinel received
    Ready,
    /// Pending request resolved
    Resolved(String),
    /// No pending request with this id
    UnknownRequest(String),
    /// Message without request id
    Unsolicited(String),
    /// Payload could not be decoded
    Malformed(String),
}

/// Terminal outcome delivered to a waiting caller
#[derive(Debug)]
enum Outcome {
    Resolved(Value),
    Remote(String),
    Malformed(String),
}

/// Correlation table entry
struct Pending {
    method: String,
    created_at: Instant,
    tx: oneshot::Sender<Outcome>,
}

struct Inner<H: ScriptHost> {
    host: H,
    request_timeout: Duration,
    readiness: watch::Sender<Readiness>,
    pending: Mutex<HashMap<String, Pending>>,
    started: AtomicBool,
    nonce: u32,
    next_id: AtomicU64,
    last_error: Mutex<Option<String>>,
}

/// Handle to a bridge over a [ScriptHost]
///
/// Cloning the handle shares the underlying bridge.
pub struct Bridge<H: ScriptHost> {
    inner: Arc<Inner<H>>,
}

impl<H: ScriptHost> Clone for Bridge<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: ScriptHost> Bridge<H> {
    /// Create a bridge using the [DEFAULT_REQUEST_TIMEOUT]
    pub fn new(host: H) -> Self {
        Self::with_timeout(host, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a bridge with the provided request timeout
    pub fn with_timeout(host: H, request_timeout: Duration) -> Self {
        let (readiness, _) = watch::channel(Readiness::NotReady);

        Self {
            inner: Arc::new(Inner {
                host,
                request_timeout,
                readiness,
                pending: Mutex::new(HashMap::new()),
                started: AtomicBool::new(false),
                nonce: rand::random(),
                next_id: AtomicU64::new(0),
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Underlying script host
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Configured request timeout
    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    /// Current readiness
    pub fn readiness(&self) -> Readiness {
        *self.inner.readiness.borrow()
    }

    /// Check whether requests may be dispatched
    pub fn is_ready(&self) -> bool {
        self.readiness() == Readiness::Ready
    }

    /// Watch readiness changes
    pub fn subscribe(&self) -> watch::Receiver<Readiness> {
        self.inner.readiness.subscribe()
    }

    /// Wait (up to `timeout`) for the bridge to leave [Readiness::NotReady]
    pub async fn wait_ready(&self, timeout: Duration) -> Readiness {
        let mut rx = self.subscribe();

        let _ = tokio::time::timeout(timeout, async {
            let _ = rx.wait_for(|r| *r != Readiness::NotReady).await;
        })
        .await;

        self.readiness()
    }

    /// Number of requests awaiting a response
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Most recent load failure or protocol anomaly
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.lock().clone()
    }

    /// Start loading the application at `url`
    ///
    /// This returns once navigation has started, readiness is reported via
    /// [Bridge::readiness] once the application acknowledges `init`.
    pub async fn initialize(&self, url: &str, init: InitArgs) -> Result<(), Error<H::Error>> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInitialised);
        }

        let (events, rx) = EventSender::channel();
        tokio::spawn(run_events(Arc::downgrade(&self.inner), rx, init));

        debug!("Loading bridge: {}", url);

        if let Err(e) = self.inner.host.load(url, events).await {
            let reason = e.to_string();
            self.inner.fail(&reason);
            return Err(Error::Load(reason));
        }

        Ok(())
    }

    /// Invoke a remote method using the configured request timeout
    ///
    /// `args` must encode as a JSON array (tuples, slices, vectors).
    pub async fn call<A: Serialize + ?Sized>(
        &self,
        method: &str,
        args: &A,
    ) -> Result<Value, Error<H::Error>> {
        self.call_timeout(method, args, self.inner.request_timeout)
            .await
    }

    /// Invoke a remote method, failing with [Error::Timeout] if no response
    /// arrives within `timeout`
    pub async fn call_timeout<A: Serialize + ?Sized>(
        &self,
        method: &str,
        args: &A,
        timeout: Duration,
    ) -> Result<Value, Error<H::Error>> {
        if !self.is_ready() {
            return Err(Error::NotReady);
        }

        let arguments = encode_args(args)?;
        let request_id = self.inner.next_request_id();
        let script = Outbound::from(InvokeMethod::new(method, arguments, &request_id)).to_script()?;

        // Register before evaluating, the host may answer before evaluate returns
        let (tx, rx) = oneshot::channel();
        let created_at = Instant::now();
        self.inner.pending.lock().insert(
            request_id.clone(),
            Pending {
                method: method.to_string(),
                created_at,
                tx,
            },
        );
        let _guard = PendingGuard {
            inner: &self.inner,
            request_id: &request_id,
        };

        debug!("Calling '{}' ({})", method, request_id);

        let exchange = async {
            self.inner
                .host
                .evaluate(&script)
                .await
                .map_err(Error::Evaluation)?;
            rx.await.map_err(|_| Error::<H::Error>::Closed)
        };

        // Deadlines past the clock's range fall back to a saturating timeout
        let res = match created_at.checked_add(timeout) {
            Some(deadline) => tokio::time::timeout_at(deadline, exchange).await,
            None => tokio::time::timeout(timeout, exchange).await,
        };

        let outcome = match res {
            Ok(r) => r?,
            Err(_) => {
                warn!(
                    "Timeout waiting for '{}' ({}) after {:?}",
                    method, request_id, timeout
                );
                return Err(Error::Timeout {
                    method: method.to_string(),
                    timeout,
                });
            }
        };

        match outcome {
            Outcome::Resolved(v) => Ok(v),
            Outcome::Remote(e) => {
                debug!("'{}' ({}) failed: {}", method, request_id, e);
                Err(Error::Remote(e))
            }
            Outcome::Malformed(e) => Err(Error::MalformedResponse(e)),
        }
    }

    /// Handle a message posted by the page
    ///
    /// Hosts normally deliver messages via [EventSender], this allows
    /// synchronous delivery and reports how the message was dispatched.
    pub fn handle_inbound(&self, payload: Value) -> Delivery {
        self.inner.handle_inbound(payload)
    }
}

/// Removes a correlation table entry on every exit path from a call
struct PendingGuard<'a, H: ScriptHost> {
    inner: &'a Inner<H>,
    request_id: &'a str,
}

impl<'a, H: ScriptHost> Drop for PendingGuard<'a, H> {
    fn drop(&mut self) {
        self.inner.take(self.request_id);
    }
}

impl<H: ScriptHost> Inner<H> {
    fn readiness(&self) -> Readiness {
        *self.readiness.borrow()
    }

    fn next_request_id(&self) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("req-{:08x}-{}", self.nonce, n)
    }

    fn take(&self, request_id: &str) -> Option<Pending> {
        self.pending.lock().remove(request_id)
    }

    fn record(&self, reason: String) {
        warn!("{}", reason);
        *self.last_error.lock() = Some(reason);
    }

    fn mark_ready(&self) {
        let changed = self.readiness.send_if_modified(|r| match r {
            Readiness::NotReady => {
                *r = Readiness::Ready;
                true
            }
            _ => false,
        });

        match changed {
            true => debug!("Bridge ready"),
            false => debug!("Ignoring init sentinel (state: {})", self.readiness()),
        }
    }

    fn fail(&self, reason: &str) {
        self.readiness.send_if_modified(|r| match r {
            Readiness::NotReady => {
                *r = Readiness::Failed;
                true
            }
            _ => false,
        });

        self.record(format!("Bridge initialisation failed: {reason}"));
    }

    async fn send_init(&self, init: &InitArgs) {
        if self.readiness() != Readiness::NotReady {
            debug!("Ignoring load event (state: {})", self.readiness());
            return;
        }

        let script = match Outbound::from(init.clone()).to_script() {
            Ok(s) => s,
            Err(e) => return self.fail(&e.to_string()),
        };

        debug!(
            "Initialising application (environment: {}, platform: {}, package: {})",
            init.environment, init.platform, init.package
        );

        if let Err(e) = self.host.evaluate(&script).await {
            self.fail(&format!("init script: {e}"));
        }
    }

    fn handle_inbound(&self, payload: Value) -> Delivery {
        // Retained so a malformed response can still fail its caller
        let request_id = payload
            .get("requestId")
            .and_then(Value::as_str)
            .map(str::to_string);

        let msg = match Inbound::from_value(payload) {
            Ok(m) => m,
            Err(e) => {
                let reason = e.to_string();
                if let Some(p) = request_id.and_then(|id| self.take(&id)) {
                    let _ = p.tx.send(Outcome::Malformed(reason.clone()));
                }
                self.record(format!("Invalid response: {reason}"));
                return Delivery::Malformed(reason);
            }
        };

        let method = msg.method.clone();

        match msg.kind() {
            InboundKind::Ready => {
                self.mark_ready();
                Delivery::Ready
            }
            InboundKind::Unsolicited(method) => {
                self.record(format!("Invalid response: missing 'requestId' for {method}"));
                Delivery::Unsolicited(method)
            }
            InboundKind::Response { request_id, result } => {
                let p = match self.take(&request_id) {
                    Some(p) => p,
                    None => {
                        self.record(format!(
                            "Received response for unknown requestId: {request_id}"
                        ));
                        return Delivery::UnknownRequest(request_id);
                    }
                };

                debug!(
                    "Response for '{}' ({}) after {:?}",
                    p.method,
                    request_id,
                    p.created_at.elapsed()
                );
                if p.method != method {
                    debug!("Response method '{}' differs from request", method);
                }

                let outcome = match result {
                    Ok(v) => Outcome::Resolved(v),
                    Err(e) => Outcome::Remote(e),
                };
                if p.tx.send(outcome).is_err() {
                    debug!("Caller for {} went away", request_id);
                }

                Delivery::Resolved(request_id)
            }
        }
    }
}

/// Process host events until the bridge is dropped
async fn run_events<H: ScriptHost>(
    inner: Weak<Inner<H>>,
    mut events: UnboundedReceiver<HostEvent>,
    init: InitArgs,
) {
    while let Some(evt) = events.recv().await {
        let bridge = match inner.upgrade() {
            Some(v) => v,
            None => break,
        };

        match evt {
            HostEvent::Loaded => bridge.send_init(&init).await,
            HostEvent::LoadFailed(reason) => bridge.fail(&reason),
            HostEvent::Message(payload) => {
                bridge.handle_inbound(payload);
            }
        }
    }

    debug!("Bridge event loop exited");
}

/// Encode call arguments as a JSON array
fn encode_args<A: Serialize + ?Sized, E: Display + std::fmt::Debug>(
    args: &A,
) -> Result<Vec<Value>, Error<E>> {
    match serde_json::to_value(args) {
        Ok(Value::Array(a)) => Ok(a),
        Ok(other) => Err(Error::Serialization(format!(
            "arguments must encode as an array, got {other}"
        ))),
        Err(e) => Err(Error::Serialization(e.to_string())),
    }
}
