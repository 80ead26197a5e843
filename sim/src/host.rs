// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Simulated [ScriptHost]

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::Value;

use para_bridge::{EventSender, ScriptHost};
use para_bridge_proto::{Inbound, InvokeMethod, Outbound, CALLBACK_HANDLER};

use crate::{RemoteApp, SimError};

/// Simulator behaviour options
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    /// Answer the initialisation handshake
    pub ack_init: bool,

    /// Fail page loads with the provided reason
    pub load_failure: Option<String>,

    /// Delay before reporting load completion
    pub load_delay: Duration,

    /// Delay before delivering responses
    pub response_delay: Duration,

    /// Methods that are never answered
    pub silent_methods: Vec<String>,

    /// Reject every evaluated script
    pub reject_scripts: bool,

    /// Fail page data clearing with the provided reason
    pub storage_failure: Option<String>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            ack_init: true,
            load_failure: None,
            load_delay: Duration::from_millis(10),
            response_delay: Duration::ZERO,
            silent_methods: vec![],
            reject_scripts: false,
            storage_failure: None,
        }
    }
}

/// Script host backed by a [RemoteApp]
pub struct SimHost {
    app: Arc<RemoteApp>,
    opts: SimOptions,
    events: Mutex<Option<EventSender>>,
    scripts: Mutex<Vec<String>>,
    cleared: AtomicUsize,
}

impl SimHost {
    /// Create a host over the provided application with default options
    pub fn new(app: Arc<RemoteApp>) -> Self {
        Self::with_options(app, SimOptions::default())
    }

    /// Create a host with the provided behaviour options
    pub fn with_options(app: Arc<RemoteApp>, opts: SimOptions) -> Self {
        Self {
            app,
            opts,
            events: Mutex::new(None),
            scripts: Mutex::new(vec![]),
            cleared: AtomicUsize::new(0),
        }
    }

    /// Simulated application
    pub fn app(&self) -> &Arc<RemoteApp> {
        &self.app
    }

    /// Scripts evaluated so far
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().clone()
    }

    /// Method invocations evaluated so far
    pub fn invocations(&self) -> Vec<InvokeMethod> {
        self.scripts
            .lock()
            .iter()
            .filter_map(|s| match Outbound::from_script(s) {
                Ok(Outbound::Invoke(m)) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Number of times page data was cleared
    pub fn clear_count(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }

    /// Deliver a message to the page after the configured response delay
    fn post(&self, events: EventSender, msg: Value) {
        let delay = self.opts.response_delay;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if !events.message(msg) {
                debug!("Bridge dropped before delivery");
            }
        });
    }
}

#[async_trait]
impl ScriptHost for SimHost {
    type Error = SimError;

    async fn load(&self, url: &str, events: EventSender) -> Result<(), SimError> {
        debug!("Loading {} (handler: '{}')", url, CALLBACK_HANDLER);

        *self.events.lock() = Some(events.clone());

        let delay = self.opts.load_delay;
        let failure = self.opts.load_failure.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            match failure {
                Some(reason) => events.load_failed(reason),
                None => events.loaded(),
            };
        });

        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, SimError> {
        self.scripts.lock().push(script.to_string());

        if self.opts.reject_scripts {
            return Err(SimError::Script("evaluation disabled".to_string()));
        }

        let events = self.events.lock().clone().ok_or(SimError::NotLoaded)?;

        let msg = Outbound::from_script(script).map_err(|e| SimError::Script(e.to_string()))?;

        match msg {
            Outbound::Init { arguments } => {
                self.app.init(arguments);

                if self.opts.ack_init {
                    self.post(events, Inbound::ready().to_value());
                }
            }
            Outbound::Invoke(m) if self.opts.silent_methods.contains(&m.method_name) => {
                warn!("Ignoring '{}' ({})", m.method_name, m.request_id);
            }
            Outbound::Invoke(m) => {
                let resp = match self.app.handle(&m.method_name, &m.arguments) {
                    Ok(v) => Inbound::response(&m.method_name, &m.request_id, v),
                    Err(e) => Inbound::failure(&m.method_name, &m.request_id, &e),
                };

                self.post(events, resp.to_value());
            }
        }

        Ok(Value::Null)
    }

    async fn clear_data(&self) -> Result<(), SimError> {
        debug!("Clearing page data");

        if let Some(reason) = &self.opts.storage_failure {
            return Err(SimError::Storage(reason.clone()));
        }

        self.app.clear_storage();
        self.cleared.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}
