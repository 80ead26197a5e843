// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Client configuration

use std::{
    fmt::{Debug, Display},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use url::Url;

use para_bridge_proto::InitArgs;

use crate::{bridge::DEFAULT_REQUEST_TIMEOUT, Error};

/// Client package version reported during initialisation
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Platform tag reported during initialisation
pub const DEFAULT_PLATFORM: &str = if cfg!(target_os = "android") {
    "Android"
} else {
    "iOS"
};

/// Default bridge URL for development environments
const DEV_BRIDGE_URL: &str = "http://localhost:5173";

/// Para environment tier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "lowercase")]
pub enum Environment {
    /// Local development, with an optional bridge URL override
    Dev {
        relying_party_id: String,
        #[serde(default)]
        bridge_url: Option<Url>,
    },
    Sandbox,
    Beta,
    Prod,
}

impl Environment {
    /// Passkey relying party identifier
    pub fn relying_party_id(&self) -> &str {
        match self {
            Environment::Dev {
                relying_party_id, ..
            } => relying_party_id,
            Environment::Sandbox => "app.sandbox.usecapsule.com",
            Environment::Beta => "app.beta.usecapsule.com",
            Environment::Prod => "app.usecapsule.com",
        }
    }

    /// URL of the hosted bridge application
    pub fn bridge_url(&self) -> String {
        match self {
            Environment::Dev {
                bridge_url: Some(u),
                ..
            } => u.to_string(),
            Environment::Dev { .. } => DEV_BRIDGE_URL.to_string(),
            Environment::Sandbox => "https://js-bridge.sandbox.usecapsule.com/".to_string(),
            Environment::Beta => "https://js-bridge.beta.usecapsule.com/".to_string(),
            Environment::Prod => "https://js-bridge.prod.usecapsule.com/".to_string(),
        }
    }

    /// Tier name sent to the application
    pub fn name(&self) -> &'static str {
        match self {
            Environment::Dev { .. } => "DEV",
            Environment::Sandbox => "SANDBOX",
            Environment::Beta => "BETA",
            Environment::Prod => "PROD",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parse a tier name, `dev` uses a `localhost` relying party
impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev {
                relying_party_id: "localhost".to_string(),
                bridge_url: None,
            }),
            "sandbox" => Ok(Environment::Sandbox),
            "beta" => Ok(Environment::Beta),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("unknown environment: {s}")),
        }
    }
}

fn default_platform() -> String {
    DEFAULT_PLATFORM.to_string()
}

/// Para client configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Environment tier
    pub environment: Environment,

    /// Partner API key (required)
    #[serde(default)]
    pub api_key: String,

    /// Request timeout override in seconds
    #[serde(default)]
    pub request_timeout_s: Option<u64>,

    /// Platform tag
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Callback scheme for OAuth, defaults to the application identifier
    #[serde(default)]
    pub deeplink_url: Option<String>,
}

impl Config {
    /// Create a configuration with default settings
    pub fn new(environment: Environment, api_key: impl Into<String>) -> Self {
        Self {
            environment,
            api_key: api_key.into(),
            request_timeout_s: None,
            platform: default_platform(),
            deeplink_url: None,
        }
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_s
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Check the configuration is usable
    pub fn validate<E: Display + Debug>(&self) -> Result<(), Error<E>> {
        if self.api_key.trim().is_empty() {
            return Err(Error::MissingApiKey);
        }

        if self.request_timeout_s == Some(0) {
            return Err(Error::InvalidConfig("request timeout must be non-zero".into()));
        }

        Url::parse(&self.environment.bridge_url())
            .map_err(|e| Error::InvalidConfig(format!("bridge url: {e}")))?;

        Ok(())
    }

    /// Arguments for the initialisation handshake
    pub fn init_args(&self) -> InitArgs {
        InitArgs {
            environment: self.environment.name().to_string(),
            api_key: self.api_key.clone(),
            platform: self.platform.clone(),
            package: PACKAGE_VERSION.to_string(),
        }
    }
}
