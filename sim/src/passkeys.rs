// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Simulated platform ceremonies

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;
use serde_json::json;

use para_bridge::{
    passkey::b64url, OAuthSession, PasskeyAssertion, PasskeyProvider, PasskeyRegistration,
};

use crate::SimError;

/// Stored simulated credential
#[derive(Clone, Debug)]
struct StoredCredential {
    relying_party: String,
    username: String,
    credential_id: Vec<u8>,
    user_handle: Vec<u8>,
}

/// Simulated passkey authenticator
///
/// Registered credentials are kept in memory, assertions use the most
/// recently registered credential for the relying party.
#[derive(Debug, Default)]
pub struct SimPasskeys {
    credentials: Mutex<Vec<StoredCredential>>,
    omit_attestation: bool,
}

impl SimPasskeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticator that registers credentials without attestation objects
    pub fn without_attestation() -> Self {
        Self {
            omit_attestation: true,
            ..Self::default()
        }
    }

    /// Number of registered credentials
    pub fn count(&self) -> usize {
        self.credentials.lock().len()
    }
}

#[async_trait]
impl PasskeyProvider for SimPasskeys {
    type Error = SimError;

    async fn assert(
        &self,
        relying_party: &str,
        challenge: &[u8],
    ) -> Result<PasskeyAssertion, SimError> {
        let c = self
            .credentials
            .lock()
            .iter()
            .rev()
            .find(|c| c.relying_party == relying_party)
            .cloned()
            .ok_or_else(|| SimError::NoCredential(relying_party.to_string()))?;

        debug!("Asserting passkey for {} ({})", c.username, relying_party);

        let client_data = json!({
            "type": "webauthn.get",
            "challenge": b64url(challenge),
            "origin": format!("https://{relying_party}"),
        });

        Ok(PasskeyAssertion {
            credential_id: c.credential_id.clone(),
            authenticator_data: relying_party.as_bytes().to_vec(),
            client_data_json: client_data.to_string().into_bytes(),
            signature: [challenge, c.credential_id.as_slice()].concat(),
            user_id: c.user_handle,
        })
    }

    async fn register(
        &self,
        relying_party: &str,
        username: &str,
        user_handle: &[u8],
    ) -> Result<PasskeyRegistration, SimError> {
        let credential_id: [u8; 16] = rand::random();

        debug!("Registering passkey for {} ({})", username, relying_party);

        self.credentials.lock().push(StoredCredential {
            relying_party: relying_party.to_string(),
            username: username.to_string(),
            credential_id: credential_id.to_vec(),
            user_handle: user_handle.to_vec(),
        });

        let client_data = json!({
            "type": "webauthn.create",
            "origin": format!("https://{relying_party}"),
        });

        let attestation_object = match self.omit_attestation {
            true => None,
            false => Some([b"none".as_slice(), user_handle].concat()),
        };

        Ok(PasskeyRegistration {
            credential_id: credential_id.to_vec(),
            client_data_json: client_data.to_string().into_bytes(),
            attestation_object,
        })
    }
}

/// Simulated web authentication session, completing every flow for a
/// fixed email address
#[derive(Clone, Debug, PartialEq)]
pub struct SimOAuth {
    pub email: Option<String>,
}

impl SimOAuth {
    pub fn new(email: &str) -> Self {
        Self {
            email: Some(email.to_string()),
        }
    }
}

#[async_trait]
impl OAuthSession for SimOAuth {
    type Error = SimError;

    async fn authenticate(&self, url: &str, callback_scheme: &str) -> Result<String, SimError> {
        debug!("OAuth session for {}", url);

        match &self.email {
            Some(e) => Ok(format!("{callback_scheme}://oauth?email={e}&token=sim")),
            None => Err(SimError::Cancelled),
        }
    }
}
