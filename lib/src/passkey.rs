// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Passkey and OAuth capabilities
//!
//! Platform ceremonies (WebAuthn assertion / registration, web authentication
//! sessions) are provided by the embedding application, the client only
//! sequences them between bridge calls.

use std::fmt::{Debug, Display};

use async_trait::async_trait;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

/// Base64url engine used for binary values crossing the bridge
///
/// Encodes without padding, decodes with or without.
pub const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as base64url
pub fn b64url(b: &[u8]) -> String {
    BASE64_URL.encode(b)
}

/// Signed passkey assertion
#[derive(Clone, Debug, PartialEq)]
pub struct PasskeyAssertion {
    pub credential_id: Vec<u8>,
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
    /// User handle stored with the credential
    pub user_id: Vec<u8>,
}

/// Passkey registration result
#[derive(Clone, Debug, PartialEq)]
pub struct PasskeyRegistration {
    pub credential_id: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub attestation_object: Option<Vec<u8>>,
}

/// Platform passkey (WebAuthn) ceremonies
#[async_trait]
pub trait PasskeyProvider: Send + Sync {
    type Error: Display + Debug + Send;

    /// Perform an assertion over `challenge` for the relying party
    async fn assert(
        &self,
        relying_party: &str,
        challenge: &[u8],
    ) -> Result<PasskeyAssertion, Self::Error>;

    /// Register a new credential for `username` with the provided user handle
    async fn register(
        &self,
        relying_party: &str,
        username: &str,
        user_handle: &[u8],
    ) -> Result<PasskeyRegistration, Self::Error>;
}

/// Platform web authentication session (used for OAuth)
#[async_trait]
pub trait OAuthSession: Send + Sync {
    type Error: Display + Debug + Send;

    /// Present `url`, returning the callback URL once the flow redirects to
    /// `callback_scheme`
    async fn authenticate(&self, url: &str, callback_scheme: &str) -> Result<String, Self::Error>;
}
