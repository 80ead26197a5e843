// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Handle for a Para session
//!
//! This provides typed methods for interacting with the remote application
//! and is generic over [ScriptHost] implementations

use std::{sync::Arc, time::Duration};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::{
    bridge::{Bridge, Readiness},
    config::Config,
    decode,
    host::ScriptHost,
    passkey::{b64url, PasskeyProvider, BASE64_URL},
    session::{SessionState, SessionStore},
    Error,
};

/// Maximum time to wait for the application to become ready
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(30);

/// Empty argument list
pub(crate) const NO_ARGS: &[Value] = &[];

/// Length of generated passkey user handles
const USER_HANDLE_LEN: usize = 32;

/// Para handle over a [ScriptHost].
///
/// Cloning the handle shares the bridge and session state.
pub struct ParaHandle<H: ScriptHost> {
    /// Bridge to the remote application
    bridge: Bridge<H>,
    /// Client configuration
    config: Config,
    /// Observable session state
    pub(crate) session: Arc<SessionStore>,
}

impl<H: ScriptHost> Clone for ParaHandle<H> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            config: self.config.clone(),
            session: self.session.clone(),
        }
    }
}

impl<H: ScriptHost> ParaHandle<H> {
    /// Create a new handle, validating the provided configuration
    pub fn new(config: Config, host: H) -> Result<Self, Error<H::Error>> {
        config.validate()?;

        let bridge = Bridge::with_timeout(host, config.request_timeout());

        Ok(Self {
            bridge,
            config,
            session: Arc::new(SessionStore::new()),
        })
    }

    /// Create a handle and start the bridge
    pub async fn connect(config: Config, host: H) -> Result<Self, Error<H::Error>> {
        let h = Self::new(config, host)?;
        h.start().await?;
        Ok(h)
    }

    /// Load the application for the configured environment and probe the
    /// existing session once it becomes ready
    pub async fn start(&self) -> Result<(), Error<H::Error>> {
        let url = self.config.environment.bridge_url();

        debug!("Starting {} bridge", self.config.environment);

        match self.bridge.initialize(&url, self.config.init_args()).await {
            Ok(_) => (),
            Err(Error::AlreadyInitialised) => return Err(Error::AlreadyInitialised),
            Err(e) => {
                self.session.settle(SessionState::Inactive);
                return Err(e);
            }
        }

        let h = self.clone();
        tokio::spawn(async move {
            let s = h.probe_session().await;
            h.session.settle(s);
        });

        Ok(())
    }

    /// Resolve the existing session state once the bridge is ready
    async fn probe_session(&self) -> SessionState {
        if self.bridge.wait_ready(STARTUP_TIMEOUT).await != Readiness::Ready {
            warn!(
                "Bridge not ready ({}), no active session",
                self.bridge.readiness()
            );
            return SessionState::Inactive;
        }

        match self.is_session_active().await {
            Ok(true) => (),
            Ok(false) => return SessionState::Inactive,
            Err(e) => {
                warn!("Session probe failed: {}", e);
                return SessionState::Inactive;
            }
        }

        match self.is_fully_logged_in().await {
            Ok(true) => SessionState::ActiveLoggedIn,
            Ok(false) => SessionState::Active,
            Err(e) => {
                warn!("Login probe failed: {}", e);
                SessionState::Active
            }
        }
    }

    /// Wait for the bridge to become ready, failing with [Error::NotReady]
    /// if it fails or does not become ready within [STARTUP_TIMEOUT]
    pub async fn ensure_ready(&self) -> Result<(), Error<H::Error>> {
        if self.bridge.is_ready() {
            return Ok(());
        }

        debug!("Waiting for bridge initialisation");

        match self.bridge.wait_ready(STARTUP_TIMEOUT).await {
            Readiness::Ready => Ok(()),
            _ => Err(Error::NotReady),
        }
    }

    /// Invoke a remote method via the bridge
    pub(crate) async fn call<A: Serialize + ?Sized>(
        &self,
        method: &str,
        args: &A,
    ) -> Result<Value, Error<H::Error>> {
        self.bridge.call(method, args).await
    }

    /// Session and wallet state
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Underlying bridge
    pub fn bridge(&self) -> &Bridge<H> {
        &self.bridge
    }

    /// Client configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check whether a user exists for the provided email
    pub async fn check_user_exists(&self, email: &str) -> Result<bool, Error<H::Error>> {
        let v = self.call("checkIfUserExists", &[email]).await?;
        decode::bool("checkIfUserExists", &v)
    }

    /// Check whether a user exists for the provided phone number
    pub async fn check_user_exists_by_phone(
        &self,
        phone: &str,
        country_code: &str,
    ) -> Result<bool, Error<H::Error>> {
        let v = self
            .call("checkIfUserExistsByPhone", &[phone, country_code])
            .await?;
        decode::bool("checkIfUserExistsByPhone", &v)
    }

    /// Create a user with the provided email
    pub async fn create_user(&self, email: &str) -> Result<(), Error<H::Error>> {
        self.call("createUser", &[email]).await?;
        Ok(())
    }

    /// Create a user with the provided phone number
    pub async fn create_user_by_phone(
        &self,
        phone: &str,
        country_code: &str,
    ) -> Result<(), Error<H::Error>> {
        self.call("createUserByPhone", &[phone, country_code])
            .await?;
        Ok(())
    }

    /// Submit an email verification code, returning the biometrics id
    pub async fn verify(&self, code: &str) -> Result<String, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("verifyEmail", &[code]).await?;
        decode::path_id("verifyEmail", &v)
    }

    /// Submit a phone verification code, returning the biometrics id
    pub async fn verify_by_phone(&self, code: &str) -> Result<String, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("verifyPhone", &[code]).await?;
        decode::path_id("verifyPhone", &v)
    }

    /// Log in with a passkey
    ///
    /// Fetches a challenge, performs the assertion via the provided
    /// [PasskeyProvider], then completes login and refreshes wallets.
    pub async fn login<P: PasskeyProvider>(&self, passkeys: &P) -> Result<(), Error<H::Error>> {
        let v = self.call("getWebChallenge", NO_ARGS).await?;
        let challenge = decode::key_string("getWebChallenge", &v, "challenge")?;
        let challenge = BASE64_URL
            .decode(&challenge)
            .map_err(|e| Error::Passkey(format!("invalid challenge: {e}")))?;

        let relying_party = self.config.environment.relying_party_id();
        let assertion = passkeys
            .assert(relying_party, &challenge)
            .await
            .map_err(|e| Error::Passkey(e.to_string()))?;

        let credential_id = b64url(&assertion.credential_id);

        let v = self
            .call(
                "verifyWebChallenge",
                &(
                    &credential_id,
                    b64url(&assertion.authenticator_data),
                    b64url(&assertion.client_data_json),
                    b64url(&assertion.signature),
                ),
            )
            .await?;
        let user_id = decode::string("verifyWebChallenge", &v)?;

        debug!("Passkey verified for user {}", user_id);

        self.call(
            "loginV2",
            &(&user_id, &credential_id, b64url(&assertion.user_id)),
        )
        .await?;

        let wallets = self.fetch_wallets().await?;
        self.session.set_wallets(wallets);
        self.session.set_state(SessionState::ActiveLoggedIn);

        Ok(())
    }

    /// Register a new passkey for `identifier` against the biometrics id
    /// returned by [ParaHandle::verify]
    pub async fn generate_passkey<P: PasskeyProvider>(
        &self,
        identifier: &str,
        biometrics_id: &str,
        passkeys: &P,
    ) -> Result<(), Error<H::Error>> {
        self.ensure_ready().await?;

        let user_handle: [u8; USER_HANDLE_LEN] = rand::random();

        let relying_party = self.config.environment.relying_party_id();
        let registration = passkeys
            .register(relying_party, identifier, &user_handle)
            .await
            .map_err(|e| Error::Passkey(e.to_string()))?;

        let attestation = match &registration.attestation_object {
            Some(a) => b64url(a),
            None => return Err(Error::Passkey("missing attestation object".to_string())),
        };

        self.call(
            "generatePasskeyV2",
            &(
                attestation,
                b64url(&registration.client_data_json),
                b64url(&registration.credential_id),
                b64url(&user_handle),
                biometrics_id,
            ),
        )
        .await?;

        Ok(())
    }

    /// Start two-factor setup, returning the authenticator URI
    pub async fn setup_2fa(&self) -> Result<String, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("setup2FA", NO_ARGS).await?;
        decode::key_string("setup2FA", &v, "uri")
    }

    /// Enable two-factor authentication
    pub async fn enable_2fa(&self) -> Result<(), Error<H::Error>> {
        self.ensure_ready().await?;

        self.call("enable2FA", NO_ARGS).await?;
        Ok(())
    }

    /// Check whether two-factor authentication is set up
    pub async fn is_2fa_setup(&self) -> Result<bool, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("check2FAStatus", NO_ARGS).await?;
        decode::key_bool("check2FAStatus", &v, "isSetup")
    }

    /// Resend the verification code for the pending user
    pub async fn resend_verification_code(&self) -> Result<(), Error<H::Error>> {
        self.ensure_ready().await?;

        self.call("resendVerificationCode", NO_ARGS).await?;
        Ok(())
    }

    /// Check whether the session has completed passkey login
    pub async fn is_fully_logged_in(&self) -> Result<bool, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("isFullyLoggedIn", NO_ARGS).await?;
        decode::bool("isFullyLoggedIn", &v)
    }

    /// Check whether the application holds an active session
    pub async fn is_session_active(&self) -> Result<bool, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("isSessionActive", NO_ARGS).await?;
        decode::bool("isSessionActive", &v)
    }

    /// Export the serialised session
    pub async fn export_session(&self) -> Result<String, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("exportSession", NO_ARGS).await?;
        decode::string("exportSession", &v)
    }

    /// Log out, clearing session state and host data
    ///
    /// Local session state is cleared once the application has logged out,
    /// even if the host then fails to clear page data.
    pub async fn logout(&self) -> Result<(), Error<H::Error>> {
        self.call("logout", NO_ARGS).await?;

        self.session.clear();

        if let Err(e) = self.bridge.host().clear_data().await {
            warn!("Failed to clear page data: {}", e);
            return Err(Error::Storage(e));
        }

        Ok(())
    }

    /// Log in with an external wallet address
    pub async fn external_wallet_login(
        &self,
        address: &str,
        wallet_type: &str,
    ) -> Result<(), Error<H::Error>> {
        self.ensure_ready().await?;

        self.call("externalWalletLogin", &[address, wallet_type])
            .await?;
        self.session.set_state(SessionState::ActiveLoggedIn);

        debug!("External wallet login complete for {}", address);

        Ok(())
    }

    /// Sign a message with the provided wallet, returning the signature
    pub async fn sign_message(
        &self,
        wallet_id: &str,
        message: &str,
    ) -> Result<String, Error<H::Error>> {
        self.ensure_ready().await?;

        let encoded = STANDARD.encode(message.as_bytes());
        let v = self.call("signMessage", &(wallet_id, encoded)).await?;
        decode::key_string("signMessage", &v, "signature")
    }

    /// Sign an RLP encoded transaction with the provided wallet
    pub async fn sign_transaction(
        &self,
        wallet_id: &str,
        rlp_encoded_tx: &str,
        chain_id: &str,
    ) -> Result<String, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self
            .call("signTransaction", &[wallet_id, rlp_encoded_tx, chain_id])
            .await?;
        decode::key_string("signTransaction", &v, "signature")
    }
}
