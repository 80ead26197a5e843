// Copyright (c) 2022-2023 The MobileCoin Foundation

//! In-memory stand-in for the hosted Para application

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use log::{debug, trace};
use parking_lot::Mutex;
use serde_json::{json, Value};

use para_bridge::{
    passkey::{b64url, BASE64_URL},
    OAuthProvider, WalletRecord, WalletType,
};
use para_bridge_proto::InitArgs;

/// Verification code accepted by the simulated application
pub const VERIFICATION_CODE: &str = "123456";

/// Length of simulated signatures (r, s, v)
const SIGNATURE_LEN: usize = 65;

/// Length of issued passkey challenges
const CHALLENGE_LEN: usize = 32;

/// Simulated Para application
///
/// Remote methods are dispatched via [RemoteApp::handle], failures are
/// reported as strings in the same manner as the hosted application.
#[derive(Debug, Default)]
pub struct RemoteApp {
    state: Mutex<AppState>,
}

#[derive(Debug, Default)]
struct AppState {
    /// Initialisation arguments from the most recent handshake
    init: Option<InitArgs>,
    users: Vec<User>,
    /// User awaiting verification
    pending: Option<String>,
    session: Option<Session>,
    challenge: Option<Vec<u8>>,
    wallets: Vec<WalletRecord>,
    /// Wallet bound to the ethers signer
    signer: Option<String>,
    next_id: u64,
}

#[derive(Clone, Debug)]
struct User {
    id: String,
    /// Email, phone number or external wallet address
    identifier: String,
    biometrics_id: String,
    verified: bool,
    credentials: Vec<Credential>,
    two_fa: TwoFa,
}

#[derive(Clone, Debug)]
struct Credential {
    id: String,
    user_handle: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
enum TwoFa {
    #[default]
    Disabled,
    Pending,
    Enabled,
}

#[derive(Clone, Debug)]
struct Session {
    user_id: String,
    logged_in: bool,
}

/// Fetch a string argument
fn arg_str<'a>(args: &'a [Value], i: usize) -> Result<&'a str, String> {
    args.get(i)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("argument {i} must be a string"))
}

/// Fetch a boolean argument
fn arg_bool(args: &[Value], i: usize) -> Result<bool, String> {
    args.get(i)
        .and_then(Value::as_bool)
        .ok_or_else(|| format!("argument {i} must be a boolean"))
}

/// Deterministic stand-in for a wallet signature
fn sim_signature(parts: &[&[u8]]) -> String {
    let mut out = Vec::with_capacity(SIGNATURE_LEN + 8);
    let mut i = 0u64;

    while out.len() < SIGNATURE_LEN {
        let mut h = DefaultHasher::new();
        parts.hash(&mut h);
        i.hash(&mut h);
        out.extend_from_slice(&h.finish().to_be_bytes());
        i += 1;
    }
    out.truncate(SIGNATURE_LEN);

    format!("0x{}", hex::encode(out))
}

impl AppState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn user(&self, identifier: &str) -> Option<&User> {
        self.users.iter().find(|u| u.identifier == identifier)
    }

    fn user_mut(&mut self, id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    /// User for the current session
    fn session_user(&self) -> Result<&User, String> {
        let s = self.session.as_ref().ok_or("no active session")?;

        self.users
            .iter()
            .find(|u| u.id == s.user_id)
            .ok_or_else(|| "session user not found".to_string())
    }

    /// User id for a fully logged in session
    fn logged_in(&self) -> Result<String, String> {
        match &self.session {
            Some(s) if s.logged_in => Ok(s.user_id.clone()),
            _ => Err("user is not logged in".to_string()),
        }
    }

    /// Wallet owned by the logged in user
    fn wallet(&self, wallet_id: &str) -> Result<&WalletRecord, String> {
        let user_id = self.logged_in()?;

        self.wallets
            .iter()
            .find(|w| w.id == wallet_id && w.user_id.as_deref() == Some(user_id.as_str()))
            .ok_or_else(|| format!("wallet not found: {wallet_id}"))
    }

    fn create_user(&mut self, identifier: &str) -> Result<Value, String> {
        if self.user(identifier).is_some() {
            return Err("user already exists".to_string());
        }

        let id = self.next_id("user");
        let biometrics_id = self.next_id("bio");

        self.users.push(User {
            id: id.clone(),
            identifier: identifier.to_string(),
            biometrics_id,
            verified: false,
            credentials: vec![],
            two_fa: TwoFa::Disabled,
        });
        self.pending = Some(id);

        Ok(Value::Null)
    }

    fn verify(&mut self, code: &str) -> Result<Value, String> {
        let user_id = self.pending.clone().ok_or("no pending verification")?;

        if code != VERIFICATION_CODE {
            return Err("invalid verification code".to_string());
        }

        let user = self.user_mut(&user_id).ok_or("user not found")?;
        user.verified = true;
        let biometrics_id = user.biometrics_id.clone();

        self.session = Some(Session {
            user_id: user_id.clone(),
            logged_in: false,
        });

        Ok(Value::String(format!(
            "https://app.sim.getpara.com/web/biometrics/{biometrics_id}?userId={user_id}"
        )))
    }

    fn generate_passkey(&mut self, args: &[Value]) -> Result<Value, String> {
        let attestation = arg_str(args, 0)?;
        let credential_id = arg_str(args, 2)?;
        let user_handle = arg_str(args, 3)?;
        let biometrics_id = arg_str(args, 4)?;

        if BASE64_URL.decode(attestation).map_or(true, |a| a.is_empty()) {
            return Err("invalid attestation object".to_string());
        }

        let user = self
            .users
            .iter_mut()
            .find(|u| u.biometrics_id == biometrics_id && u.verified)
            .ok_or("unknown biometrics id")?;

        user.credentials.push(Credential {
            id: credential_id.to_string(),
            user_handle: user_handle.to_string(),
        });
        let user_id = user.id.clone();

        self.pending = None;
        self.session = Some(Session {
            user_id,
            logged_in: true,
        });

        Ok(Value::Null)
    }

    fn web_challenge(&mut self) -> Result<Value, String> {
        let challenge: [u8; CHALLENGE_LEN] = rand::random();
        let encoded = b64url(&challenge);

        self.challenge = Some(challenge.to_vec());

        Ok(json!({ "challenge": encoded }))
    }

    fn verify_web_challenge(&mut self, args: &[Value]) -> Result<Value, String> {
        let credential_id = arg_str(args, 0)?;
        let client_data = arg_str(args, 2)?;
        let signature = arg_str(args, 3)?;

        let challenge = self.challenge.take().ok_or("no challenge issued")?;

        let client_data = BASE64_URL
            .decode(client_data)
            .map_err(|_| "invalid client data encoding")?;
        let client_data: Value =
            serde_json::from_slice(&client_data).map_err(|_| "invalid client data")?;

        if client_data.get("challenge").and_then(Value::as_str) != Some(b64url(&challenge).as_str())
        {
            return Err("challenge mismatch".to_string());
        }

        if signature.is_empty() {
            return Err("missing signature".to_string());
        }

        let user = self
            .users
            .iter()
            .find(|u| u.credentials.iter().any(|c| c.id == credential_id))
            .ok_or("unknown credential")?;

        Ok(Value::String(user.id.clone()))
    }

    fn login(&mut self, args: &[Value]) -> Result<Value, String> {
        let user_id = arg_str(args, 0)?;
        let credential_id = arg_str(args, 1)?;
        let user_handle = arg_str(args, 2)?;

        let user = self
            .users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or("unknown user")?;

        let valid = user
            .credentials
            .iter()
            .any(|c| c.id == credential_id && c.user_handle == user_handle);
        if !valid {
            return Err("invalid credential".to_string());
        }

        self.session = Some(Session {
            user_id: user_id.to_string(),
            logged_in: true,
        });

        Ok(Value::Null)
    }

    fn setup_2fa(&mut self) -> Result<Value, String> {
        let user_id = self.logged_in()?;
        let user = self.user_mut(&user_id).ok_or("user not found")?;

        if user.two_fa != TwoFa::Enabled {
            user.two_fa = TwoFa::Pending;
        }

        let secret = hex::encode(user.id.as_bytes());
        Ok(json!({
            "uri": format!("otpauth://totp/Para:{}?secret={}&issuer=Para", user.identifier, secret)
        }))
    }

    fn enable_2fa(&mut self) -> Result<Value, String> {
        let user_id = self.logged_in()?;
        let user = self.user_mut(&user_id).ok_or("user not found")?;

        match user.two_fa {
            TwoFa::Disabled => Err("2FA has not been set up".to_string()),
            _ => {
                user.two_fa = TwoFa::Enabled;
                Ok(Value::Null)
            }
        }
    }

    fn create_wallet(&mut self, args: &[Value]) -> Result<Value, String> {
        let wallet_type: WalletType = arg_str(args, 0)?
            .parse()
            .map_err(|_| "unsupported wallet type")?;
        let _skip_distributable = arg_bool(args, 1)?;

        let user_id = self.logged_in()?;
        let id = self.next_id("wallet");

        let (address, scheme) = match wallet_type {
            WalletType::Evm => {
                let a: [u8; 20] = rand::random();
                (format!("0x{}", hex::encode(a)), "DKLS")
            }
            WalletType::Solana => {
                let a: [u8; 32] = rand::random();
                (hex::encode(a), "ED25519")
            }
            WalletType::Cosmos => {
                let a: [u8; 20] = rand::random();
                (format!("cosmos1{}", hex::encode(a)), "DKLS")
            }
        };
        let public_key: [u8; 32] = rand::random();
        let now = Utc::now();

        debug!("Created {} wallet {} ({})", wallet_type, id, address);

        self.wallets.push(WalletRecord {
            user_id: Some(user_id),
            wallet_type: Some(wallet_type.to_string()),
            key_gen_complete: Some(true),
            scheme: Some(scheme.to_string()),
            created_at: Some(now),
            updated_at: Some(now),
            ..WalletRecord::new(&id, Some("sim"), Some(&address), Some(&hex::encode(public_key)))
        });

        Ok(Value::Null)
    }

    fn fetch_wallets(&self) -> Result<Value, String> {
        let user = self.session_user()?;

        let wallets = self
            .wallets
            .iter()
            .filter(|w| w.user_id.as_deref() == Some(user.id.as_str()))
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?;

        Ok(Value::Array(wallets))
    }

    fn sign_message(&self, args: &[Value]) -> Result<Value, String> {
        let wallet = self.wallet(arg_str(args, 0)?)?;
        let message = STANDARD
            .decode(arg_str(args, 1)?)
            .map_err(|_| "invalid message encoding")?;

        Ok(json!({ "signature": sim_signature(&[wallet.id.as_bytes(), &message]) }))
    }

    fn sign_transaction(&self, args: &[Value]) -> Result<Value, String> {
        let wallet = self.wallet(arg_str(args, 0)?)?;
        let rlp = arg_str(args, 1)?;
        let chain_id = arg_str(args, 2)?;

        if !rlp.starts_with("0x") {
            return Err("transaction must be hex encoded".to_string());
        }

        Ok(json!({
            "signature": sim_signature(&[wallet.id.as_bytes(), rlp.as_bytes(), chain_id.as_bytes()])
        }))
    }

    fn external_wallet_login(&mut self, args: &[Value]) -> Result<Value, String> {
        let address = arg_str(args, 0)?;
        let _wallet_type = arg_str(args, 1)?;

        let user_id = match self.user(address) {
            Some(u) => u.id.clone(),
            None => {
                let id = self.next_id("user");
                let biometrics_id = self.next_id("bio");
                self.users.push(User {
                    id: id.clone(),
                    identifier: address.to_string(),
                    biometrics_id,
                    verified: true,
                    credentials: vec![],
                    two_fa: TwoFa::Disabled,
                });
                id
            }
        };

        self.session = Some(Session {
            user_id,
            logged_in: true,
        });

        Ok(Value::Null)
    }

    /// Signer wallet, which must be owned by the logged in user
    fn signer(&self) -> Result<&WalletRecord, String> {
        let id = self.signer.as_deref().ok_or("signer not initialised")?;
        self.wallet(id)
    }

    fn decode_transaction(encoded: &str) -> Result<Value, String> {
        let json = STANDARD
            .decode(encoded)
            .map_err(|_| "invalid transaction encoding")?;

        match serde_json::from_slice(&json) {
            Ok(v @ Value::Object(_)) => Ok(v),
            _ => Err("invalid transaction".to_string()),
        }
    }
}

impl RemoteApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an application with an existing session for `email`
    pub fn with_session(email: &str, logged_in: bool) -> Self {
        let app = Self::new();

        {
            let mut s = app.state.lock();
            let id = s.next_id("user");
            let biometrics_id = s.next_id("bio");

            s.users.push(User {
                id: id.clone(),
                identifier: email.to_string(),
                biometrics_id,
                verified: true,
                credentials: vec![],
                two_fa: TwoFa::Disabled,
            });
            s.session = Some(Session {
                user_id: id,
                logged_in,
            });
        }

        app
    }

    /// Record an initialisation handshake
    pub fn init(&self, args: InitArgs) {
        debug!("App initialised for {} ({})", args.environment, args.platform);
        self.state.lock().init = Some(args);
    }

    /// Arguments from the most recent initialisation handshake
    pub fn init_args(&self) -> Option<InitArgs> {
        self.state.lock().init.clone()
    }

    /// Check whether a session exists
    pub fn has_session(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Drop persisted session data
    pub fn clear_storage(&self) {
        let mut s = self.state.lock();
        s.session = None;
        s.signer = None;
        s.challenge = None;
    }

    /// Dispatch a remote method
    pub fn handle(&self, method: &str, args: &[Value]) -> Result<Value, String> {
        trace!("Dispatch '{}' {:?}", method, args);

        let mut s = self.state.lock();

        match method {
            "checkIfUserExists" => Ok(Value::Bool(s.user(arg_str(args, 0)?).is_some())),
            "checkIfUserExistsByPhone" => {
                let phone = format!("{}{}", arg_str(args, 1)?, arg_str(args, 0)?);
                Ok(Value::Bool(s.user(&phone).is_some()))
            }
            "createUser" => s.create_user(arg_str(args, 0)?),
            "createUserByPhone" => {
                let phone = format!("{}{}", arg_str(args, 1)?, arg_str(args, 0)?);
                s.create_user(&phone)
            }
            "verifyEmail" | "verifyPhone" => s.verify(arg_str(args, 0)?),
            "resendVerificationCode" => match s.pending {
                Some(_) => Ok(Value::Null),
                None => Err("no pending verification".to_string()),
            },
            "generatePasskeyV2" => s.generate_passkey(args),
            "getWebChallenge" => s.web_challenge(),
            "verifyWebChallenge" => s.verify_web_challenge(args),
            "loginV2" => s.login(args),
            "isSessionActive" => Ok(Value::Bool(s.session.is_some())),
            "isFullyLoggedIn" => Ok(Value::Bool(
                s.session.as_ref().map(|v| v.logged_in).unwrap_or(false),
            )),
            "exportSession" => {
                let session = s.session.as_ref().map(|v| {
                    json!({ "userId": v.user_id, "loggedIn": v.logged_in })
                });
                Ok(Value::String(json!({ "session": session }).to_string()))
            }
            "logout" => {
                s.session = None;
                s.signer = None;
                Ok(Value::Null)
            }
            "setup2FA" => s.setup_2fa(),
            "enable2FA" => s.enable_2fa(),
            "check2FAStatus" => {
                let user = s.session_user()?;
                Ok(json!({ "isSetup": user.two_fa == TwoFa::Enabled }))
            }
            "createWallet" => s.create_wallet(args),
            "fetchWallets" => s.fetch_wallets(),
            "distributeNewWalletShare" => {
                let wallet = s.wallet(arg_str(args, 0)?)?;
                match arg_str(args, 1)? {
                    "" => Err(format!("empty share for wallet {}", wallet.id)),
                    _ => Ok(Value::Null),
                }
            }
            "getEmail" => Ok(Value::String(s.session_user()?.identifier.clone())),
            "signMessage" => s.sign_message(args),
            "signTransaction" => s.sign_transaction(args),
            "externalWalletLogin" => s.external_wallet_login(args),
            "getOAuthURL" => {
                let provider: OAuthProvider = arg_str(args, 0)?
                    .parse()
                    .map_err(|_| "unsupported oauth provider")?;
                let scheme = arg_str(args, 1)?;

                Ok(Value::String(format!(
                    "https://oauth.sim.getpara.com/{provider}?redirect_uri={scheme}://oauth"
                )))
            }
            "initEthersSigner" => {
                let wallet_id = arg_str(args, 0)?;
                if s.wallet(wallet_id)?.kind() != Some(WalletType::Evm) {
                    return Err(format!("wallet {wallet_id} is not an EVM wallet"));
                }
                let _rpc_url = arg_str(args, 1)?;

                s.signer = Some(wallet_id.to_string());
                Ok(Value::Null)
            }
            "ethersSignMessage" => {
                let wallet = s.signer()?;
                let message = arg_str(args, 0)?;

                Ok(Value::String(sim_signature(&[
                    wallet.id.as_bytes(),
                    message.as_bytes(),
                ])))
            }
            "ethersSignTransaction" => {
                let wallet = s.signer()?;
                let tx = AppState::decode_transaction(arg_str(args, 0)?)?;

                Ok(Value::String(sim_signature(&[
                    wallet.id.as_bytes(),
                    tx.to_string().as_bytes(),
                ])))
            }
            "ethersSendTransaction" => {
                let wallet = s.signer()?;
                let tx = AppState::decode_transaction(arg_str(args, 0)?)?;
                let hash = sim_signature(&[tx.to_string().as_bytes()]);

                Ok(json!({
                    "hash": &hash[..66],
                    "from": wallet.address,
                    "to": tx.get("to"),
                }))
            }
            _ => Err(format!("unknown method: {method}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(app: &RemoteApp, method: &str, args: Value) -> Result<Value, String> {
        match args {
            Value::Array(a) => app.handle(method, &a),
            _ => panic!("arguments must be an array"),
        }
    }

    #[test]
    fn signup_verification() {
        let app = RemoteApp::new();

        assert_eq!(
            call(&app, "checkIfUserExists", json!(["a@b.com"])),
            Ok(json!(false))
        );
        call(&app, "createUser", json!(["a@b.com"])).unwrap();
        assert_eq!(
            call(&app, "createUser", json!(["a@b.com"])),
            Err("user already exists".to_string())
        );

        assert!(call(&app, "verifyEmail", json!(["000000"])).is_err());
        let path = call(&app, "verifyEmail", json!([VERIFICATION_CODE])).unwrap();
        assert!(path.as_str().unwrap().contains("/biometrics/bio-"));

        assert_eq!(call(&app, "isSessionActive", json!([])), Ok(json!(true)));
        assert_eq!(call(&app, "isFullyLoggedIn", json!([])), Ok(json!(false)));
    }

    #[test]
    fn wallets_require_login() {
        let app = RemoteApp::with_session("a@b.com", false);
        assert!(call(&app, "createWallet", json!(["EVM", false])).is_err());

        let app = RemoteApp::with_session("a@b.com", true);
        call(&app, "createWallet", json!(["EVM", false])).unwrap();
        assert!(call(&app, "createWallet", json!(["BTC", false])).is_err());

        let wallets = call(&app, "fetchWallets", json!([])).unwrap();
        let wallets: Vec<WalletRecord> = serde_json::from_value(wallets).unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].kind(), Some(WalletType::Evm));
        assert!(wallets[0].created_at.is_some());
    }

    #[test]
    fn signatures_are_deterministic() {
        let a = sim_signature(&[b"w", b"m"]);
        assert_eq!(a, sim_signature(&[b"w", b"m"]));
        assert_ne!(a, sim_signature(&[b"w", b"n"]));
        assert_eq!(a.len(), 2 + SIGNATURE_LEN * 2);
    }

    #[test]
    fn unknown_method() {
        let app = RemoteApp::new();
        assert_eq!(
            call(&app, "mintMoney", json!([])),
            Err("unknown method: mintMoney".to_string())
        );
    }
}
