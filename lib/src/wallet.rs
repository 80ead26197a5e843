// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Wallet records and wallet management APIs

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    decode,
    handle::{ParaHandle, NO_ARGS},
    host::ScriptHost,
    session::SessionState,
    Error,
};

/// Blockchain type of a wallet
#[derive(Copy, Clone, Debug, PartialEq, Eq, strum::Display, strum::EnumString)]
pub enum WalletType {
    #[strum(serialize = "EVM")]
    Evm,
    #[strum(serialize = "SOLANA")]
    Solana,
    #[strum(serialize = "COSMOS")]
    Cosmos,
}

/// Wallet as reported by the application
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub id: String,

    #[serde(default)]
    pub user_id: Option<String>,

    /// Blockchain type tag, see [WalletRecord::kind]
    #[serde(default, rename = "type")]
    pub wallet_type: Option<String>,

    #[serde(default)]
    pub pregen_identifier: Option<String>,

    #[serde(default)]
    pub pregen_identifier_type: Option<String>,

    #[serde(default)]
    pub key_gen_complete: Option<bool>,

    #[serde(default)]
    pub partner_id: Option<String>,

    #[serde(default)]
    pub signer: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub scheme: Option<String>,

    #[serde(default)]
    pub public_key: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WalletRecord {
    /// Create a minimal record
    pub fn new(
        id: &str,
        signer: Option<&str>,
        address: Option<&str>,
        public_key: Option<&str>,
    ) -> Self {
        Self {
            id: id.to_string(),
            user_id: None,
            wallet_type: None,
            pregen_identifier: None,
            pregen_identifier_type: None,
            key_gen_complete: None,
            partner_id: None,
            signer: signer.map(str::to_string),
            address: address.map(str::to_string),
            scheme: None,
            public_key: public_key.map(str::to_string),
            name: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Parsed blockchain type, `None` if absent or unrecognised
    pub fn kind(&self) -> Option<WalletType> {
        self.wallet_type.as_deref().and_then(|t| t.parse().ok())
    }
}

/// Timestamps that fail to parse are treated as absent
fn lenient_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let v = Option::<Value>::deserialize(d)?;

    Ok(v.as_ref()
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

impl<H: ScriptHost> ParaHandle<H> {
    /// Create a wallet of the provided type, refreshing the wallet list
    pub async fn create_wallet(
        &self,
        wallet_type: WalletType,
        skip_distributable: bool,
    ) -> Result<(), Error<H::Error>> {
        self.ensure_ready().await?;

        debug!("Creating {} wallet", wallet_type);

        self.call("createWallet", &(wallet_type.to_string(), skip_distributable))
            .await?;

        let wallets = self.fetch_wallets().await?;
        self.session.set_wallets(wallets);
        self.session.set_state(SessionState::ActiveLoggedIn);

        Ok(())
    }

    /// Fetch wallets for the current user
    pub async fn fetch_wallets(&self) -> Result<Vec<WalletRecord>, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("fetchWallets", NO_ARGS).await?;
        decode::objects("fetchWallets", v)
    }

    /// Distribute the user share for a newly created wallet
    pub async fn distribute_new_wallet_share(
        &self,
        wallet_id: &str,
        user_share: &str,
    ) -> Result<(), Error<H::Error>> {
        self.ensure_ready().await?;

        self.call("distributeNewWalletShare", &(wallet_id, user_share))
            .await?;

        Ok(())
    }

    /// Fetch the email address of the current user
    pub async fn get_email(&self) -> Result<String, Error<H::Error>> {
        self.ensure_ready().await?;

        let v = self.call("getEmail", NO_ARGS).await?;
        decode::string("getEmail", &v)
    }
}
