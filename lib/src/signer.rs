// Copyright (c) 2022-2023 The MobileCoin Foundation

//! EVM signing APIs
//!
//! Signing and submission is performed by an ethers signer within the
//! remote application, bound to a wallet and RPC endpoint via
//! [EvmSigner::select_wallet].

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{decode, handle::ParaHandle, host::ScriptHost, Error};

/// EVM transaction request, absent fields are omitted on the wire
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransaction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_contract_abi: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_contract_function_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_contract_function_args: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_contract_byte_code: Option<String>,

    /// EIP-2718 transaction type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tx_type: Option<u8>,
}

impl EvmTransaction {
    /// Encode as base64 JSON for the remote signer
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }
}

/// Handle to the application's EVM signer
///
/// See [ParaHandle::evm_signer] to create an [EvmSigner]
pub struct EvmSigner<H: ScriptHost> {
    handle: ParaHandle<H>,
    rpc_url: String,
    wallet_id: Arc<Mutex<Option<String>>>,
}

impl<H: ScriptHost> Clone for EvmSigner<H> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            rpc_url: self.rpc_url.clone(),
            wallet_id: self.wallet_id.clone(),
        }
    }
}

impl<H: ScriptHost> ParaHandle<H> {
    /// Create an [EvmSigner] using the provided RPC endpoint
    pub fn evm_signer(&self, rpc_url: &str) -> EvmSigner<H> {
        EvmSigner::new(self.clone(), rpc_url)
    }
}

impl<H: ScriptHost> EvmSigner<H> {
    /// Create a signer over `handle` using the provided JSON-RPC endpoint,
    /// see [EvmSigner::select_wallet] to pick the signing wallet
    pub fn new(handle: ParaHandle<H>, rpc_url: &str) -> Self {
        Self {
            handle,
            rpc_url: rpc_url.to_string(),
            wallet_id: Arc::new(Mutex::new(None)),
        }
    }

    /// RPC endpoint used by the signer
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Currently selected wallet
    pub fn wallet_id(&self) -> Option<String> {
        self.wallet_id.lock().clone()
    }

    /// Bind the remote signer to the provided wallet
    pub async fn select_wallet(&self, wallet_id: &str) -> Result<(), Error<H::Error>> {
        debug!("Selecting EVM wallet {} ({})", wallet_id, self.rpc_url);

        self.handle
            .call("initEthersSigner", &[wallet_id, self.rpc_url.as_str()])
            .await?;

        *self.wallet_id.lock() = Some(wallet_id.to_string());

        Ok(())
    }

    /// Sign a message, returning the signature
    pub async fn sign_message(&self, message: &str) -> Result<String, Error<H::Error>> {
        let v = self.handle.call("ethersSignMessage", &[message]).await?;
        decode::string("ethersSignMessage", &v)
    }

    /// Sign a transaction, returning the signed transaction
    pub async fn sign_transaction(&self, tx: &EvmTransaction) -> Result<String, Error<H::Error>> {
        let encoded = tx
            .encode()
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let v = self.handle.call("ethersSignTransaction", &[encoded]).await?;
        decode::string("ethersSignTransaction", &v)
    }

    /// Sign and submit a transaction, returning the raw response
    pub async fn send_transaction(&self, tx: &EvmTransaction) -> Result<Value, Error<H::Error>> {
        let encoded = tx
            .encode()
            .map_err(|e| Error::Serialization(e.to_string()))?;

        self.handle.call("ethersSendTransaction", &[encoded]).await
    }
}
