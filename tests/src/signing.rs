// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Message and transaction signing flows

use anyhow::ensure;
use log::info;

use para_bridge::{EvmTransaction, ParaHandle, ScriptHost};

/// Sign a message and transaction with the provided wallet
pub async fn test<H: ScriptHost>(h: &ParaHandle<H>, wallet_id: &str) -> anyhow::Result<()> {
    let a = h.sign_message(wallet_id, "hello para").await?;
    info!("message signature: '{}'", a);

    ensure!(!a.is_empty(), "empty message signature");

    let b = h.sign_message(wallet_id, "hello para!").await?;
    ensure!(a != b, "signature independent of message");

    let t = h
        .sign_transaction(wallet_id, "0xf86b808504a817c800825208", "1")
        .await?;
    info!("transaction signature: '{}'", t);

    ensure!(!t.is_empty(), "empty transaction signature");

    Ok(())
}

/// Sign and send via the remote EVM signer
pub async fn evm<H: ScriptHost>(
    h: &ParaHandle<H>,
    wallet_id: &str,
    rpc_url: &str,
) -> anyhow::Result<()> {
    let s = h.evm_signer(rpc_url);
    s.select_wallet(wallet_id).await?;

    ensure!(
        s.wallet_id().as_deref() == Some(wallet_id),
        "wallet not selected"
    );

    let sig = s.sign_message("hello evm").await?;
    info!("evm message signature: '{}'", sig);
    ensure!(!sig.is_empty(), "empty evm signature");

    let tx = EvmTransaction {
        to: Some("0x000000000000000000000000000000000000dEaD".to_string()),
        value: Some("1000000000000000".to_string()),
        gas_limit: Some("21000".to_string()),
        chain_id: Some("11155111".to_string()),
        tx_type: Some(2),
        ..Default::default()
    };

    let signed = s.sign_transaction(&tx).await?;
    ensure!(!signed.is_empty(), "empty signed transaction");

    let sent = s.send_transaction(&tx).await?;
    info!("sent transaction: {}", sent);
    ensure!(!sent.is_null(), "empty send response");

    Ok(())
}
