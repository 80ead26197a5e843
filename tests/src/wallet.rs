// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Wallet management flows

use anyhow::{ensure, Context};
use log::info;

use para_bridge::{ParaHandle, ScriptHost, SessionState, WalletRecord, WalletType};

/// Create a wallet for the logged in user, returning the new record
pub async fn create<H: ScriptHost>(
    h: &ParaHandle<H>,
    wallet_type: WalletType,
) -> anyhow::Result<WalletRecord> {
    let before = h.fetch_wallets().await?;

    h.create_wallet(wallet_type, false).await?;

    // Session wallets are refreshed on creation
    let wallets = h.session().wallets();
    ensure!(
        wallets.len() == before.len() + 1,
        "expected {} wallets, found {}",
        before.len() + 1,
        wallets.len()
    );
    ensure!(
        h.session().state() == SessionState::ActiveLoggedIn,
        "unexpected session state: {}",
        h.session().state()
    );
    ensure!(
        wallets == h.fetch_wallets().await?,
        "session wallets out of date"
    );

    let w = wallets
        .into_iter()
        .find(|w| !before.iter().any(|b| b.id == w.id))
        .context("new wallet not found")?;

    info!(
        "created wallet: '{}' ({:?}, {:?})",
        w.id, w.wallet_type, w.address
    );

    ensure!(
        w.kind() == Some(wallet_type),
        "unexpected wallet type: {:?}",
        w.wallet_type
    );
    ensure!(w.address.is_some(), "wallet missing address");

    Ok(w)
}

/// Create a wallet and distribute its user share
pub async fn test<H: ScriptHost>(
    h: &ParaHandle<H>,
    wallet_type: WalletType,
    email: &str,
) -> anyhow::Result<()> {
    let w = create(h, wallet_type).await?;

    h.distribute_new_wallet_share(&w.id, "user-share").await?;

    let e = h.get_email().await?;
    ensure!(e == email, "unexpected email: {e}");

    Ok(())
}
