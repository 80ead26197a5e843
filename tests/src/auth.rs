// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Signup and login flows

use anyhow::ensure;
use log::info;

use para_bridge::{ParaHandle, PasskeyProvider, ScriptHost, SessionState};

/// Create and verify a user by email, registering a passkey,
/// returning the biometrics id
pub async fn signup<H, P>(
    h: &ParaHandle<H>,
    passkeys: &P,
    email: &str,
    code: &str,
) -> anyhow::Result<String>
where
    H: ScriptHost,
    P: PasskeyProvider,
{
    info!("signing up: '{}'", email);

    ensure!(
        !h.check_user_exists(email).await?,
        "user {email} already exists"
    );

    h.create_user(email).await?;
    ensure!(h.check_user_exists(email).await?, "user {email} not created");

    // Verification yields a partial session
    let biometrics_id = h.verify(code).await?;
    info!("biometrics id: '{}'", biometrics_id);

    ensure!(!biometrics_id.is_empty(), "empty biometrics id");
    ensure!(h.is_session_active().await?, "no session after verification");
    ensure!(
        !h.is_fully_logged_in().await?,
        "logged in before passkey registration"
    );

    // Passkey registration completes login
    h.generate_passkey(email, &biometrics_id, passkeys).await?;
    ensure!(
        h.is_fully_logged_in().await?,
        "not logged in after passkey registration"
    );

    Ok(biometrics_id)
}

/// Create and verify a user by phone number, registering a passkey
pub async fn signup_by_phone<H, P>(
    h: &ParaHandle<H>,
    passkeys: &P,
    phone: &str,
    country_code: &str,
    code: &str,
) -> anyhow::Result<()>
where
    H: ScriptHost,
    P: PasskeyProvider,
{
    info!("signing up: '{} {}'", country_code, phone);

    ensure!(
        !h.check_user_exists_by_phone(phone, country_code).await?,
        "user {phone} already exists"
    );

    h.create_user_by_phone(phone, country_code).await?;
    h.resend_verification_code().await?;

    let biometrics_id = h.verify_by_phone(code).await?;
    h.generate_passkey(phone, &biometrics_id, passkeys).await?;

    ensure!(
        h.check_user_exists_by_phone(phone, country_code).await?,
        "user {phone} not created"
    );

    Ok(())
}

/// Log out then log back in with a previously registered passkey
pub async fn relogin<H, P>(h: &ParaHandle<H>, passkeys: &P) -> anyhow::Result<()>
where
    H: ScriptHost,
    P: PasskeyProvider,
{
    let wallets = h.fetch_wallets().await?;

    h.logout().await?;

    ensure!(
        h.session().state() == SessionState::Inactive,
        "session state not cleared on logout"
    );
    ensure!(h.session().wallets().is_empty(), "wallets not cleared");
    ensure!(!h.is_session_active().await?, "session active after logout");

    h.login(passkeys).await?;

    ensure!(
        h.session().state() == SessionState::ActiveLoggedIn,
        "unexpected session state after login: {}",
        h.session().state()
    );
    ensure!(h.is_fully_logged_in().await?, "not logged in");
    ensure!(
        h.session().wallets() == wallets,
        "wallets not restored on login"
    );

    Ok(())
}

/// Enable two-factor authentication for the logged in user
pub async fn two_factor<H: ScriptHost>(h: &ParaHandle<H>) -> anyhow::Result<()> {
    let uri = h.setup_2fa().await?;
    info!("2fa uri: '{}'", uri);

    ensure!(uri.starts_with("otpauth://"), "unexpected 2fa uri: {uri}");
    ensure!(!h.is_2fa_setup().await?, "2fa enabled before confirmation");

    h.enable_2fa().await?;
    ensure!(h.is_2fa_setup().await?, "2fa not enabled");

    Ok(())
}
