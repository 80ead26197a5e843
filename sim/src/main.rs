// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{debug, info, LevelFilter};

use para_bridge::{Config, Environment, ParaHandle, WalletType};
use para_bridge_sim::*;

/// Para bridge simulator tool
///
/// Runs client flows against an in-memory simulation of the hosted
/// Para application, useful for exercising the bridge without a web view.
#[derive(Clone, Debug, Parser)]
pub struct Args {
    #[clap(subcommand)]
    cmd: Command,

    /// Environment tier
    #[clap(long = "env", env = "PARA_ENV", default_value = "sandbox")]
    environment: Environment,

    /// Partner API key
    #[clap(long, env = "PARA_API_KEY", default_value = "sim-api-key")]
    api_key: String,

    /// Simulated response latency in milliseconds
    #[clap(long, default_value = "0")]
    latency_ms: u64,

    /// Log level
    #[clap(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: LevelFilter,
}

#[derive(Clone, Debug, PartialEq, Subcommand, strum::Display)]
pub enum Command {
    /// Check whether a user exists
    CheckUser { email: String },
    /// Create and verify a user, registering a passkey
    Signup { email: String },
    /// Sign up, log out and log back in with the registered passkey
    Login { email: String },
    /// Sign up and create a wallet
    Wallets {
        email: String,

        /// Wallet type
        #[clap(long, default_value = "EVM")]
        wallet_type: WalletType,
    },
    /// Sign up, create an EVM wallet and sign a message
    SignMessage { email: String, message: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging
    let _ = simplelog::SimpleLogger::init(args.log_level, simplelog::Config::default());

    debug!("args: {:?}", args);

    // Setup simulated application and host
    let app = Arc::new(RemoteApp::new());
    let host = SimHost::with_options(
        app,
        SimOptions {
            response_delay: Duration::from_millis(args.latency_ms),
            ..Default::default()
        },
    );
    let passkeys = SimPasskeys::new();

    let config = Config::new(args.environment.clone(), &args.api_key);

    info!("Connecting to simulated {} bridge", args.environment);

    let h = ParaHandle::connect(config, host).await?;
    h.ensure_ready().await?;

    info!("Running '{}'", args.cmd);

    match args.cmd {
        Command::CheckUser { email } => {
            let exists = h.check_user_exists(&email).await?;
            println!("{email}: {}", if exists { "exists" } else { "not found" });
        }
        Command::Signup { email } => {
            signup(&h, &passkeys, &email).await?;
            let logged_in = h.is_fully_logged_in().await?;
            println!("Signed up {email} (logged in: {logged_in})");
        }
        Command::Login { email } => {
            signup(&h, &passkeys, &email).await?;
            h.logout().await?;

            h.login(&passkeys).await?;
            println!("Logged in {email} ({})", h.session().state());
        }
        Command::Wallets { email, wallet_type } => {
            signup(&h, &passkeys, &email).await?;
            h.create_wallet(wallet_type, false).await?;

            for w in h.session().wallets() {
                println!(
                    "{} {} {}",
                    w.id,
                    w.wallet_type.as_deref().unwrap_or("UNKNOWN"),
                    w.address.as_deref().unwrap_or("-")
                );
            }
        }
        Command::SignMessage { email, message } => {
            signup(&h, &passkeys, &email).await?;
            h.create_wallet(WalletType::Evm, false).await?;

            let wallet = h
                .session()
                .wallets()
                .into_iter()
                .next()
                .context("no wallet created")?;

            let signature = h.sign_message(&wallet.id, &message).await?;
            println!("{signature}");
        }
    }

    Ok(())
}

/// Create, verify and register a passkey for a new user
async fn signup(
    h: &ParaHandle<SimHost>,
    passkeys: &SimPasskeys,
    email: &str,
) -> anyhow::Result<()> {
    h.create_user(email).await?;

    let biometrics_id = h.verify(VERIFICATION_CODE).await?;
    debug!("Verified {} (biometrics id: {})", email, biometrics_id);

    h.generate_passkey(email, &biometrics_id, passkeys).await?;

    Ok(())
}
