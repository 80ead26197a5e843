// Copyright (c) 2022-2023 The MobileCoin Foundation

//! End-to-end flows for Para bridge clients.
//!
//! Generic over [para_bridge::ScriptHost] and [para_bridge::PasskeyProvider]
//! for reuse against simulated or platform hosts.
//!

pub mod auth;

pub mod wallet;

pub mod signing;
