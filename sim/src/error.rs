// Copyright (c) 2022-2023 The MobileCoin Foundation

/// Simulator error type
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SimError {
    /// Script could not be evaluated
    #[error("Script rejected: {0}")]
    Script(String),

    /// Script evaluated before a page was loaded
    #[error("No page loaded")]
    NotLoaded,

    /// No passkey registered for the relying party
    #[error("No passkey registered for {0}")]
    NoCredential(String),

    /// Page data could not be cleared
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Platform ceremony cancelled
    #[error("Cancelled by user")]
    Cancelled,
}
