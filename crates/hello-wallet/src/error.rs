//! Error types for wallet and provider operations

use thiserror::Error;

/// Result type alias for wallet operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// Errors that can occur while driving the wallet and contract
#[derive(Debug, Error)]
pub enum WalletError {
    /// Core library error
    #[error("{0}")]
    Core(#[from] hello_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Wallet has not finished syncing
    #[error("Wallet is not synced")]
    NotSynced,

    /// Not enough NIGHT for the requested operation
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Not enough DUST to pay fees
    #[error("Insufficient DUST: {0}")]
    InsufficientDust(String),

    /// Ledger rejected the transaction
    #[error("Transaction rejected: {0}")]
    Submission(String),

    /// No contract at the given address
    #[error("No contract found at {0}")]
    ContractNotFound(String),

    /// Proof generation failed
    #[error("Proof generation failed: {0}")]
    Proof(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wallet state stream closed
    #[error("Wallet state stream closed: {0}")]
    StateStream(String),

    /// Wallet was stopped
    #[error("Wallet has been stopped")]
    Stopped,
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::Serialization(e.to_string())
    }
}
