//! CLI error type

use std::path::PathBuf;

use thiserror::Error;

use hello_wallet::WalletError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Core(#[from] hello_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid deployment file: {0}")]
    Deployment(#[from] serde_json::Error),

    #[error("No {} found! Run `hello-cli run` and deploy a contract first.", .0.display())]
    DeploymentMissing(PathBuf),

    #[error("Input closed")]
    InputClosed,
}
