//! Hello CLI - interactive client for the Hello World contract
//!
//! `run` creates or restores a wallet and deploys or joins a contract,
//! `interact` joins the contract recorded in `deployment.json`, and `faucet`
//! mints devnet NIGHT to an address.

pub mod console;
pub mod deployment;
pub mod error;
pub mod format;
pub mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use hello_core::STARS_PER_NIGHT;
use hello_wallet::local::LocalNetwork;
use hello_wallet::AppConfig;

pub use console::{Console, ScriptedConsole, StdinConsole};
pub use deployment::{Deployment, DEPLOYMENT_FILE};
pub use error::{CliError, Result};
pub use session::{run_full, run_interact};

/// Faucet amount when `--amount` is omitted
pub const DEFAULT_FAUCET_AMOUNT: u128 = 1_000 * STARS_PER_NIGHT;

#[derive(Parser)]
#[command(name = "hello-cli")]
#[command(about = "Store and read messages with the Hello World contract on Midnight", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to $HELLO_CONFIG, then built-in settings)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up a wallet, then deploy or join a contract (default)
    Run {
        /// Where a newly deployed contract is recorded
        #[arg(long, default_value = DEPLOYMENT_FILE)]
        deployment: PathBuf,
    },

    /// Join the contract recorded by a previous `run`
    Interact {
        /// Deployment file to read
        #[arg(long, default_value = DEPLOYMENT_FILE)]
        deployment: PathBuf,
    },

    /// Mint devnet NIGHT to an unshielded address
    Faucet {
        /// Bech32m unshielded address
        address: String,

        /// Amount in STAR
        #[arg(long, default_value_t = DEFAULT_FAUCET_AMOUNT)]
        amount: u128,
    },
}

/// Resolve configuration, open the devnet, and run the selected command
pub async fn run<C: Console>(cli: Cli, console: &mut C) -> Result<()> {
    let config = AppConfig::resolve(cli.config.as_deref())?;
    config.ensure_directories()?;
    let network = LocalNetwork::open(&config)?;

    let command = cli.command.unwrap_or(Commands::Run {
        deployment: PathBuf::from(DEPLOYMENT_FILE),
    });
    match command {
        Commands::Run { deployment } => run_full(console, &network, &config, &deployment).await,
        Commands::Interact { deployment } => {
            run_interact(console, &network, &config, &deployment).await
        }
        Commands::Faucet { address, amount } => {
            let utxo = network.fund_address(&address, amount)?;
            console.println(&format!(
                "Sent {} tNight to {} ({}#{})",
                format::format_balance(amount),
                address.trim(),
                hex::encode(utxo.intent_hash),
                utxo.output_no
            ));
            Ok(())
        }
    }
}
