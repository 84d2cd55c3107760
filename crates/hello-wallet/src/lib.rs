//! Hello Wallet - wallet setup, providers, and the Hello contract API
//!
//! A session derives keys from a seed, starts a [`WalletFacade`], waits for
//! funds and DUST, then deploys or joins the Hello contract through a
//! [`HelloProviders`] set. [`local::LocalNetwork`] provides a self-contained
//! devnet backend.

pub mod addresses;
pub mod config;
pub mod context;
pub mod contract;
pub mod dust;
pub mod error;
pub mod facade;
pub mod local;
pub mod providers;
pub mod state;
pub mod sync;

pub use addresses::{get_wallet_addresses, WalletAddresses};
pub use config::{AppConfig, ContractConfig, DevnetConfig, NetworkConfig, SyncConfig};
pub use context::{build_wallet_config, create_wallet, generate_new_seed, WalletConfig, WalletContext};
pub use contract::{
    deploy_hello_contract, join_hello_contract, read_message, store_message, DeployTxData,
    DeployedHelloContract, HelloPrivateState, HELLO_PRIVATE_STATE_ID,
};
pub use dust::{register_for_dust, DustProgress};
pub use error::{Result, WalletError};
pub use facade::{SignFn, WalletBackend, WalletFacade};
pub use providers::{create_providers, FinalizedTxData, HelloProviders};
pub use state::{DustParameters, FacadeState};
pub use sync::{get_dust_balance, wait_for_dust, wait_for_funds, wait_for_sync};
