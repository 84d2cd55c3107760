//! Local single-node devnet
//!
//! A ledger persisted as a JSON snapshot, with a wallet facade and providers
//! that talk to it in-process. The client runs the full create, fund,
//! register, deploy, store and read flow against it without external services.

pub mod facade;
pub mod ledger;
pub mod network;
pub mod providers;

pub use facade::LocalWalletFacade;
pub use ledger::{LedgerParams, LedgerSnapshot, LocalLedger};
pub use network::LocalNetwork;
pub use providers::{LocalProofProvider, LocalPublicDataProvider};
