//! Wallet SDK seam
//!
//! [`WalletFacade`] is the combined shielded, unshielded and DUST wallet a
//! session talks to. [`WalletBackend`] builds facades and the network-side
//! providers for one network.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use hello_core::keys::DustPublicKey;
use hello_core::{
    DustSecretKey, NetworkId, Recipe, ShieldedSecretKeys, Signature, Transaction, TxId,
    UnshieldedPublicKey, Utxo,
};

use crate::config::NetworkConfig;
use crate::context::WalletConfig;
use crate::error::Result;
use crate::providers::{ProofProvider, PublicDataProvider, ZkConfigProvider};
use crate::state::FacadeState;

/// Signing callback handed to the wallet for unshielded inputs
pub type SignFn<'a> = &'a (dyn Fn(&[u8]) -> hello_core::Result<Signature> + Send + Sync);

/// Combined wallet handle
#[async_trait]
pub trait WalletFacade: Send + Sync {
    /// Subscribe to state snapshots
    fn state(&self) -> watch::Receiver<FacadeState>;

    /// Begin syncing with the given secret keys
    async fn start(&self, shielded: &ShieldedSecretKeys, dust: &DustSecretKey) -> Result<()>;

    /// Stop syncing; the state stream closes
    async fn stop(&self) -> Result<()>;

    /// Add a balancing transaction paying fees for `tx`
    ///
    /// `tx` must be proven and unbound. The balancing transaction is not yet
    /// proven.
    async fn balance_unbound_transaction(
        &self,
        tx: Transaction,
        shielded: &ShieldedSecretKeys,
        dust: &DustSecretKey,
        ttl: DateTime<Utc>,
    ) -> Result<Recipe>;

    /// Build a transaction registering `utxos` for DUST generation
    async fn register_night_utxos_for_dust_generation(
        &self,
        utxos: Vec<Utxo>,
        owner: UnshieldedPublicKey,
        dust_address: DustPublicKey,
        sign: SignFn<'_>,
    ) -> Result<Recipe>;

    /// Prove what is left unproven, merge, and bind
    async fn finalize_recipe(&self, recipe: Recipe) -> Result<Transaction>;

    /// Submit a finalized transaction
    async fn submit_transaction(&self, tx: Transaction) -> Result<TxId>;
}

/// A network the client can run against
#[async_trait]
pub trait WalletBackend: Send + Sync {
    fn network_id(&self) -> NetworkId;

    /// Build an unstarted facade for the wallet described by `config`
    async fn build_facade(&self, config: &WalletConfig) -> Result<Arc<dyn WalletFacade>>;

    /// Indexer-side provider for contract state and transaction status
    fn public_data_provider(&self, network: &NetworkConfig) -> Arc<dyn PublicDataProvider>;

    /// Prover for contract calls
    fn proof_provider(
        &self,
        network: &NetworkConfig,
        zk_config: Arc<dyn ZkConfigProvider>,
    ) -> Arc<dyn ProofProvider>;
}
