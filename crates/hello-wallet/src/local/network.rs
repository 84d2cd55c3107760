//! Shared handle to the local ledger
//!
//! Every facade and provider built from one [`LocalNetwork`] sees the same
//! ledger, and block production is broadcast so syncing wallets react
//! without waiting for their next poll.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tracing::info;

use hello_core::address::{AddressKind, MidnightAddress};
use hello_core::keys::DustPublicKey;
use hello_core::{
    ContractAddress, ContractState, Error as CoreError, NetworkId, Transaction, TxId,
    UnshieldedPublicKey, Utxo,
};

use crate::config::{AppConfig, DevnetConfig, NetworkConfig};
use crate::context::WalletConfig;
use crate::error::{Result, WalletError};
use crate::facade::{WalletBackend, WalletFacade};
use crate::local::facade::LocalWalletFacade;
use crate::local::ledger::{LedgerParams, LocalLedger};
use crate::local::providers::{LocalProofProvider, LocalPublicDataProvider};
use crate::providers::{FinalizedTxData, ProofProvider, PublicDataProvider, ZkConfigProvider};
use crate::state::{AvailableCoin, DustParameters};

struct Inner {
    network_id: NetworkId,
    devnet: DevnetConfig,
    ledger: Mutex<LocalLedger>,
    blocks: watch::Sender<u64>,
}

/// Local devnet backend
#[derive(Clone)]
pub struct LocalNetwork {
    inner: Arc<Inner>,
}

impl LocalNetwork {
    /// Open the devnet persisted at `config.devnet.snapshot_path`
    pub fn open(config: &AppConfig) -> Result<Self> {
        let ledger = LocalLedger::open(
            &config.devnet.snapshot_path,
            config.network.network_id,
            Self::ledger_params(&config.devnet),
        )?;
        Ok(Self::from_ledger(ledger, config.devnet.clone()))
    }

    /// Devnet that is discarded when the last handle drops
    pub fn in_memory(config: &AppConfig) -> Self {
        let ledger = LocalLedger::in_memory(
            config.network.network_id,
            Self::ledger_params(&config.devnet),
        );
        Self::from_ledger(ledger, config.devnet.clone())
    }

    fn from_ledger(ledger: LocalLedger, devnet: DevnetConfig) -> Self {
        let (blocks, _) = watch::channel(ledger.block_height());
        Self {
            inner: Arc::new(Inner {
                network_id: ledger.network_id(),
                devnet,
                ledger: Mutex::new(ledger),
                blocks,
            }),
        }
    }

    pub fn ledger_params(devnet: &DevnetConfig) -> LedgerParams {
        LedgerParams {
            base_fee: devnet.base_fee,
            dust: DustParameters {
                night_dust_ratio: devnet.night_dust_ratio,
                generation_rate: devnet.generation_rate,
            },
        }
    }

    pub fn devnet(&self) -> &DevnetConfig {
        &self.inner.devnet
    }

    /// Run `f` against the current ledger and announce any new block
    pub(crate) fn with_ledger<T>(
        &self,
        f: impl FnOnce(&mut LocalLedger) -> Result<T>,
    ) -> Result<T> {
        let mut ledger = self
            .inner
            .ledger
            .lock()
            .map_err(|_| WalletError::Submission("local ledger lock poisoned".to_string()))?;
        ledger.refresh()?;
        let result = f(&mut ledger);
        let height = ledger.block_height();
        drop(ledger);

        self.inner.blocks.send_if_modified(|current| {
            if *current != height {
                *current = height;
                true
            } else {
                false
            }
        });
        result
    }

    /// Block heights as they are produced
    pub fn subscribe_blocks(&self) -> watch::Receiver<u64> {
        self.inner.blocks.subscribe()
    }

    pub fn block_height(&self) -> Result<u64> {
        self.with_ledger(|ledger| Ok(ledger.block_height()))
    }

    pub fn submit(&self, tx: &Transaction) -> Result<FinalizedTxData> {
        self.with_ledger(|ledger| ledger.submit(tx, Utc::now()))
    }

    /// Mint `amount` STARs of NIGHT to `owner`
    pub fn faucet(&self, owner: UnshieldedPublicKey, amount: u128) -> Result<Utxo> {
        self.with_ledger(|ledger| ledger.faucet(owner, amount, Utc::now()))
    }

    /// Mint NIGHT to a bech32m unshielded address of this network
    pub fn fund_address(&self, address: &str, amount: u128) -> Result<Utxo> {
        let decoded = MidnightAddress::decode(address.trim())?;
        if decoded.kind != AddressKind::Unshielded {
            return Err(CoreError::InvalidAddress(format!(
                "{} is not an unshielded address",
                address.trim()
            ))
            .into());
        }
        if decoded.network_id != self.inner.network_id {
            return Err(CoreError::InvalidAddress(format!(
                "address is for {}, devnet runs {}",
                decoded.network_id, self.inner.network_id
            ))
            .into());
        }
        let bytes: [u8; 32] = decoded.data.as_slice().try_into().map_err(|_| {
            CoreError::InvalidAddress(format!("expected 32 key bytes, got {}", decoded.data.len()))
        })?;

        let utxo = self.faucet(UnshieldedPublicKey::new(bytes), amount)?;
        info!("Funded {} with {} STAR", address.trim(), amount);
        Ok(utxo)
    }

    pub fn coins_of(&self, owner: &UnshieldedPublicKey) -> Result<Vec<AvailableCoin>> {
        self.with_ledger(|ledger| Ok(ledger.snapshot().coins_of(owner)))
    }

    pub fn dust_balance(&self, public_key: &DustPublicKey) -> Result<u128> {
        self.with_ledger(|ledger| Ok(ledger.dust_balance(public_key, Utc::now())))
    }

    pub fn contract_state(&self, address: &ContractAddress) -> Result<Option<ContractState>> {
        self.with_ledger(|ledger| {
            Ok(ledger
                .snapshot()
                .contract(address)
                .map(|record| record.state.clone()))
        })
    }

    pub fn deploy_tx(&self, address: &ContractAddress) -> Result<Option<FinalizedTxData>> {
        self.with_ledger(|ledger| {
            Ok(ledger
                .snapshot()
                .contract(address)
                .map(|record| record.deploy_tx.clone()))
        })
    }

    pub fn transaction(&self, tx_id: &TxId) -> Result<Option<FinalizedTxData>> {
        self.with_ledger(|ledger| Ok(ledger.snapshot().transaction(tx_id).cloned()))
    }
}

#[async_trait]
impl WalletBackend for LocalNetwork {
    fn network_id(&self) -> NetworkId {
        self.inner.network_id
    }

    async fn build_facade(&self, config: &WalletConfig) -> Result<Arc<dyn WalletFacade>> {
        if config.unshielded.network_id != self.inner.network_id {
            return Err(WalletError::Config(format!(
                "wallet configured for {}, devnet runs {}",
                config.unshielded.network_id, self.inner.network_id
            )));
        }
        Ok(Arc::new(LocalWalletFacade::new(self.clone(), config.clone())))
    }

    fn public_data_provider(&self, _network: &NetworkConfig) -> Arc<dyn PublicDataProvider> {
        Arc::new(LocalPublicDataProvider::new(self.clone()))
    }

    fn proof_provider(
        &self,
        network: &NetworkConfig,
        zk_config: Arc<dyn ZkConfigProvider>,
    ) -> Arc<dyn ProofProvider> {
        Arc::new(LocalProofProvider::new(zk_config, network.proof_server.clone()))
    }
}
