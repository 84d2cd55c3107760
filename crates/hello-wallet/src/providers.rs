//! Providers the contract API runs on
//!
//! Each concern of a contract interaction (public state, private state, ZK
//! assets, proving, balancing, submission) sits behind its own trait and the
//! set is bundled as [`HelloProviders`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use hello_core::{sign_recipe, ContractAddress, ContractState, NetworkId, Transaction, TxId};

use crate::config::AppConfig;
use crate::context::WalletContext;
use crate::error::{Result, WalletError};
use crate::facade::WalletBackend;
use crate::sync::first_synced_state;

/// Default validity window of a balanced transaction
pub const DEFAULT_TTL_MINUTES: i64 = 30;

/// Public outcome of a transaction included in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedTxData {
    pub tx_id: TxId,
    pub block_height: u64,
    pub timestamp: DateTime<Utc>,
}

/// Indexer queries
#[async_trait]
pub trait PublicDataProvider: Send + Sync {
    /// Current public state of a contract, `None` if nothing is deployed there
    async fn query_contract_state(&self, address: &ContractAddress)
        -> Result<Option<ContractState>>;

    /// The transaction that deployed a contract
    async fn query_deploy_tx_data(
        &self,
        address: &ContractAddress,
    ) -> Result<Option<FinalizedTxData>>;

    /// Wait until a submitted transaction is in a block
    async fn watch_for_tx_data(&self, tx_id: &TxId) -> Result<FinalizedTxData>;
}

/// Local store of contract private states
#[async_trait]
pub trait PrivateStateProvider: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<serde_json::Value>>;

    async fn set(&self, id: &str, state: serde_json::Value) -> Result<()>;

    async fn remove(&self, id: &str) -> Result<()>;
}

/// Compiled circuit assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZkConfig {
    pub circuit_id: String,
    pub prover_key: Vec<u8>,
    pub verifier_key: Vec<u8>,
    pub zkir: Vec<u8>,
}

/// Source of compiled circuit assets
#[async_trait]
pub trait ZkConfigProvider: Send + Sync {
    async fn get_prover_key(&self, circuit_id: &str) -> Result<Vec<u8>>;

    async fn get_verifier_key(&self, circuit_id: &str) -> Result<Vec<u8>>;

    async fn get_zkir(&self, circuit_id: &str) -> Result<Vec<u8>>;

    async fn get(&self, circuit_id: &str) -> Result<ZkConfig> {
        Ok(ZkConfig {
            circuit_id: circuit_id.to_string(),
            prover_key: self.get_prover_key(circuit_id).await?,
            verifier_key: self.get_verifier_key(circuit_id).await?,
            zkir: self.get_zkir(circuit_id).await?,
        })
    }
}

/// Proves contract calls in an unproven transaction
#[async_trait]
pub trait ProofProvider: Send + Sync {
    async fn prove_tx(&self, tx: Transaction) -> Result<Transaction>;
}

/// Wallet operations needed by the contract API
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn network_id(&self) -> NetworkId;

    fn coin_public_key(&self) -> String;

    fn encryption_public_key(&self) -> String;

    /// Balance, sign and finalize a proven transaction
    async fn balance_tx(&self, tx: Transaction, ttl: Option<DateTime<Utc>>) -> Result<Transaction>;
}

/// Transaction submission
#[async_trait]
pub trait MidnightProvider: Send + Sync {
    async fn submit_tx(&self, tx: Transaction) -> Result<TxId>;
}

/// Everything the Hello contract API needs
#[derive(Clone)]
pub struct HelloProviders {
    pub private_state_provider: Arc<dyn PrivateStateProvider>,
    pub public_data_provider: Arc<dyn PublicDataProvider>,
    pub zk_config_provider: Arc<dyn ZkConfigProvider>,
    pub proof_provider: Arc<dyn ProofProvider>,
    pub wallet_provider: Arc<dyn WalletProvider>,
    pub midnight_provider: Arc<dyn MidnightProvider>,
}

/// Wallet and submission provider backed by a [`WalletContext`]
///
/// Balancing re-signs every intent of the recipe before finalizing, since the
/// wallet leaves unshielded inputs of the balancing transaction unsigned.
pub struct WalletAndMidnightProvider {
    ctx: Arc<WalletContext>,
    coin_public_key: String,
    encryption_public_key: String,
}

impl WalletAndMidnightProvider {
    /// Capture the shielded public keys from the first synced state
    pub async fn new(ctx: Arc<WalletContext>) -> Result<Self> {
        let state = first_synced_state(ctx.wallet.state()).await?;
        let shielded = state.shielded.ok_or(WalletError::NotSynced)?;

        Ok(Self {
            coin_public_key: shielded.coin_public_key.to_hex_string(),
            encryption_public_key: shielded.encryption_public_key.to_hex_string(),
            ctx,
        })
    }
}

#[async_trait]
impl WalletProvider for WalletAndMidnightProvider {
    fn network_id(&self) -> NetworkId {
        self.ctx.unshielded_keystore.network_id()
    }

    fn coin_public_key(&self) -> String {
        self.coin_public_key.clone()
    }

    fn encryption_public_key(&self) -> String {
        self.encryption_public_key.clone()
    }

    async fn balance_tx(&self, tx: Transaction, ttl: Option<DateTime<Utc>>) -> Result<Transaction> {
        let ttl = ttl.unwrap_or_else(|| Utc::now() + Duration::minutes(DEFAULT_TTL_MINUTES));
        let mut recipe = self
            .ctx
            .wallet
            .balance_unbound_transaction(
                tx,
                &self.ctx.shielded_secret_keys,
                &self.ctx.dust_secret_key,
                ttl,
            )
            .await?;

        let keystore = &self.ctx.unshielded_keystore;
        sign_recipe(&mut recipe, |payload| keystore.sign_data(payload))?;
        debug!(
            "Signed recipe with {} base and {} balancing intents",
            recipe.base_transaction.intent_count(),
            recipe
                .balancing_transaction
                .as_ref()
                .map_or(0, |tx| tx.intent_count())
        );

        self.ctx.wallet.finalize_recipe(recipe).await
    }
}

#[async_trait]
impl MidnightProvider for WalletAndMidnightProvider {
    async fn submit_tx(&self, tx: Transaction) -> Result<TxId> {
        self.ctx.wallet.submit_transaction(tx).await
    }
}

/// Private states kept as one JSON document per store
pub struct FilePrivateStateProvider {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePrivateStateProvider {
    pub fn new(dir: &Path, store_name: &str) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(format!("{}.json", store_name)),
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, states: &BTreeMap<String, serde_json::Value>) -> Result<()> {
        // Replace in one rename so a crash never leaves a truncated store
        let content = serde_json::to_string_pretty(states)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PrivateStateProvider for FilePrivateStateProvider {
    async fn get(&self, id: &str) -> Result<Option<serde_json::Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(id))
    }

    async fn set(&self, id: &str, state: serde_json::Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut states = self.load().await?;
        states.insert(id.to_string(), state);
        self.store(&states).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut states = self.load().await?;
        if states.remove(id).is_some() {
            self.store(&states).await?;
        }
        Ok(())
    }
}

/// Circuit assets read from a compiled contract directory
pub struct FileZkConfigProvider {
    base: PathBuf,
}

impl FileZkConfigProvider {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    async fn read_asset(&self, relative: PathBuf) -> Result<Vec<u8>> {
        let path = self.base.join(relative);
        tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                WalletError::Config(format!("ZK asset not found: {}", path.display()))
            } else {
                WalletError::Io(e)
            }
        })
    }
}

#[async_trait]
impl ZkConfigProvider for FileZkConfigProvider {
    async fn get_prover_key(&self, circuit_id: &str) -> Result<Vec<u8>> {
        self.read_asset(Path::new("keys").join(format!("{}.prover", circuit_id)))
            .await
    }

    async fn get_verifier_key(&self, circuit_id: &str) -> Result<Vec<u8>> {
        self.read_asset(Path::new("keys").join(format!("{}.verifier", circuit_id)))
            .await
    }

    async fn get_zkir(&self, circuit_id: &str) -> Result<Vec<u8>> {
        self.read_asset(Path::new("zkir").join(format!("{}.bzkir", circuit_id)))
            .await
    }
}

/// Assemble the provider set for a started wallet
pub async fn create_providers(
    ctx: Arc<WalletContext>,
    backend: &dyn WalletBackend,
    config: &AppConfig,
) -> Result<HelloProviders> {
    let wallet_and_midnight = Arc::new(WalletAndMidnightProvider::new(ctx).await?);
    let zk_config_provider: Arc<dyn ZkConfigProvider> =
        Arc::new(FileZkConfigProvider::new(&config.contract.zk_config_path));
    let private_state_provider = Arc::new(FilePrivateStateProvider::new(
        &config.contract.private_state_dir,
        &config.contract.private_state_store_name,
    )?);

    info!(
        "Providers ready (indexer {}, proof server {})",
        config.network.indexer, config.network.proof_server
    );

    Ok(HelloProviders {
        private_state_provider,
        public_data_provider: backend.public_data_provider(&config.network),
        proof_provider: backend.proof_provider(&config.network, zk_config_provider.clone()),
        zk_config_provider,
        wallet_provider: wallet_and_midnight.clone(),
        midnight_provider: wallet_and_midnight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_private_state_roundtrip() {
        let dir = TempDir::new().unwrap();
        let provider = FilePrivateStateProvider::new(dir.path(), "hello-private-state").unwrap();

        assert_eq!(provider.get("helloPrivateState").await.unwrap(), None);
        provider
            .set("helloPrivateState", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(
            provider.get("helloPrivateState").await.unwrap(),
            Some(serde_json::json!({}))
        );

        let reopened = FilePrivateStateProvider::new(dir.path(), "hello-private-state").unwrap();
        assert!(reopened.get("helloPrivateState").await.unwrap().is_some());

        reopened.remove("helloPrivateState").await.unwrap();
        assert_eq!(provider.get("helloPrivateState").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_private_state_write_replaces_file() {
        let dir = TempDir::new().unwrap();
        let provider = FilePrivateStateProvider::new(dir.path(), "hello-private-state").unwrap();

        provider
            .set("a", serde_json::json!({ "n": 1 }))
            .await
            .unwrap();
        provider
            .set("b", serde_json::json!({ "n": 2 }))
            .await
            .unwrap();

        // Only the store itself is left behind
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["hello-private-state.json".to_string()]);

        let stored: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(&std::fs::read_to_string(provider.path()).unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored["b"], serde_json::json!({ "n": 2 }));
    }

    #[tokio::test]
    async fn test_zk_config_layout() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("keys")).unwrap();
        std::fs::create_dir_all(dir.path().join("zkir")).unwrap();
        std::fs::write(dir.path().join("keys/storeMessage.prover"), b"pk").unwrap();
        std::fs::write(dir.path().join("keys/storeMessage.verifier"), b"vk").unwrap();
        std::fs::write(dir.path().join("zkir/storeMessage.bzkir"), b"ir").unwrap();

        let provider = FileZkConfigProvider::new(dir.path());
        let config = provider.get("storeMessage").await.unwrap();
        assert_eq!(config.prover_key, b"pk");
        assert_eq!(config.verifier_key, b"vk");
        assert_eq!(config.zkir, b"ir");
    }

    #[tokio::test]
    async fn test_zk_config_missing_asset() {
        let dir = TempDir::new().unwrap();
        let provider = FileZkConfigProvider::new(dir.path());
        let err = provider.get_prover_key("storeMessage").await.unwrap_err();
        assert!(matches!(err, WalletError::Config(_)));
        assert!(err.to_string().contains("storeMessage.prover"));
    }
}
