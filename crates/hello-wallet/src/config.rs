//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use hello_core::NetworkId;

use crate::error::{Result, WalletError};

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "HELLO_CONFIG";

/// Full client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub contract: ContractConfig,
    pub sync: SyncConfig,
    pub devnet: DevnetConfig,
}

/// Network endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub network_id: NetworkId,

    /// Indexer GraphQL endpoint
    pub indexer: String,

    /// Indexer GraphQL websocket endpoint
    pub indexer_ws: String,

    /// Node RPC endpoint
    pub node: String,

    /// Proof server endpoint
    pub proof_server: String,

    /// Faucet page shown to users waiting for funds
    pub faucet: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network_id: NetworkId::PreProd,
            indexer: "https://indexer.preprod.midnight.network/api/v3/graphql".to_string(),
            indexer_ws: "wss://indexer.preprod.midnight.network/api/v3/graphql/ws".to_string(),
            node: "https://rpc.preprod.midnight.network".to_string(),
            proof_server: "http://127.0.0.1:6300".to_string(),
            faucet: "https://faucet.preprod.midnight.network/".to_string(),
        }
    }
}

impl NetworkConfig {
    /// Node endpoint with its `http` scheme replaced by `ws`
    pub fn relay_url(&self) -> String {
        match self.node.strip_prefix("http") {
            Some(rest) => format!("ws{}", rest),
            None => self.node.clone(),
        }
    }
}

/// Contract asset and private state locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Name of the private state store
    pub private_state_store_name: String,

    /// Directory holding private state stores
    pub private_state_dir: PathBuf,

    /// Compiled contract assets (`keys/`, `zkir/`)
    pub zk_config_path: PathBuf,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            private_state_store_name: "hello-private-state".to_string(),
            private_state_dir: AppConfig::data_dir().join("private-state"),
            zk_config_path: PathBuf::from("contract").join("managed").join("hello"),
        }
    }
}

/// Throttle intervals for wallet state waits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Throttle while waiting for the wallet to sync (milliseconds)
    pub sync_throttle_ms: u64,

    /// Throttle while waiting for faucet funds (milliseconds)
    pub funds_throttle_ms: u64,

    /// Throttle while waiting for DUST generation (milliseconds)
    pub dust_throttle_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_throttle_ms: 5_000,
            funds_throttle_ms: 10_000,
            dust_throttle_ms: 5_000,
        }
    }
}

impl SyncConfig {
    pub fn sync_throttle(&self) -> Duration {
        Duration::from_millis(self.sync_throttle_ms)
    }

    pub fn funds_throttle(&self) -> Duration {
        Duration::from_millis(self.funds_throttle_ms)
    }

    pub fn dust_throttle(&self) -> Duration {
        Duration::from_millis(self.dust_throttle_ms)
    }
}

/// Local devnet parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DevnetConfig {
    /// Ledger snapshot file
    pub snapshot_path: PathBuf,

    /// How often each wallet re-reads the ledger (milliseconds)
    pub sync_interval_ms: u64,

    /// NIGHT (in STARs) credited to a new empty wallet; 0 disables
    pub auto_fund_amount: u128,

    /// Delay before an empty wallet is credited (milliseconds)
    pub auto_fund_delay_ms: u64,

    /// Fee charged per transaction (in SPECKs)
    pub base_fee: u128,

    /// Maximum DUST per STAR of backing NIGHT (in SPECKs)
    pub night_dust_ratio: u128,

    /// DUST generated per STAR per second (in SPECKs)
    pub generation_rate: u128,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            snapshot_path: AppConfig::data_dir().join("devnet.json"),
            sync_interval_ms: 1_000,
            auto_fund_amount: 1_000 * hello_core::STARS_PER_NIGHT,
            auto_fund_delay_ms: 3_000,
            base_fee: 10_000_000_000_000,
            night_dust_ratio: 5_000_000_000,
            generation_rate: 1_000_000_000,
        }
    }
}

impl DevnetConfig {
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn auto_fund_delay(&self) -> Duration {
        Duration::from_millis(self.auto_fund_delay_ms)
    }
}

impl AppConfig {
    /// Per-user data directory for snapshots and private state
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("hello-midnight")
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, then `HELLO_CONFIG`, then defaults
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Create directories if they don't exist
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.contract.private_state_dir)?;
        if let Some(parent) = self.devnet.snapshot_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.contract.private_state_store_name.is_empty() {
            return Err(WalletError::Config(
                "private_state_store_name must not be empty".to_string(),
            ));
        }
        if self.devnet.sync_interval_ms == 0 {
            return Err(WalletError::Config(
                "devnet.sync_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relay_url_replaces_scheme() {
        let network = NetworkConfig::default();
        assert_eq!(network.relay_url(), "wss://rpc.preprod.midnight.network");

        let local = NetworkConfig {
            node: "http://localhost:9944".to_string(),
            ..NetworkConfig::default()
        };
        assert_eq!(local.relay_url(), "ws://localhost:9944");
    }

    #[test]
    fn test_defaults_match_preprod() {
        let config = AppConfig::default();
        assert_eq!(config.network.network_id, NetworkId::PreProd);
        assert_eq!(config.network.proof_server, "http://127.0.0.1:6300");
        assert_eq!(config.contract.private_state_store_name, "hello-private-state");
        assert_eq!(config.sync.sync_throttle(), Duration::from_secs(5));
        assert_eq!(config.sync.funds_throttle(), Duration::from_secs(10));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.network.network_id = NetworkId::Undeployed;
        config.sync.sync_throttle_ms = 10;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.network.network_id, NetworkId::Undeployed);
        assert_eq!(loaded.sync.sync_throttle_ms, 10);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "sync": { "funds_throttle_ms": 1 } }"#).unwrap();

        let loaded = AppConfig::resolve(Some(&path)).unwrap();
        assert_eq!(loaded.sync.funds_throttle_ms, 1);
        assert_eq!(loaded.sync.sync_throttle_ms, 5_000);
        assert_eq!(loaded.network.node, "https://rpc.preprod.midnight.network");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = AppConfig::default();
        config.devnet.sync_interval_ms = 0;
        assert!(matches!(config.validate(), Err(WalletError::Config(_))));
    }
}
