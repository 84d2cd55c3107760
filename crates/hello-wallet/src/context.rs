//! Wallet construction from a seed

use std::sync::Arc;

use tracing::info;

use hello_core::hd::{HdWallet, Role};
use hello_core::{
    generate_random_seed, DustSecretKey, Error as CoreError, NetworkId, ShieldedSecretKeys,
    UnshieldedKeystore, UnshieldedPublicKey,
};

use crate::config::AppConfig;
use crate::error::Result;
use crate::facade::{WalletBackend, WalletFacade};

/// Fee overhead added to every DUST fee estimate (in SPECKs)
pub const ADDITIONAL_FEE_OVERHEAD: u128 = 300_000_000_000_000;

/// Blocks of fee-price headroom kept by the DUST wallet
pub const FEE_BLOCKS_MARGIN: u32 = 5;

/// Indexer endpoints shared by the sub-wallets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConnection {
    pub indexer_http_url: String,
    pub indexer_ws_url: String,
}

/// DUST fee estimation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DustCostParameters {
    pub additional_fee_overhead: u128,
    pub fee_blocks_margin: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldedWalletConfig {
    pub network_id: NetworkId,
    pub indexer: IndexerConnection,
    pub proving_server_url: String,
    pub relay_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnshieldedWalletConfig {
    pub network_id: NetworkId,
    pub indexer: IndexerConnection,
    /// Key the unshielded wallet tracks coins for
    pub public_key: UnshieldedPublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DustWalletConfig {
    pub network_id: NetworkId,
    pub cost_parameters: DustCostParameters,
    pub indexer: IndexerConnection,
    pub proving_server_url: String,
    pub relay_url: String,
}

/// Configuration of the three sub-wallets behind a facade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    pub shielded: ShieldedWalletConfig,
    pub unshielded: UnshieldedWalletConfig,
    pub dust: DustWalletConfig,
}

/// Build the sub-wallet configuration for `public_key` on the configured network
pub fn build_wallet_config(config: &AppConfig, public_key: UnshieldedPublicKey) -> WalletConfig {
    let network = &config.network;
    let indexer = IndexerConnection {
        indexer_http_url: network.indexer.clone(),
        indexer_ws_url: network.indexer_ws.clone(),
    };

    WalletConfig {
        shielded: ShieldedWalletConfig {
            network_id: network.network_id,
            indexer: indexer.clone(),
            proving_server_url: network.proof_server.clone(),
            relay_url: network.relay_url(),
        },
        unshielded: UnshieldedWalletConfig {
            network_id: network.network_id,
            indexer: indexer.clone(),
            public_key,
        },
        dust: DustWalletConfig {
            network_id: network.network_id,
            cost_parameters: DustCostParameters {
                additional_fee_overhead: ADDITIONAL_FEE_OVERHEAD,
                fee_blocks_margin: FEE_BLOCKS_MARGIN,
            },
            indexer,
            proving_server_url: network.proof_server.clone(),
            relay_url: network.relay_url(),
        },
    }
}

/// Everything a session needs to act on behalf of one wallet
pub struct WalletContext {
    pub wallet: Arc<dyn WalletFacade>,
    pub shielded_secret_keys: ShieldedSecretKeys,
    pub dust_secret_key: DustSecretKey,
    pub unshielded_keystore: UnshieldedKeystore,
}

impl std::fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletContext")
            .field("shielded_secret_keys", &self.shielded_secret_keys)
            .field("dust_secret_key", &self.dust_secret_key)
            .field("unshielded_keystore", &self.unshielded_keystore)
            .finish_non_exhaustive()
    }
}

/// Role secrets of account 0, address index 0
struct RoleSecrets {
    zswap: [u8; 32],
    night_external: [u8; 32],
    dust: [u8; 32],
}

fn derive_keys_from_seed(seed_hex: &str) -> Result<RoleSecrets> {
    let seed = hex::decode(seed_hex.trim()).map_err(|_| CoreError::InvalidSeed)?;
    let hd_wallet = HdWallet::from_seed(&seed)?;

    let keys = hd_wallet
        .select_account(0)
        .select_roles(&[Role::Zswap, Role::NightExternal, Role::Dust])
        .derive_keys_at(0)?;
    hd_wallet.clear();

    Ok(RoleSecrets {
        zswap: *keys.get(Role::Zswap)?,
        night_external: *keys.get(Role::NightExternal)?,
        dust: *keys.get(Role::Dust)?,
    })
}

/// Create and start a wallet from a hex seed
pub async fn create_wallet(
    seed_hex: &str,
    backend: &dyn WalletBackend,
    config: &AppConfig,
) -> Result<WalletContext> {
    let secrets = derive_keys_from_seed(seed_hex)?;
    let network_id = backend.network_id();

    let shielded_secret_keys = ShieldedSecretKeys::from_seed(&secrets.zswap)?;
    let dust_secret_key = DustSecretKey::from_seed(&secrets.dust);
    let unshielded_keystore = UnshieldedKeystore::new(&secrets.night_external, network_id)?;

    let wallet_config = build_wallet_config(config, unshielded_keystore.public_key());
    let wallet = backend.build_facade(&wallet_config).await?;
    wallet.start(&shielded_secret_keys, &dust_secret_key).await?;

    info!(
        "Wallet started for {} on {}",
        unshielded_keystore.public_key().to_hex(),
        network_id
    );

    Ok(WalletContext {
        wallet,
        shielded_secret_keys,
        dust_secret_key,
        unshielded_keystore,
    })
}

/// Fresh random seed as hex
pub fn generate_new_seed() -> String {
    hex::encode(generate_random_seed())
}
