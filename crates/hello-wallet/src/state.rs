//! Wallet state snapshots published by a [`WalletFacade`](crate::WalletFacade)

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hello_core::keys::{CoinPublicKey, DustPublicKey, EncryptionPublicKey};
use hello_core::{TokenType, Utxo};

/// DUST generation parameters of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DustParameters {
    /// Maximum SPECKs generated per STAR of backing NIGHT
    pub night_dust_ratio: u128,
    /// SPECKs generated per STAR per second
    pub generation_rate: u128,
}

impl DustParameters {
    /// DUST generated by `backing` STARs between `since` and `now`
    pub fn generated(&self, backing: u128, since: DateTime<Utc>, now: DateTime<Utc>) -> u128 {
        let elapsed_ms = (now - since).num_milliseconds().max(0) as u128;
        let cap = backing.saturating_mul(self.night_dust_ratio);
        let accrued = backing
            .saturating_mul(self.generation_rate)
            .saturating_mul(elapsed_ms)
            / 1_000;
        accrued.min(cap)
    }
}

/// An unshielded coin the wallet can spend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableCoin {
    pub utxo: Utxo,
    pub registered_for_dust_generation: bool,
}

/// Shielded sub-wallet state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShieldedState {
    pub coin_public_key: CoinPublicKey,
    pub encryption_public_key: EncryptionPublicKey,
}

/// Unshielded sub-wallet state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnshieldedState {
    pub balances: BTreeMap<TokenType, u128>,
    pub available_coins: Vec<AvailableCoin>,
}

impl UnshieldedState {
    pub fn balance(&self, token_type: &TokenType) -> u128 {
        self.balances.get(token_type).copied().unwrap_or(0)
    }

    pub fn night_balance(&self) -> u128 {
        self.balance(&TokenType::night())
    }
}

/// DUST sub-wallet state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DustState {
    pub dust_address: String,
    pub public_key: DustPublicKey,
    /// NIGHT currently registered to this DUST address
    pub backing_night: u128,
    /// First registration of this DUST address
    pub generation_started: Option<DateTime<Utc>>,
    /// DUST already spent on fees
    pub spent: u128,
    pub params: DustParameters,
}

impl DustState {
    /// Spendable DUST at `now`
    pub fn wallet_balance(&self, now: DateTime<Utc>) -> u128 {
        let Some(since) = self.generation_started else {
            return 0;
        };
        self.params
            .generated(self.backing_night, since, now)
            .saturating_sub(self.spent)
    }
}

/// Combined state of the three sub-wallets
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FacadeState {
    pub is_synced: bool,
    pub block_height: u64,
    pub shielded: Option<ShieldedState>,
    pub unshielded: UnshieldedState,
    pub dust: Option<DustState>,
}

impl FacadeState {
    /// DUST balance at `now`, zero before the DUST wallet reports
    pub fn dust_balance(&self, now: DateTime<Utc>) -> u128 {
        self.dust.as_ref().map_or(0, |d| d.wallet_balance(now))
    }

    /// Coins not yet registered for DUST generation
    pub fn unregistered_coins(&self) -> Vec<Utxo> {
        self.unshielded
            .available_coins
            .iter()
            .filter(|c| c.utxo.token_type.is_night() && !c.registered_for_dust_generation)
            .map(|c| c.utxo.clone())
            .collect()
    }
}
