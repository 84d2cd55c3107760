//! User-facing addresses of a wallet

use hello_core::address::{AddressKind, MidnightAddress};
use hello_core::{NetworkId, UnshieldedKeystore};

use crate::error::{Result, WalletError};
use crate::state::FacadeState;

/// Addresses and NIGHT balance shown after wallet setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAddresses {
    pub shielded: String,
    pub unshielded: String,
    pub dust: String,
    /// Unshielded NIGHT balance in STARs
    pub balance: u128,
}

/// Collect addresses from a synced state
pub fn get_wallet_addresses(
    state: &FacadeState,
    keystore: &UnshieldedKeystore,
) -> Result<WalletAddresses> {
    let network_id: NetworkId = keystore.network_id();
    let shielded = state.shielded.as_ref().ok_or(WalletError::NotSynced)?;
    let dust = state.dust.as_ref().ok_or(WalletError::NotSynced)?;

    let mut shielded_data = shielded.coin_public_key.0.to_vec();
    shielded_data.extend_from_slice(&shielded.encryption_public_key.0);

    Ok(WalletAddresses {
        shielded: MidnightAddress::new(AddressKind::Shielded, network_id, shielded_data).encode()?,
        unshielded: keystore.bech32_address()?,
        dust: dust.dust_address.clone(),
        balance: state.unshielded.night_balance(),
    })
}
