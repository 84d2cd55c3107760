//! DUST acquisition
//!
//! Fees are paid in DUST, which accrues over time from NIGHT coins registered
//! for generation. A new wallet registers its NIGHT once and then waits for
//! the first DUST to arrive.

use std::time::Duration;

use chrono::Utc;
use tracing::info;

use hello_core::UnshieldedKeystore;

use crate::error::{Result, WalletError};
use crate::facade::WalletFacade;
use crate::sync::{first_synced_state, wait_for_dust};

/// Steps reported while acquiring DUST
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DustProgress {
    /// The wallet already holds DUST; nothing else happens
    AlreadyAvailable(u128),
    /// A registration for this many coins is being submitted
    Registering { coins: usize },
    /// Waiting for generated DUST to show up
    Waiting,
    /// DUST balance once it became positive
    Available(u128),
}

/// Make sure the wallet has DUST, registering NIGHT coins if needed
///
/// Returns the DUST balance observed when the wait ended.
pub async fn register_for_dust<F>(
    wallet: &dyn WalletFacade,
    keystore: &UnshieldedKeystore,
    throttle: Duration,
    mut on_progress: F,
) -> Result<u128>
where
    F: FnMut(&DustProgress),
{
    let state = first_synced_state(wallet.state()).await?;

    let balance = state.dust_balance(Utc::now());
    if balance > 0 {
        on_progress(&DustProgress::AlreadyAvailable(balance));
        return Ok(balance);
    }

    let night_utxos = state.unregistered_coins();
    if !night_utxos.is_empty() {
        let dust = state.dust.as_ref().ok_or(WalletError::NotSynced)?;
        on_progress(&DustProgress::Registering {
            coins: night_utxos.len(),
        });
        info!(
            "Registering {} NIGHT UTXO(s) for dust generation",
            night_utxos.len()
        );

        let sign = |payload: &[u8]| keystore.sign_data(payload);
        let recipe = wallet
            .register_night_utxos_for_dust_generation(
                night_utxos,
                keystore.public_key(),
                dust.public_key,
                &sign,
            )
            .await?;
        let finalized = wallet.finalize_recipe(recipe).await?;
        let tx_id = wallet.submit_transaction(finalized).await?;
        info!("Dust registration submitted in {}", tx_id);
    }

    on_progress(&DustProgress::Waiting);
    let balance = wait_for_dust(wallet, throttle).await?;
    on_progress(&DustProgress::Available(balance));
    Ok(balance)
}
