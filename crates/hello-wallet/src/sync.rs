//! Waiting on wallet state
//!
//! All waits read the facade's `watch` channel. A throttled wait looks at the
//! latest state at most once per interval, so a burst of updates is folded
//! into one evaluation of the newest snapshot.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::debug;

use crate::error::{Result, WalletError};
use crate::facade::WalletFacade;
use crate::state::FacadeState;

/// Resolve with the first state for which `select` yields a value
pub async fn wait_for_state<T, F>(
    mut rx: watch::Receiver<FacadeState>,
    throttle: Duration,
    mut select: F,
) -> Result<T>
where
    F: FnMut(&FacadeState) -> Option<T>,
{
    loop {
        let selected = select(&rx.borrow_and_update());
        if let Some(value) = selected {
            return Ok(value);
        }

        if !throttle.is_zero() {
            tokio::time::sleep(throttle).await;
        }
        rx.changed()
            .await
            .map_err(|_| WalletError::StateStream("wallet stopped before condition was met".to_string()))?;
    }
}

/// First synced state, without throttling
pub async fn first_synced_state(rx: watch::Receiver<FacadeState>) -> Result<FacadeState> {
    wait_for_state(rx, Duration::ZERO, |s| s.is_synced.then(|| s.clone())).await
}

/// Wait until the wallet reports itself synced
pub async fn wait_for_sync(wallet: &dyn WalletFacade, throttle: Duration) -> Result<FacadeState> {
    let state = wait_for_state(wallet.state(), throttle, |s| s.is_synced.then(|| s.clone())).await?;
    debug!("Wallet synced at block {}", state.block_height);
    Ok(state)
}

/// Wait for a positive unshielded NIGHT balance and return it
pub async fn wait_for_funds(wallet: &dyn WalletFacade, throttle: Duration) -> Result<u128> {
    wait_for_state(wallet.state(), throttle, |s| {
        if !s.is_synced {
            return None;
        }
        let balance = s.unshielded.night_balance();
        (balance > 0).then_some(balance)
    })
    .await
}

/// DUST balance of the first synced state, evaluated now
pub async fn get_dust_balance(wallet: &dyn WalletFacade) -> Result<u128> {
    let state = first_synced_state(wallet.state()).await?;
    Ok(state.dust_balance(Utc::now()))
}

/// Wait for a synced state with spendable DUST
pub async fn wait_for_dust(wallet: &dyn WalletFacade, throttle: Duration) -> Result<u128> {
    wait_for_state(wallet.state(), throttle, |s| {
        if !s.is_synced {
            return None;
        }
        let balance = s.dust_balance(Utc::now());
        (balance > 0).then_some(balance)
    })
    .await
}
