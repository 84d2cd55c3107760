//! Wallet facade over the local ledger
//!
//! Balancing mirrors the wallet SDK it stands in for: the balancing
//! transaction spends a registered NIGHT coin back to its owner and leaves
//! that input unsigned. Callers must re-sign the recipe before finalizing or
//! the ledger rejects the transaction.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use hello_core::keys::DustPublicKey;
use hello_core::{
    sign_transaction_intents, DustRegistration, DustSecretKey, DustSpend, Error as CoreError,
    Intent, IntentMarkers, ProofMarker, Recipe, ShieldedSecretKeys, Transaction, TxId,
    UnshieldedOffer, UnshieldedPublicKey, Utxo, UtxoOutput, DEFAULT_SEGMENT,
};

use crate::context::WalletConfig;
use crate::error::{Result, WalletError};
use crate::facade::{SignFn, WalletFacade};
use crate::local::network::LocalNetwork;
use crate::providers::DEFAULT_TTL_MINUTES;
use crate::state::{DustState, FacadeState, ShieldedState, UnshieldedState};

/// Keys a started facade syncs for
struct Session {
    owner: UnshieldedPublicKey,
    shielded: ShieldedState,
    dust_public_key: DustPublicKey,
    dust_address: String,
}

pub struct LocalWalletFacade {
    network: LocalNetwork,
    config: WalletConfig,
    receiver: watch::Receiver<FacadeState>,
    /// Moves into the sync task on start; dropping it closes the state stream
    sender: Mutex<Option<watch::Sender<FacadeState>>>,
    session: Mutex<Option<Arc<Session>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| WalletError::Stopped)
}

impl LocalWalletFacade {
    pub fn new(network: LocalNetwork, config: WalletConfig) -> Self {
        let (sender, receiver) = watch::channel(FacadeState::default());
        Self {
            network,
            config,
            receiver,
            sender: Mutex::new(Some(sender)),
            session: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn session(&self) -> Result<Arc<Session>> {
        lock(&self.session)?.clone().ok_or(WalletError::NotSynced)
    }
}

fn wallet_state(network: &LocalNetwork, session: &Session) -> Result<FacadeState> {
    network.with_ledger(|ledger| {
        let snapshot = ledger.snapshot();
        let available_coins = snapshot.coins_of(&session.owner);
        let mut balances = BTreeMap::new();
        for coin in &available_coins {
            *balances.entry(coin.utxo.token_type).or_insert(0) += coin.utxo.value;
        }
        let account = snapshot.dust_account(&session.dust_public_key);

        Ok(FacadeState {
            is_synced: true,
            block_height: snapshot.block_height,
            shielded: Some(session.shielded.clone()),
            unshielded: UnshieldedState {
                balances,
                available_coins,
            },
            dust: Some(DustState {
                dust_address: session.dust_address.clone(),
                public_key: session.dust_public_key,
                backing_night: snapshot.backing_night(&session.dust_public_key),
                generation_started: account.map(|a| a.generation_started),
                spent: account.map_or(0, |a| a.spent),
                params: ledger.params().dust,
            }),
        })
    })
}

/// Publish wallet state on every block and every `interval`
async fn run_sync(
    network: LocalNetwork,
    session: Arc<Session>,
    state_tx: watch::Sender<FacadeState>,
    interval: Duration,
) {
    let mut blocks = network.subscribe_blocks();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = blocks.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        // Snapshot reads hit the filesystem; keep them off the runtime workers
        let (net, sess) = (network.clone(), session.clone());
        match tokio::task::spawn_blocking(move || wallet_state(&net, &sess)).await {
            Ok(Ok(state)) => {
                state_tx.send_replace(state);
            }
            Ok(Err(e)) => warn!("Wallet sync failed: {}", e),
            Err(e) => warn!("Wallet sync task failed: {}", e),
        }
    }
}

/// Fund a wallet that still has no coins after `delay`
async fn auto_fund(network: LocalNetwork, owner: UnshieldedPublicKey, amount: u128, delay: Duration) {
    tokio::time::sleep(delay).await;
    let funded = tokio::task::spawn_blocking(move || match network.coins_of(&owner) {
        Ok(coins) if coins.is_empty() => network.faucet(owner, amount).map(|_| true),
        Ok(_) => Ok(false),
        Err(e) => Err(e),
    })
    .await;
    match funded {
        Ok(Ok(true)) => {}
        Ok(Ok(false)) => debug!("Wallet already funded, skipping devnet faucet"),
        Ok(Err(e)) => warn!("Devnet faucet failed: {}", e),
        Err(e) => warn!("Devnet faucet task failed: {}", e),
    }
}

/// Move the proof marker of a wallet-built transaction to proven
fn prove_wallet_transaction(mut tx: Transaction) -> Result<Transaction> {
    if tx.markers.proof == ProofMarker::PreProof {
        if tx
            .iter_intents()
            .any(|(_, intent)| intent.actions.iter().any(|a| a.is_unproven_call()))
        {
            return Err(WalletError::Proof(
                "contract calls must be proven before finalization".to_string(),
            ));
        }
        tx.set_proof_marker(ProofMarker::Proof);
    }
    Ok(tx)
}

#[async_trait]
impl WalletFacade for LocalWalletFacade {
    fn state(&self) -> watch::Receiver<FacadeState> {
        self.receiver.clone()
    }

    async fn start(&self, shielded: &ShieldedSecretKeys, dust: &DustSecretKey) -> Result<()> {
        let sender = lock(&self.sender)?.take().ok_or(WalletError::Stopped)?;

        let network_id = self.config.dust.network_id;
        let dust_public_key = dust.public_key();
        let session = Arc::new(Session {
            owner: self.config.unshielded.public_key,
            shielded: ShieldedState {
                coin_public_key: shielded.coin_public_key(),
                encryption_public_key: shielded.encryption_public_key()?,
            },
            dust_public_key,
            dust_address: dust_public_key.address(network_id)?,
        });
        *lock(&self.session)? = Some(session.clone());

        let devnet = self.network.devnet();
        let mut tasks = lock(&self.tasks)?;
        if devnet.auto_fund_amount > 0 && self.network.coins_of(&session.owner)?.is_empty() {
            tasks.push(tokio::spawn(auto_fund(
                self.network.clone(),
                session.owner,
                devnet.auto_fund_amount,
                devnet.auto_fund_delay(),
            )));
        }
        tasks.push(tokio::spawn(run_sync(
            self.network.clone(),
            session.clone(),
            sender,
            devnet.sync_interval(),
        )));

        info!("Local wallet syncing for {}", session.owner.to_hex());
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        for task in lock(&self.tasks)?.drain(..) {
            task.abort();
        }
        lock(&self.sender)?.take();
        debug!("Local wallet stopped");
        Ok(())
    }

    async fn balance_unbound_transaction(
        &self,
        tx: Transaction,
        _shielded: &ShieldedSecretKeys,
        dust: &DustSecretKey,
        ttl: DateTime<Utc>,
    ) -> Result<Recipe> {
        if tx.markers.proof != ProofMarker::Proof {
            return Err(WalletError::Proof(
                "only proven transactions can be balanced".to_string(),
            ));
        }

        let session = self.session()?;
        let dust_public_key = dust.public_key();
        let fee = self.network.devnet().base_fee
            + self.config.dust.cost_parameters.additional_fee_overhead;

        let available = self.network.dust_balance(&dust_public_key)?;
        if available < fee {
            return Err(WalletError::InsufficientDust(format!(
                "fee estimate of {} SPECK exceeds balance of {}",
                fee, available
            )));
        }
        let coin = self
            .network
            .with_ledger(|ledger| Ok(ledger.snapshot().backing_coin(&session.owner, &dust_public_key)))?
            .ok_or_else(|| {
                WalletError::InsufficientDust("no NIGHT registered for DUST generation".to_string())
            })?;

        let mut intent = Intent::new(ttl, IntentMarkers::unproven());
        intent.guaranteed_unshielded_offer = Some(UnshieldedOffer::new(
            vec![coin.clone()],
            vec![UtxoOutput {
                value: coin.value,
                owner: coin.owner,
                token_type: coin.token_type,
            }],
        ));
        intent.dust_spends.push(DustSpend {
            dust_public_key,
            fee,
        });

        let segment = tx.next_segment()?;
        let balancing = Transaction::new(tx.network_id, IntentMarkers::unproven())
            .with_intent(segment, intent);
        debug!("Balancing with segment {} paying {} SPECK", segment, fee);

        Ok(Recipe::new(tx).with_balancing(balancing))
    }

    async fn register_night_utxos_for_dust_generation(
        &self,
        utxos: Vec<Utxo>,
        owner: UnshieldedPublicKey,
        dust_address: DustPublicKey,
        sign: SignFn<'_>,
    ) -> Result<Recipe> {
        if utxos.is_empty() {
            return Err(WalletError::InsufficientFunds(
                "no NIGHT UTXOs to register".to_string(),
            ));
        }
        if let Some(foreign) = utxos.iter().find(|u| u.owner != owner) {
            return Err(CoreError::Signing(format!(
                "UTXO owned by {} cannot be registered by {}",
                foreign.owner.to_hex(),
                owner.to_hex()
            ))
            .into());
        }

        let outputs = utxos
            .iter()
            .map(|u| UtxoOutput {
                value: u.value,
                owner: u.owner,
                token_type: u.token_type,
            })
            .collect();
        let ttl = Utc::now() + chrono::Duration::minutes(DEFAULT_TTL_MINUTES);
        let mut intent = Intent::new(ttl, IntentMarkers::unproven());
        intent.guaranteed_unshielded_offer = Some(UnshieldedOffer::new(utxos, outputs));
        intent.dust_registrations.push(DustRegistration {
            night_owner: owner,
            dust_address,
            allow_fee_payment: 0,
        });

        let mut tx = Transaction::new(self.config.unshielded.network_id, IntentMarkers::unproven())
            .with_intent(DEFAULT_SEGMENT, intent);
        sign_transaction_intents(&mut tx, |payload| sign(payload), ProofMarker::PreProof)?;
        Ok(Recipe::new(tx))
    }

    async fn finalize_recipe(&self, recipe: Recipe) -> Result<Transaction> {
        let base = prove_wallet_transaction(recipe.base_transaction)?;
        let merged = match recipe.balancing_transaction {
            Some(balancing) => base.merge(prove_wallet_transaction(balancing)?)?,
            None => base,
        };
        Ok(merged.bind()?)
    }

    async fn submit_transaction(&self, tx: Transaction) -> Result<TxId> {
        let finalized = self.network.submit(&tx)?;
        Ok(finalized.tx_id)
    }
}

impl Drop for LocalWalletFacade {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.get_mut() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}
