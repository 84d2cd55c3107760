//! In-process ledger with a JSON snapshot on disk
//!
//! The ledger checks what a node would check before including a transaction:
//! it must be finalized, every unshielded input must be an unspent coin
//! signed by its owner over the intent's signature data, contract calls must
//! carry a matching proof, and fees must be covered by DUST.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hello_core::crypto::tagged_hash;
use hello_core::keys::DustPublicKey;
use hello_core::{
    ContractAction, ContractAddress, ContractState, NetworkId, TokenType, Transaction, TxId,
    UnshieldedPublicKey, Utxo,
};

use crate::error::{Result, WalletError};
use crate::providers::FinalizedTxData;
use crate::state::{AvailableCoin, DustParameters};

/// Fee and DUST parameters of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerParams {
    /// Minimum fee per transaction (in SPECKs)
    pub base_fee: u128,
    pub dust: DustParameters,
}

/// An unspent coin and the DUST address it backs, if registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerUtxo {
    pub utxo: Utxo,
    pub dust_registration: Option<DustPublicKey>,
}

/// A deployed contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub address: ContractAddress,
    pub state: ContractState,
    pub deploy_tx: FinalizedTxData,
}

/// DUST generation and spending of one DUST address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DustAccount {
    pub public_key: DustPublicKey,
    pub generation_started: DateTime<Utc>,
    pub spent: u128,
}

/// Persisted ledger contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub network_id: NetworkId,
    pub block_height: u64,
    pub utxos: Vec<LedgerUtxo>,
    pub contracts: Vec<ContractRecord>,
    pub dust_accounts: Vec<DustAccount>,
    pub transactions: Vec<FinalizedTxData>,
    pub faucet_nonce: u64,
}

impl LedgerSnapshot {
    pub fn new(network_id: NetworkId) -> Self {
        Self {
            network_id,
            block_height: 0,
            utxos: Vec::new(),
            contracts: Vec::new(),
            dust_accounts: Vec::new(),
            transactions: Vec::new(),
            faucet_nonce: 0,
        }
    }

    pub fn contract(&self, address: &ContractAddress) -> Option<&ContractRecord> {
        self.contracts.iter().find(|c| &c.address == address)
    }

    pub fn transaction(&self, tx_id: &TxId) -> Option<&FinalizedTxData> {
        self.transactions.iter().find(|t| &t.tx_id == tx_id)
    }

    pub fn dust_account(&self, public_key: &DustPublicKey) -> Option<&DustAccount> {
        self.dust_accounts.iter().find(|a| &a.public_key == public_key)
    }

    /// Coins owned by `owner`
    pub fn coins_of(&self, owner: &UnshieldedPublicKey) -> Vec<AvailableCoin> {
        self.utxos
            .iter()
            .filter(|u| &u.utxo.owner == owner)
            .map(|u| AvailableCoin {
                utxo: u.utxo.clone(),
                registered_for_dust_generation: u.dust_registration.is_some(),
            })
            .collect()
    }

    /// NIGHT currently backing a DUST address
    pub fn backing_night(&self, public_key: &DustPublicKey) -> u128 {
        self.utxos
            .iter()
            .filter(|u| u.utxo.token_type.is_night() && u.dust_registration.as_ref() == Some(public_key))
            .map(|u| u.utxo.value)
            .sum()
    }

    /// Largest registered NIGHT coin of `owner` backing `public_key`
    pub fn backing_coin(
        &self,
        owner: &UnshieldedPublicKey,
        public_key: &DustPublicKey,
    ) -> Option<Utxo> {
        self.utxos
            .iter()
            .filter(|u| &u.utxo.owner == owner && u.dust_registration.as_ref() == Some(public_key))
            .max_by_key(|u| u.utxo.value)
            .map(|u| u.utxo.clone())
    }

    pub fn dust_balance(&self, public_key: &DustPublicKey, params: &DustParameters, now: DateTime<Utc>) -> u128 {
        let Some(account) = self.dust_account(public_key) else {
            return 0;
        };
        params
            .generated(self.backing_night(public_key), account.generation_started, now)
            .saturating_sub(account.spent)
    }

    fn take_utxo(&mut self, utxo: &Utxo) -> Option<LedgerUtxo> {
        let index = self.utxos.iter().position(|u| &u.utxo == utxo)?;
        Some(self.utxos.remove(index))
    }

    /// Validate `tx` and apply it as the next block
    fn apply(
        &mut self,
        tx: &Transaction,
        params: &LedgerParams,
        now: DateTime<Utc>,
    ) -> Result<FinalizedTxData> {
        let reject = |reason: String| WalletError::Submission(reason);

        if !tx.markers.is_finalized() {
            return Err(reject(format!(
                "expected transaction<{}>, found transaction<{}>",
                hello_core::IntentMarkers::finalized(),
                tx.markers
            )));
        }
        if tx.network_id != self.network_id {
            return Err(reject(format!(
                "transaction for {} submitted to {}",
                tx.network_id, self.network_id
            )));
        }
        if tx.intent_count() == 0 {
            return Err(reject("transaction has no intents".to_string()));
        }

        let tx_id = tx.identifier();
        if self.transaction(&tx_id).is_some() {
            return Err(reject(format!("duplicate transaction {}", tx_id)));
        }

        let block_height = self.block_height + 1;
        let finalized = FinalizedTxData {
            tx_id,
            block_height,
            timestamp: now,
        };

        let mut total_fee = 0u128;
        let mut has_actions = false;
        let mut has_registrations = false;

        for (segment, intent) in tx.iter_intents() {
            if !intent.markers.is_finalized() {
                return Err(reject(format!("intent {} is not finalized", segment)));
            }
            if intent.ttl < now.timestamp() {
                return Err(reject(format!("intent {} expired", segment)));
            }

            let payload = intent.signature_data(segment)?;
            let intent_hash = tagged_hash(
                "midnight:intent-hash",
                &[tx_id.as_bytes(), &segment.to_be_bytes()],
            );
            let mut spent_by: Vec<(UnshieldedPublicKey, Option<DustPublicKey>)> = Vec::new();
            let mut output_no = 0u32;

            for offer in intent.unshielded_offers() {
                for (i, input) in offer.inputs.iter().enumerate() {
                    let signature = offer.signature_at(i).ok_or_else(|| {
                        reject(format!(
                            "missing signature for input {} of segment {}",
                            i, segment
                        ))
                    })?;
                    input.owner.verify(&payload, signature).map_err(|_| {
                        reject(format!(
                            "invalid signature for input {} of segment {}",
                            i, segment
                        ))
                    })?;
                    let spent = self.take_utxo(input).ok_or_else(|| {
                        reject(format!(
                            "input {} of segment {} is not an unspent coin",
                            i, segment
                        ))
                    })?;
                    spent_by.push((input.owner, spent.dust_registration));
                }

                let mut token_types: Vec<TokenType> =
                    offer.outputs.iter().map(|o| o.token_type).collect();
                token_types.sort();
                token_types.dedup();
                for token_type in token_types {
                    if offer.value_out(&token_type) > offer.value_in(&token_type) {
                        return Err(reject(format!(
                            "offer in segment {} creates more {} than it spends",
                            segment,
                            token_type.to_hex()
                        )));
                    }
                }

                for output in &offer.outputs {
                    let registration = intent
                        .dust_registrations
                        .iter()
                        .find(|r| r.night_owner == output.owner)
                        .map(|r| r.dust_address)
                        .or_else(|| {
                            spent_by
                                .iter()
                                .find(|(owner, _)| owner == &output.owner)
                                .and_then(|(_, reg)| *reg)
                        });
                    self.utxos.push(LedgerUtxo {
                        utxo: Utxo {
                            value: output.value,
                            owner: output.owner,
                            token_type: output.token_type,
                            intent_hash,
                            output_no,
                        },
                        dust_registration: registration.filter(|_| output.token_type.is_night()),
                    });
                    output_no += 1;
                }
            }

            for registration in &intent.dust_registrations {
                if !spent_by.iter().any(|(owner, _)| owner == &registration.night_owner) {
                    return Err(reject(format!(
                        "dust registration for {} in segment {} spends none of its coins",
                        registration.night_owner.to_hex(),
                        segment
                    )));
                }
                if self.dust_account(&registration.dust_address).is_none() {
                    self.dust_accounts.push(DustAccount {
                        public_key: registration.dust_address,
                        generation_started: now,
                        spent: 0,
                    });
                }
                has_registrations = true;
            }

            for action in &intent.actions {
                has_actions = true;
                match action {
                    ContractAction::Deploy {
                        address,
                        initial_state,
                    } => {
                        if self.contract(address).is_some() {
                            return Err(reject(format!("contract {} already exists", address)));
                        }
                        self.contracts.push(ContractRecord {
                            address: *address,
                            state: initial_state.clone(),
                            deploy_tx: finalized.clone(),
                        });
                    }
                    ContractAction::Call {
                        address,
                        entry_point,
                        transcript,
                        proof,
                    } => {
                        let expected =
                            ContractAction::call_commitment(address, entry_point, transcript);
                        let record = self
                            .contracts
                            .iter_mut()
                            .find(|c| &c.address == address)
                            .ok_or_else(|| WalletError::ContractNotFound(address.to_hex()))?;
                        if !record.state.has_operation(entry_point) {
                            return Err(reject(format!(
                                "contract {} has no {} circuit",
                                address.short(),
                                entry_point
                            )));
                        }
                        if proof.as_ref() != Some(&expected) {
                            return Err(reject(format!(
                                "invalid proof for call to {}",
                                entry_point
                            )));
                        }
                        record.state.apply(transcript);
                    }
                }
            }

            for spend in &intent.dust_spends {
                let available = self.dust_balance(&spend.dust_public_key, &params.dust, now);
                if available < spend.fee {
                    return Err(WalletError::InsufficientDust(format!(
                        "fee of {} SPECK exceeds balance of {}",
                        spend.fee, available
                    )));
                }
                if let Some(account) = self
                    .dust_accounts
                    .iter_mut()
                    .find(|a| a.public_key == spend.dust_public_key)
                {
                    account.spent += spend.fee;
                }
                total_fee += spend.fee;
            }
        }

        let fee_exempt = has_registrations && !has_actions;
        if !fee_exempt && total_fee < params.base_fee {
            return Err(reject(format!(
                "fee of {} SPECK below required {}",
                total_fee, params.base_fee
            )));
        }

        self.block_height = block_height;
        self.transactions.push(finalized.clone());
        Ok(finalized)
    }
}

/// Exclusive hold on a snapshot's sidecar lock file, released on drop
struct SnapshotLock {
    file: File,
}

impl SnapshotLock {
    fn acquire(snapshot: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path(snapshot))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Could not release ledger lock: {}", e);
        }
    }
}

/// Sidecar lock shared by every process writing the snapshot at `snapshot`
fn lock_path(snapshot: &Path) -> PathBuf {
    snapshot.with_extension("json.lock")
}

/// What the snapshot file looked like when it was last read or written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

/// The ledger plus where (if anywhere) it is persisted
///
/// Several processes may open the same snapshot. Every write takes the
/// sidecar lock, reloads the file, applies its change and saves before
/// releasing it, so concurrent writers serialize instead of overwriting
/// each other's blocks.
pub struct LocalLedger {
    snapshot: LedgerSnapshot,
    params: LedgerParams,
    path: Option<PathBuf>,
    stamp: Option<FileStamp>,
}

impl LocalLedger {
    /// Ledger that lives only in memory
    pub fn in_memory(network_id: NetworkId, params: LedgerParams) -> Self {
        Self {
            snapshot: LedgerSnapshot::new(network_id),
            params,
            path: None,
            stamp: None,
        }
    }

    /// Open the snapshot at `path`, starting a fresh ledger if it does not exist
    pub fn open(path: &Path, network_id: NetworkId, params: LedgerParams) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut ledger = Self {
            snapshot: LedgerSnapshot::new(network_id),
            params,
            path: Some(path.to_path_buf()),
            stamp: None,
        };

        let _lock = SnapshotLock::acquire(path)?;
        if path.exists() {
            ledger.reload()?;
            if ledger.snapshot.network_id != network_id {
                return Err(WalletError::Config(format!(
                    "snapshot {} belongs to {}, not {}",
                    path.display(),
                    ledger.snapshot.network_id,
                    network_id
                )));
            }
            info!(
                "Loaded local ledger at block {} from {}",
                ledger.snapshot.block_height,
                path.display()
            );
        } else {
            ledger.save()?;
            info!("Created local ledger at {}", path.display());
        }

        Ok(ledger)
    }

    pub fn snapshot(&self) -> &LedgerSnapshot {
        &self.snapshot
    }

    pub fn params(&self) -> &LedgerParams {
        &self.params
    }

    pub fn network_id(&self) -> NetworkId {
        self.snapshot.network_id
    }

    pub fn block_height(&self) -> u64 {
        self.snapshot.block_height
    }

    fn reload(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        // Stamp first: a write landing mid-read leaves the stamp stale, not the snapshot
        let stamp = FileStamp::of(path)?;
        let content = std::fs::read_to_string(path)?;
        self.snapshot = serde_json::from_str(&content)?;
        self.stamp = Some(stamp);
        Ok(())
    }

    /// Pick up blocks written by another process sharing the snapshot
    ///
    /// Only re-reads the file when its modification time or size changed
    /// since this handle last read or wrote it.
    pub fn refresh(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        match FileStamp::of(path) {
            Ok(stamp) if Some(stamp) == self.stamp => Ok(()),
            Ok(_) => self.reload(),
            Err(WalletError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Write the snapshot, replacing the previous file atomically
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(&self.snapshot)?)?;
        std::fs::rename(&tmp, path)?;
        self.stamp = FileStamp::of(path).ok();
        Ok(())
    }

    /// Run one read-modify-write against the latest snapshot under the lock
    fn write_block<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let _lock = match self.path.as_deref() {
            Some(path) => Some(SnapshotLock::acquire(path)?),
            None => None,
        };
        if self.path.as_deref().is_some_and(Path::exists) {
            self.reload()?;
        }
        let value = f(self)?;
        self.save()?;
        Ok(value)
    }

    /// Validate and include a transaction; nothing changes if it is rejected
    pub fn submit(&mut self, tx: &Transaction, now: DateTime<Utc>) -> Result<FinalizedTxData> {
        let finalized = self.write_block(|ledger| {
            let mut next = ledger.snapshot.clone();
            let finalized = next.apply(tx, &ledger.params, now)?;
            ledger.snapshot = next;
            Ok(finalized)
        })?;
        info!(
            "Included transaction {} in block {}",
            finalized.tx_id, finalized.block_height
        );
        Ok(finalized)
    }

    /// Mint NIGHT to `owner` in a new block
    pub fn faucet(&mut self, owner: UnshieldedPublicKey, amount: u128, now: DateTime<Utc>) -> Result<Utxo> {
        let utxo = self.write_block(|ledger| {
            let snapshot = &mut ledger.snapshot;
            let nonce = snapshot.faucet_nonce;
            let intent_hash = tagged_hash("midnight:faucet", &[&nonce.to_be_bytes()]);
            let utxo = Utxo {
                value: amount,
                owner,
                token_type: TokenType::night(),
                intent_hash,
                output_no: 0,
            };

            snapshot.faucet_nonce += 1;
            snapshot.block_height += 1;
            snapshot.utxos.push(LedgerUtxo {
                utxo: utxo.clone(),
                dust_registration: None,
            });
            snapshot.transactions.push(FinalizedTxData {
                tx_id: TxId::new(intent_hash),
                block_height: snapshot.block_height,
                timestamp: now,
            });
            Ok(utxo)
        })?;

        info!("Faucet sent {} STAR to {}", amount, owner.to_hex());
        Ok(utxo)
    }

    pub fn dust_balance(&self, public_key: &DustPublicKey, now: DateTime<Utc>) -> u128 {
        self.snapshot.dust_balance(public_key, &self.params.dust, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hello_core::contract::hello;
    use hello_core::{
        DustRegistration, DustSpend, Intent, IntentMarkers, ProofMarker, UnshieldedKeystore,
        UnshieldedOffer, UtxoOutput, DEFAULT_SEGMENT,
    };
    use tempfile::TempDir;

    const PARAMS: LedgerParams = LedgerParams {
        base_fee: 1_000,
        dust: DustParameters {
            night_dust_ratio: 5_000_000_000,
            generation_rate: 1_000_000,
        },
    };

    fn keystore() -> UnshieldedKeystore {
        UnshieldedKeystore::new(&[0x11; 32], NetworkId::Undeployed).unwrap()
    }

    fn finalize(tx: Transaction) -> Transaction {
        let mut tx = tx;
        tx.set_proof_marker(ProofMarker::Proof);
        tx.bind().unwrap()
    }

    fn registration_tx(
        keystore: &UnshieldedKeystore,
        coin: &Utxo,
        dust: DustPublicKey,
        now: DateTime<Utc>,
    ) -> Transaction {
        let mut intent = Intent::new(now + Duration::minutes(5), IntentMarkers::unproven());
        intent.guaranteed_unshielded_offer = Some(UnshieldedOffer::new(
            vec![coin.clone()],
            vec![UtxoOutput {
                value: coin.value,
                owner: coin.owner,
                token_type: coin.token_type,
            }],
        ));
        intent.dust_registrations.push(DustRegistration {
            night_owner: keystore.public_key(),
            dust_address: dust,
            allow_fee_payment: 0,
        });
        let mut tx = Transaction::new(NetworkId::Undeployed, IntentMarkers::unproven())
            .with_intent(DEFAULT_SEGMENT, intent);
        hello_core::sign_transaction_intents(
            &mut tx,
            |payload| keystore.sign_data(payload),
            ProofMarker::PreProof,
        )
        .unwrap();
        finalize(tx)
    }

    #[test]
    fn test_faucet_and_registration() {
        let now = Utc::now();
        let keystore = keystore();
        let dust = DustPublicKey([9; 32]);
        let mut ledger = LocalLedger::in_memory(NetworkId::Undeployed, PARAMS);

        let coin = ledger.faucet(keystore.public_key(), 500, now).unwrap();
        assert_eq!(ledger.block_height(), 1);
        assert_eq!(ledger.dust_balance(&dust, now), 0);

        ledger
            .submit(&registration_tx(&keystore, &coin, dust, now), now)
            .unwrap();
        let coins = ledger.snapshot().coins_of(&keystore.public_key());
        assert_eq!(coins.len(), 1);
        assert!(coins[0].registered_for_dust_generation);
        assert_eq!(ledger.snapshot().backing_night(&dust), 500);
        assert_eq!(
            ledger.dust_balance(&dust, now + Duration::seconds(2)),
            500 * 1_000_000 * 2
        );
    }

    #[test]
    fn test_unsigned_input_rejected() {
        let now = Utc::now();
        let keystore = keystore();
        let mut ledger = LocalLedger::in_memory(NetworkId::Undeployed, PARAMS);
        let coin = ledger.faucet(keystore.public_key(), 500, now).unwrap();

        let mut tx = registration_tx(&keystore, &coin, DustPublicKey([9; 32]), now);
        if let Some(intents) = tx.intents.as_mut() {
            for intent in intents.values_mut() {
                if let Some(offer) = intent.guaranteed_unshielded_offer.as_mut() {
                    offer.signatures.clear();
                }
            }
        }

        let err = ledger.submit(&tx, now).unwrap_err();
        assert!(err.to_string().contains("missing signature for input 0 of segment 1"));
        assert_eq!(ledger.block_height(), 1);
        assert_eq!(ledger.snapshot().utxos.len(), 1);
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let now = Utc::now();
        let owner = keystore();
        let thief = UnshieldedKeystore::new(&[0x22; 32], NetworkId::Undeployed).unwrap();
        let mut ledger = LocalLedger::in_memory(NetworkId::Undeployed, PARAMS);
        let coin = ledger.faucet(owner.public_key(), 500, now).unwrap();

        let tx = registration_tx(&thief, &coin, DustPublicKey([9; 32]), now);
        let err = ledger.submit(&tx, now).unwrap_err();
        assert!(err.to_string().contains("invalid signature"));
    }

    #[test]
    fn test_unfinalized_rejected() {
        let now = Utc::now();
        let mut ledger = LocalLedger::in_memory(NetworkId::Undeployed, PARAMS);
        let tx = Transaction::new(NetworkId::Undeployed, IntentMarkers::proven())
            .with_intent(1, Intent::new(now, IntentMarkers::proven()));
        assert!(matches!(
            ledger.submit(&tx, now),
            Err(WalletError::Submission(_))
        ));
    }

    #[test]
    fn test_deploy_requires_fee_and_call_requires_proof() {
        let now = Utc::now();
        let keystore = keystore();
        let dust = DustPublicKey([9; 32]);
        let mut ledger = LocalLedger::in_memory(NetworkId::Undeployed, PARAMS);
        let coin = ledger.faucet(keystore.public_key(), 500, now).unwrap();
        ledger
            .submit(&registration_tx(&keystore, &coin, dust, now), now)
            .unwrap();

        let address = ContractAddress::derive(&[4; 32]);
        let deploy = |fee: u128| {
            let mut intent = Intent::new(now + Duration::minutes(5), IntentMarkers::unproven());
            intent.actions.push(ContractAction::Deploy {
                address,
                initial_state: hello::initial_state(),
            });
            intent.dust_spends.push(DustSpend {
                dust_public_key: dust,
                fee,
            });
            finalize(
                Transaction::new(NetworkId::Undeployed, IntentMarkers::unproven())
                    .with_intent(DEFAULT_SEGMENT, intent),
            )
        };

        let later = now + Duration::seconds(1);
        let err = ledger.submit(&deploy(10), later).unwrap_err();
        assert!(err.to_string().contains("below required"));
        ledger.submit(&deploy(1_000), later).unwrap();
        assert!(ledger.snapshot().contract(&address).is_some());

        let call = |proof: Option<[u8; 32]>| {
            let mut intent = Intent::new(now + Duration::minutes(5), IntentMarkers::unproven());
            intent.actions.push(ContractAction::Call {
                address,
                entry_point: hello::STORE_MESSAGE.to_string(),
                transcript: hello::store_message("gm"),
                proof,
            });
            intent.dust_spends.push(DustSpend {
                dust_public_key: dust,
                fee: 1_000,
            });
            finalize(
                Transaction::new(NetworkId::Undeployed, IntentMarkers::unproven())
                    .with_intent(DEFAULT_SEGMENT, intent),
            )
        };

        let err = ledger.submit(&call(Some([0; 32])), later).unwrap_err();
        assert!(err.to_string().contains("invalid proof"));

        let commitment = ContractAction::call_commitment(
            &address,
            hello::STORE_MESSAGE,
            &hello::store_message("gm"),
        );
        ledger.submit(&call(Some(commitment)), later).unwrap();
        let state = &ledger.snapshot().contract(&address).unwrap().state;
        assert_eq!(hello::ledger(state).unwrap().message.as_deref(), Some("gm"));
    }

    #[test]
    fn test_snapshot_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("devnet.json");
        let now = Utc::now();

        let mut ledger = LocalLedger::open(&path, NetworkId::Undeployed, PARAMS).unwrap();
        ledger.faucet(keystore().public_key(), 42, now).unwrap();

        let reopened = LocalLedger::open(&path, NetworkId::Undeployed, PARAMS).unwrap();
        assert_eq!(reopened.block_height(), 1);
        assert_eq!(reopened.snapshot().coins_of(&keystore().public_key())[0].utxo.value, 42);

        assert!(matches!(
            LocalLedger::open(&path, NetworkId::PreProd, PARAMS),
            Err(WalletError::Config(_))
        ));
    }

    #[test]
    fn test_stale_handle_writes_on_latest_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("devnet.json");
        let owner = keystore().public_key();
        let now = Utc::now();

        let mut first = LocalLedger::open(&path, NetworkId::Undeployed, PARAMS).unwrap();
        let mut second = LocalLedger::open(&path, NetworkId::Undeployed, PARAMS).unwrap();
        let a = first.faucet(owner, 1, now).unwrap();
        // `second` still holds the empty snapshot in memory
        let b = second.faucet(owner, 2, now).unwrap();
        assert_ne!(a.intent_hash, b.intent_hash);

        let reopened = LocalLedger::open(&path, NetworkId::Undeployed, PARAMS).unwrap();
        assert_eq!(reopened.block_height(), 2);
        assert_eq!(reopened.snapshot().coins_of(&owner).len(), 2);
        assert!(lock_path(&path).exists());
    }
}
