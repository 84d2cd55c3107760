//! Indexer and prover stand-ins for the local devnet

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use hello_core::{ContractAction, ContractAddress, ContractState, ProofMarker, Transaction, TxId};

use crate::error::{Result, WalletError};
use crate::local::network::LocalNetwork;
use crate::providers::{FinalizedTxData, ProofProvider, PublicDataProvider, ZkConfigProvider};

/// Reads contract state and transaction status straight from the ledger
pub struct LocalPublicDataProvider {
    network: LocalNetwork,
}

impl LocalPublicDataProvider {
    pub fn new(network: LocalNetwork) -> Self {
        Self { network }
    }
}

#[async_trait]
impl PublicDataProvider for LocalPublicDataProvider {
    async fn query_contract_state(&self, address: &ContractAddress) -> Result<Option<ContractState>> {
        self.network.contract_state(address)
    }

    async fn query_deploy_tx_data(
        &self,
        address: &ContractAddress,
    ) -> Result<Option<FinalizedTxData>> {
        self.network.deploy_tx(address)
    }

    /// The local ledger includes transactions on submission, so an unknown id
    /// was never accepted
    async fn watch_for_tx_data(&self, tx_id: &TxId) -> Result<FinalizedTxData> {
        self.network
            .transaction(tx_id)?
            .ok_or_else(|| WalletError::Submission(format!("transaction {} is not on the ledger", tx_id)))
    }
}

/// Attaches call proofs once the circuit's prover key is available
pub struct LocalProofProvider {
    zk_config: Arc<dyn ZkConfigProvider>,
    proof_server: String,
}

impl LocalProofProvider {
    pub fn new(zk_config: Arc<dyn ZkConfigProvider>, proof_server: String) -> Self {
        Self {
            zk_config,
            proof_server,
        }
    }
}

#[async_trait]
impl ProofProvider for LocalProofProvider {
    async fn prove_tx(&self, mut tx: Transaction) -> Result<Transaction> {
        if tx.markers.proof == ProofMarker::Proof {
            return Ok(tx);
        }

        let mut proved = 0usize;
        for intent in tx.intents.iter_mut().flat_map(|intents| intents.values_mut()) {
            for action in intent.actions.iter_mut() {
                if let ContractAction::Call {
                    address,
                    entry_point,
                    transcript,
                    proof,
                } = action
                {
                    let prover_key = self.zk_config.get_prover_key(entry_point).await?;
                    if prover_key.is_empty() {
                        return Err(WalletError::Proof(format!(
                            "empty prover key for {}",
                            entry_point
                        )));
                    }
                    *proof = Some(ContractAction::call_commitment(
                        address,
                        entry_point,
                        transcript,
                    ));
                    proved += 1;
                }
            }
        }

        tx.set_proof_marker(ProofMarker::Proof);
        debug!("Proved {} call(s) for {}", proved, self.proof_server);
        Ok(tx)
    }
}
