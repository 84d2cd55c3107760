//! Transactions and balancing recipes

use std::collections::BTreeMap;

use bitcode::{Decode, Encode};

use crate::crypto::tagged_hash;
use crate::error::{Error, Result};
use crate::ledger::intent::Intent;
use crate::ledger::markers::{BindingState, IntentMarkers, ProofMarker};
use crate::types::{NetworkId, SegmentId, TxId};

/// Leading bytes of a serialized transaction
pub const TRANSACTION_MAGIC: [u8; 4] = *b"mnT\x01";

/// A ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Transaction {
    pub network_id: NetworkId,
    /// Intents keyed by segment id; `None` for transactions without intents
    pub intents: Option<BTreeMap<SegmentId, Intent>>,
    pub markers: IntentMarkers,
}

impl Transaction {
    pub fn new(network_id: NetworkId, markers: IntentMarkers) -> Self {
        Self {
            network_id,
            intents: None,
            markers,
        }
    }

    pub fn with_intent(mut self, segment: SegmentId, intent: Intent) -> Self {
        self.intents
            .get_or_insert_with(BTreeMap::new)
            .insert(segment, intent);
        self
    }

    pub fn intent_count(&self) -> usize {
        self.intents.as_ref().map_or(0, |i| i.len())
    }

    pub fn intent(&self, segment: SegmentId) -> Option<&Intent> {
        self.intents.as_ref().and_then(|i| i.get(&segment))
    }

    /// Iterate intents in segment order
    pub fn iter_intents(&self) -> impl Iterator<Item = (SegmentId, &Intent)> {
        self.intents
            .iter()
            .flat_map(|intents| intents.iter().map(|(s, i)| (*s, i)))
    }

    /// Next unused segment id (segment 0 is reserved)
    ///
    /// Fails when the highest segment is already `SegmentId::MAX`.
    pub fn next_segment(&self) -> Result<SegmentId> {
        match self.intents.as_ref().and_then(|i| i.keys().next_back()) {
            None => Ok(crate::DEFAULT_SEGMENT),
            Some(last) => last
                .checked_add(1)
                .ok_or_else(|| Error::Ledger(format!("no segment left after {}", last))),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = TRANSACTION_MAGIC.to_vec();
        bytes.extend_from_slice(&bitcode::encode(self));
        bytes
    }

    pub fn deserialize(markers: IntentMarkers, bytes: &[u8]) -> Result<Self> {
        let body = bytes
            .strip_prefix(&TRANSACTION_MAGIC)
            .ok_or_else(|| Error::Deserialization("missing transaction header".to_string()))?;
        let tx: Transaction = bitcode::decode(body)?;
        if tx.markers != markers {
            return Err(Error::Deserialization(format!(
                "expected transaction<{}>, found transaction<{}>",
                markers, tx.markers
            )));
        }
        Ok(tx)
    }

    pub fn identifier(&self) -> TxId {
        TxId::new(tagged_hash("midnight:tx-id", &[&self.serialize()]))
    }

    /// Total DUST fees paid across all intents
    pub fn fees(&self) -> u128 {
        self.iter_intents().map(|(_, i)| i.fees()).sum()
    }

    /// Re-tag the transaction and every intent with a proof marker
    pub fn set_proof_marker(&mut self, proof: ProofMarker) {
        self.markers.proof = proof;
        if let Some(intents) = self.intents.as_mut() {
            for intent in intents.values_mut() {
                intent.markers.proof = proof;
            }
        }
    }

    /// Bind a proven transaction, fixing its contents for submission
    pub fn bind(mut self) -> Result<Self> {
        if self.markers.proof != ProofMarker::Proof {
            return Err(Error::Ledger("cannot bind an unproven transaction".to_string()));
        }
        self.markers.binding = BindingState::Binding;
        if let Some(intents) = self.intents.as_mut() {
            for (segment, intent) in intents.iter_mut() {
                if intent.markers.proof != ProofMarker::Proof {
                    return Err(Error::Ledger(format!(
                        "intent {} is not proven",
                        segment
                    )));
                }
                intent.markers.binding = BindingState::Binding;
            }
        }
        Ok(self)
    }

    /// Combine two transactions with disjoint segments
    pub fn merge(mut self, other: Transaction) -> Result<Self> {
        if self.network_id != other.network_id {
            return Err(Error::Ledger(format!(
                "cannot merge {} transaction into {}",
                other.network_id, self.network_id
            )));
        }
        if self.markers != other.markers {
            return Err(Error::Ledger(format!(
                "cannot merge transaction<{}> into transaction<{}>",
                other.markers, self.markers
            )));
        }
        if let Some(other_intents) = other.intents {
            let intents = self.intents.get_or_insert_with(BTreeMap::new);
            for (segment, intent) in other_intents {
                if intents.contains_key(&segment) {
                    return Err(Error::Ledger(format!(
                        "segment {} present in both transactions",
                        segment
                    )));
                }
                intents.insert(segment, intent);
            }
        }
        Ok(self)
    }
}

/// Output of wallet balancing, to be signed and finalized before submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// The caller's transaction, proven and unbound
    pub base_transaction: Transaction,
    /// Extra transaction added by the wallet to balance the base, not yet proven
    pub balancing_transaction: Option<Transaction>,
}

impl Recipe {
    pub fn new(base_transaction: Transaction) -> Self {
        Self {
            base_transaction,
            balancing_transaction: None,
        }
    }

    pub fn with_balancing(mut self, balancing_transaction: Transaction) -> Self {
        self.balancing_transaction = Some(balancing_transaction);
        self
    }
}
