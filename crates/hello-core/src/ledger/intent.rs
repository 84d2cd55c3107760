//! Intents: the signable units of a transaction

use bitcode::{Decode, Encode};
use chrono::{DateTime, TimeZone, Utc};

use crate::contract::{ContractState, StateOp};
use crate::crypto::tagged_hash;
use crate::error::{Error, Result};
use crate::keys::DustPublicKey;
use crate::ledger::markers::{BindingState, IntentMarkers, ProofMarker, SignatureKind};
use crate::ledger::offer::UnshieldedOffer;
use crate::types::{ContractAddress, SegmentId, UnshieldedPublicKey};

/// Leading bytes of a serialized intent
pub const INTENT_MAGIC: [u8; 4] = *b"mnI\x01";

/// A contract deployment or call
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum ContractAction {
    Deploy {
        address: ContractAddress,
        initial_state: ContractState,
    },
    Call {
        address: ContractAddress,
        entry_point: String,
        transcript: Vec<StateOp>,
        /// Filled in by the proof provider
        proof: Option<[u8; 32]>,
    },
}

impl ContractAction {
    pub fn address(&self) -> &ContractAddress {
        match self {
            ContractAction::Deploy { address, .. } | ContractAction::Call { address, .. } => {
                address
            }
        }
    }

    /// Value a call's proof must carry to be accepted by the ledger
    pub fn call_commitment(
        address: &ContractAddress,
        entry_point: &str,
        transcript: &[StateOp],
    ) -> [u8; 32] {
        let mut encoded = Vec::new();
        for op in transcript {
            encoded.extend_from_slice(&bitcode::encode(op));
        }
        tagged_hash(
            "midnight:call-proof",
            &[address.as_bytes(), entry_point.as_bytes(), &encoded],
        )
    }

    /// True for calls still waiting on the proof provider
    pub fn is_unproven_call(&self) -> bool {
        matches!(self, ContractAction::Call { proof: None, .. })
    }
}

/// Registration of NIGHT coins for DUST generation
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DustRegistration {
    pub night_owner: UnshieldedPublicKey,
    pub dust_address: DustPublicKey,
    pub allow_fee_payment: u128,
}

/// DUST spent to pay transaction fees
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DustSpend {
    pub dust_public_key: DustPublicKey,
    pub fee: u128,
}

/// A signable unit within a transaction
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Intent {
    /// Expiry as unix seconds
    pub ttl: i64,
    pub guaranteed_unshielded_offer: Option<UnshieldedOffer>,
    pub fallible_unshielded_offer: Option<UnshieldedOffer>,
    pub actions: Vec<ContractAction>,
    pub dust_registrations: Vec<DustRegistration>,
    pub dust_spends: Vec<DustSpend>,
    pub markers: IntentMarkers,
}

impl Intent {
    pub fn new(ttl: DateTime<Utc>, markers: IntentMarkers) -> Self {
        Self {
            ttl: ttl.timestamp(),
            guaranteed_unshielded_offer: None,
            fallible_unshielded_offer: None,
            actions: Vec::new(),
            dust_registrations: Vec::new(),
            dust_spends: Vec::new(),
            markers,
        }
    }

    pub fn ttl(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.ttl, 0).single()
    }

    /// Serialize with the wire magic prefix
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = INTENT_MAGIC.to_vec();
        bytes.extend_from_slice(&bitcode::encode(self));
        bytes
    }

    /// Deserialize, requiring the encoded markers to match the requested ones
    pub fn deserialize(
        signature: SignatureKind,
        proof: ProofMarker,
        binding: BindingState,
        bytes: &[u8],
    ) -> Result<Self> {
        let body = bytes
            .strip_prefix(&INTENT_MAGIC)
            .ok_or_else(|| Error::Deserialization("missing intent header".to_string()))?;
        let intent: Intent = bitcode::decode(body)?;

        let expected = IntentMarkers::new(signature, proof, binding);
        if intent.markers != expected {
            return Err(Error::Deserialization(format!(
                "expected intent<{}>, found intent<{}>",
                expected, intent.markers
            )));
        }
        Ok(intent)
    }

    /// Payload each unshielded input owner signs for this intent
    ///
    /// Independent of signatures and markers, so it is stable across
    /// signing, proving and binding.
    pub fn signature_data(&self, segment: SegmentId) -> Result<Vec<u8>> {
        let mut unsigned = self.clone();
        unsigned.markers = IntentMarkers::unproven();
        for offer in [
            unsigned.guaranteed_unshielded_offer.as_mut(),
            unsigned.fallible_unshielded_offer.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            offer.signatures.clear();
        }
        for action in unsigned.actions.iter_mut() {
            if let ContractAction::Call { proof, .. } = action {
                *proof = None;
            }
        }

        let encoded = bitcode::encode(&unsigned);
        Ok(tagged_hash(
            "midnight:intent-signature",
            &[&segment.to_be_bytes(), &encoded],
        )
        .to_vec())
    }

    /// Offers present on this intent, guaranteed first
    pub fn unshielded_offers(&self) -> impl Iterator<Item = &UnshieldedOffer> {
        self.guaranteed_unshielded_offer
            .iter()
            .chain(self.fallible_unshielded_offer.iter())
    }

    pub fn fees(&self) -> u128 {
        self.dust_spends.iter().map(|s| s.fee).sum()
    }
}
