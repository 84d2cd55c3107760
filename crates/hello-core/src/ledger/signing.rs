//! Intent re-signing applied to balancing recipes
//!
//! Wallet balancing can hand back unshielded offers whose inputs are missing
//! signatures. Before finalization every intent is rebuilt from its serialized
//! form, signed once over its segment-specific payload, and that signature
//! fills every empty input slot of both unshielded offers. Existing signatures
//! are kept as they are.

use tracing::debug;

use crate::error::Result;
use crate::ledger::intent::Intent;
use crate::ledger::markers::{BindingState, ProofMarker, SignatureKind};
use crate::ledger::offer::UnshieldedOffer;
use crate::ledger::transaction::{Recipe, Transaction};
use crate::types::{SegmentId, Signature};

/// Sign every unshielded input of every intent in `tx`
///
/// `sign` is called exactly once per intent. Errors from deserialization or
/// signing are returned as-is; segments already processed stay replaced, so
/// the caller must discard the transaction and balance again.
pub fn sign_transaction_intents<F>(
    tx: &mut Transaction,
    mut sign: F,
    proof_marker: ProofMarker,
) -> Result<()>
where
    F: FnMut(&[u8]) -> Result<Signature>,
{
    let Some(intents) = tx.intents.as_mut() else {
        return Ok(());
    };
    if intents.is_empty() {
        return Ok(());
    }

    let segments: Vec<SegmentId> = intents.keys().copied().collect();
    for segment in segments {
        let Some(intent) = intents.get(&segment) else {
            continue;
        };

        let mut cloned = Intent::deserialize(
            SignatureKind::Signature,
            proof_marker,
            BindingState::PreBinding,
            &intent.serialize(),
        )?;
        let payload = cloned.signature_data(segment)?;
        let signature = sign(&payload)?;

        if let Some(offer) = cloned.fallible_unshielded_offer.as_ref() {
            cloned.fallible_unshielded_offer = Some(fill_signatures(offer, &signature)?);
        }
        if let Some(offer) = cloned.guaranteed_unshielded_offer.as_ref() {
            cloned.guaranteed_unshielded_offer = Some(fill_signatures(offer, &signature)?);
        }

        debug!(segment, proof = %proof_marker, "re-signed intent");
        intents.insert(segment, cloned);
    }

    Ok(())
}

/// Sign the base transaction (proven) and, if present, the balancing transaction (unproven)
pub fn sign_recipe<F>(recipe: &mut Recipe, mut sign: F) -> Result<()>
where
    F: FnMut(&[u8]) -> Result<Signature>,
{
    sign_transaction_intents(&mut recipe.base_transaction, &mut sign, ProofMarker::Proof)?;
    if let Some(balancing) = recipe.balancing_transaction.as_mut() {
        sign_transaction_intents(balancing, &mut sign, ProofMarker::PreProof)?;
    }
    Ok(())
}

fn fill_signatures(offer: &UnshieldedOffer, fallback: &Signature) -> Result<UnshieldedOffer> {
    let signatures = (0..offer.inputs.len())
        .map(|i| offer.signature_at(i).copied().unwrap_or(*fallback))
        .collect();
    offer.add_signatures(signatures)
}
