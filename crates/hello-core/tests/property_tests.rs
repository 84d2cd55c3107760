//! Property-based tests for hello-core using proptest
//!
//! These tests verify invariants of intent re-signing and the ledger model
//! that should hold for all transactions a wallet can produce.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use hello_core::{
    sign_recipe, sign_transaction_intents, ContractAddress, Intent, IntentMarkers, NetworkId,
    ProofMarker, Recipe, Signature, TokenType, Transaction, UnshieldedKeystore,
    UnshieldedOffer, UnshieldedPublicKey, Utxo, UtxoOutput,
};

// ============================================
// Arbitrary Implementations
// ============================================

fn arb_signature() -> impl Strategy<Value = Signature> {
    (any::<[u8; 32]>(), any::<[u8; 32]>()).prop_map(|(r, s)| {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&r);
        bytes[32..].copy_from_slice(&s);
        Signature::new(bytes)
    })
}

fn arb_utxo() -> impl Strategy<Value = Utxo> {
    (1u128..1_000_000_000, any::<[u8; 32]>(), any::<[u8; 32]>(), 0u32..16).prop_map(
        |(value, owner, intent_hash, output_no)| Utxo {
            value,
            owner: UnshieldedPublicKey::new(owner),
            token_type: TokenType::night(),
            intent_hash,
            output_no,
        },
    )
}

/// Offer with 0..6 inputs and a signature prefix of arbitrary length
fn arb_offer() -> impl Strategy<Value = UnshieldedOffer> {
    prop::collection::vec(arb_utxo(), 0..6)
        .prop_flat_map(|inputs| {
            let n = inputs.len();
            (Just(inputs), prop::collection::vec(arb_signature(), 0..=n))
        })
        .prop_map(|(inputs, signatures)| {
            let mut offer = UnshieldedOffer::new(
                inputs,
                vec![UtxoOutput {
                    value: 1,
                    owner: UnshieldedPublicKey::new([1; 32]),
                    token_type: TokenType::night(),
                }],
            );
            offer.signatures = signatures;
            offer
        })
}

fn arb_intent(markers: IntentMarkers) -> impl Strategy<Value = Intent> {
    (
        1_700_000_000i64..1_900_000_000,
        prop::option::of(arb_offer()),
        prop::option::of(arb_offer()),
    )
        .prop_map(move |(ttl, guaranteed, fallible)| {
            let mut intent = Intent::new(Utc.timestamp_opt(ttl, 0).unwrap(), markers);
            intent.guaranteed_unshielded_offer = guaranteed;
            intent.fallible_unshielded_offer = fallible;
            intent
        })
}

fn arb_transaction(markers: IntentMarkers) -> impl Strategy<Value = Transaction> {
    prop::collection::btree_map(1u16..64, arb_intent(markers), 0..5).prop_map(move |intents| {
        let mut tx = Transaction::new(NetworkId::Undeployed, markers);
        tx.intents = Some(intents);
        tx
    })
}

/// Deterministic signer recording every payload it was asked to sign
fn recording_signer(
    payloads: &mut Vec<Vec<u8>>,
) -> impl FnMut(&[u8]) -> hello_core::Result<Signature> + '_ {
    move |payload: &[u8]| {
        payloads.push(payload.to_vec());
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&payload[..32]);
        bytes[32..].copy_from_slice(&payload[..32]);
        Ok(Signature::new(bytes))
    }
}

// ============================================
// Property Tests
// ============================================

proptest! {
    // ----------------------------------------
    // Re-signing Properties
    // ----------------------------------------

    #[test]
    fn resigned_offers_cover_every_input(tx in arb_transaction(IntentMarkers::proven())) {
        let mut signed = tx.clone();
        let mut payloads = Vec::new();
        sign_transaction_intents(&mut signed, recording_signer(&mut payloads), ProofMarker::Proof)
            .unwrap();

        for (_, intent) in signed.iter_intents() {
            for offer in intent.unshielded_offers() {
                prop_assert_eq!(offer.signatures.len(), offer.inputs.len());
            }
        }
        prop_assert_eq!(payloads.len(), tx.intent_count());
    }

    #[test]
    fn resigning_preserves_existing_and_fills_the_rest(tx in arb_transaction(IntentMarkers::proven())) {
        let mut signed = tx.clone();
        let mut payloads = Vec::new();
        sign_transaction_intents(&mut signed, recording_signer(&mut payloads), ProofMarker::Proof)
            .unwrap();

        for (segment, before) in tx.iter_intents() {
            let after = signed.intent(segment).unwrap();
            let payload = before.signature_data(segment).unwrap();
            let mut fallback = [0u8; 64];
            fallback[..32].copy_from_slice(&payload);
            fallback[32..].copy_from_slice(&payload);
            let fallback = Signature::new(fallback);

            let pairs = [
                (&before.guaranteed_unshielded_offer, &after.guaranteed_unshielded_offer),
                (&before.fallible_unshielded_offer, &after.fallible_unshielded_offer),
            ];
            for (old, new) in pairs {
                prop_assert_eq!(old.is_some(), new.is_some());
                let (Some(old), Some(new)) = (old, new) else { continue };
                prop_assert_eq!(&new.inputs, &old.inputs);
                prop_assert_eq!(&new.outputs, &old.outputs);
                prop_assert_eq!(&new.signatures[..old.signatures.len()], &old.signatures[..]);
                for signature in &new.signatures[old.signatures.len()..] {
                    prop_assert_eq!(signature, &fallback);
                }
            }
            prop_assert_eq!(after.ttl, before.ttl);
            prop_assert_eq!(after.markers, before.markers);
        }
    }

    #[test]
    fn resigning_twice_changes_nothing(tx in arb_transaction(IntentMarkers::proven())) {
        let mut once = tx;
        let mut payloads = Vec::new();
        sign_transaction_intents(&mut once, recording_signer(&mut payloads), ProofMarker::Proof)
            .unwrap();

        let mut twice = once.clone();
        let mut more = Vec::new();
        sign_transaction_intents(&mut twice, recording_signer(&mut more), ProofMarker::Proof)
            .unwrap();

        prop_assert_eq!(twice, once);
        prop_assert_eq!(more, payloads);
    }

    #[test]
    fn recipe_signs_base_then_balancing(
        base in arb_transaction(IntentMarkers::proven()),
        balancing in arb_transaction(IntentMarkers::unproven()),
    ) {
        let expected_calls = base.intent_count() + balancing.intent_count();
        let mut recipe = Recipe::new(base).with_balancing(balancing);
        let mut payloads = Vec::new();
        sign_recipe(&mut recipe, recording_signer(&mut payloads)).unwrap();

        prop_assert_eq!(payloads.len(), expected_calls);
        let balancing = recipe.balancing_transaction.as_ref().unwrap();
        for (_, intent) in balancing.iter_intents() {
            prop_assert_eq!(intent.markers.proof, ProofMarker::PreProof);
            for offer in intent.unshielded_offers() {
                prop_assert!(offer.is_fully_signed());
            }
        }
    }

    #[test]
    fn keystore_signatures_verify_for_every_input(
        secret in any::<[u8; 32]>().prop_filter("valid scalar", |s| UnshieldedKeystore::new(s, NetworkId::Undeployed).is_ok()),
        intent in arb_intent(IntentMarkers::proven()),
        segment in 1u16..64,
    ) {
        let keystore = UnshieldedKeystore::new(&secret, NetworkId::Undeployed).unwrap();
        let mut intent = intent;
        for offer in [
            intent.guaranteed_unshielded_offer.as_mut(),
            intent.fallible_unshielded_offer.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            offer.signatures.clear();
        }
        let mut tx = Transaction::new(NetworkId::Undeployed, IntentMarkers::proven())
            .with_intent(segment, intent);

        sign_transaction_intents(&mut tx, |payload| keystore.sign_data(payload), ProofMarker::Proof)
            .unwrap();

        let intent = tx.intent(segment).unwrap();
        let payload = intent.signature_data(segment).unwrap();
        for offer in intent.unshielded_offers() {
            for signature in &offer.signatures {
                prop_assert!(keystore.public_key().verify(&payload, signature).is_ok());
            }
        }
    }

    // ----------------------------------------
    // Ledger Model Properties
    // ----------------------------------------

    #[test]
    fn signature_data_is_segment_bound(intent in arb_intent(IntentMarkers::proven()), a in 1u16..64, b in 1u16..64) {
        prop_assume!(a != b);
        prop_assert_ne!(intent.signature_data(a).unwrap(), intent.signature_data(b).unwrap());
    }

    #[test]
    fn transaction_decode_requires_declared_markers(tx in arb_transaction(IntentMarkers::proven())) {
        let bytes = tx.serialize();
        prop_assert_eq!(Transaction::deserialize(IntentMarkers::proven(), &bytes).unwrap(), tx);
        prop_assert!(Transaction::deserialize(IntentMarkers::unproven(), &bytes).is_err());
    }

    #[test]
    fn contract_address_hex_roundtrip(nonce in any::<[u8; 32]>()) {
        let address = ContractAddress::derive(&nonce);
        let recovered = ContractAddress::from_hex(&address.to_hex()).unwrap();
        prop_assert_eq!(address, recovered);
        prop_assert!(address.to_hex().starts_with(address.short().trim_end_matches("...")));
    }

    #[test]
    fn contract_address_rejects_wrong_length(s in "[0-9a-f]{0,63}") {
        prop_assert!(ContractAddress::from_hex(&s).is_err());
    }
}
