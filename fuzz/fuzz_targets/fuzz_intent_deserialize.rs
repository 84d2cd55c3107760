#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use hello_core::{BindingState, Intent, ProofMarker, SignatureKind};

#[derive(Debug, Arbitrary)]
struct Input {
    signed: bool,
    proven: bool,
    bound: bool,
    segment: u16,
    bytes: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let signature = if input.signed {
        SignatureKind::Signature
    } else {
        SignatureKind::SignatureErased
    };
    let proof = if input.proven {
        ProofMarker::Proof
    } else {
        ProofMarker::PreProof
    };
    let binding = if input.bound {
        BindingState::Binding
    } else {
        BindingState::PreBinding
    };

    // Must not panic on arbitrary bytes
    if let Ok(intent) = Intent::deserialize(signature, proof, binding, &input.bytes) {
        // Accepted intents re-encode to something that decodes the same way
        let reencoded = intent.serialize();
        let again = Intent::deserialize(signature, proof, binding, &reencoded).unwrap();
        assert_eq!(intent, again);

        // Signing payload ignores markers and signatures
        if let Ok(payload) = intent.signature_data(input.segment) {
            assert_eq!(payload, again.signature_data(input.segment).unwrap());
        }
    }
});
