#![no_main]

use libfuzzer_sys::fuzz_target;
use hello_core::{IntentMarkers, Transaction};

fuzz_target!(|data: &[u8]| {
    for markers in [
        IntentMarkers::unproven(),
        IntentMarkers::proven(),
        IntentMarkers::finalized(),
    ] {
        if let Ok(tx) = Transaction::deserialize(markers, data) {
            assert_eq!(tx.markers, markers);
            // Identifier is a hash of the canonical encoding
            let again = Transaction::deserialize(markers, &tx.serialize()).unwrap();
            assert_eq!(tx.identifier(), again.identifier());
        }
    }
});
