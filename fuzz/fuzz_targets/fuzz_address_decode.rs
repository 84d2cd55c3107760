#![no_main]

use libfuzzer_sys::fuzz_target;
use hello_core::MidnightAddress;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(address) = MidnightAddress::decode(text) {
            let encoded = address.encode().unwrap();
            let decoded = MidnightAddress::decode(&encoded).unwrap();
            assert_eq!(address, decoded);
        }
    }
});
