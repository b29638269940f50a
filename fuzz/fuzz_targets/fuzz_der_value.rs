#![no_main]

use concord_core::der::{decode_exact, decode_one};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Prefix decoding should not panic
    if let Ok((value, rest)) = decode_one(data) {
        // The decoder only accepts canonical input, so re-encoding
        // reproduces exactly the bytes consumed
        let consumed = data.len() - rest.len();
        assert_eq!(value.encode(), &data[..consumed]);
    }

    if let Ok(value) = decode_exact(data) {
        assert_eq!(value.encode(), data);
    }
});
