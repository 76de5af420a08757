#![no_main]

use bee_core::seed::{normalize_mnemonic, parse_mnemonic, validate_mnemonic};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary UTF-8 as a phrase. Parsing returns Ok or Err, never panics.
    if let Ok(s) = std::str::from_utf8(data) {
        let parsed = parse_mnemonic(s);
        assert_eq!(parsed.is_ok(), validate_mnemonic(s));
        let _ = normalize_mnemonic(s);
    }
});
