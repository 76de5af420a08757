#![no_main]

use bee_core::Mobi;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // validate, normalize and parse must agree
        let normalized = Mobi::normalize(s);
        assert_eq!(Mobi::validate(s), normalized.is_some());

        if let Some(mobi) = Mobi::try_parse(s) {
            let digits = normalized.unwrap_or_default();
            assert!(mobi.full().starts_with(&digits));
            assert!(mobi.display_matches(s));
            assert_eq!(Mobi::parse(&mobi.format_full()).ok(), Some(mobi));
        }
    }

    // Any 32 bytes either derive a Mobi or fail cleanly
    if data.len() == 32 {
        let _ = Mobi::from_public_key_slice(data);
    }
});
