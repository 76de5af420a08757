#![no_main]

use bee_core::{SchnorrIdentity, SealedMessage};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes as a sealed message. Parsing and decryption must return
    // Ok or Err and never panic; parsed messages re-serialize byte-for-byte.
    if let Ok(message) = SealedMessage::from_bytes(data) {
        assert_eq!(message.to_bytes(), data);

        let reader = SchnorrIdentity::generate();
        let sender = SchnorrIdentity::generate();
        assert!(reader.decrypt(&sender.public_key(), &message).is_err());
    }

    if let Ok(s) = std::str::from_utf8(data) {
        let _ = SealedMessage::from_base64(s);
    }
});
