//! Security-specific tests.
//!
//! These tests verify:
//! 1. Secrets are wiped after zeroize and on drop
//! 2. Crypto operations reject invalid inputs
//! 3. Malformed inputs don't panic
//! 4. Secret types never print key material

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bee_core::crypto::{self, CryptoError, KEY_LEN, NONCE_LEN, SALT_LEN, TAG_LEN};
use bee_core::memory::LockedBytes;
use bee_core::schnorr::verify;
use bee_core::seed::{parse_mnemonic, validate_mnemonic};
use bee_core::vpn::is_clamped;
use bee_core::{
    IdentityError, KeyError, MasterKey, Mobi, MobiError, Network, SchnorrIdentity, SealedMessage,
    VpnKey,
};
use zeroize::Zeroize;

const WORDS: &str =
    "leader monkey parrot ring guide accident before fence cannon height naive bean";

// ============================================================================
// 1. Zeroization
// ============================================================================

#[test]
fn test_zeroized_master_key_refuses_every_derivation() {
    let mut master = MasterKey::from_mnemonic(WORDS, Network::Bitcoin, "").unwrap();

    // Warm every cache first
    master.nostr_keypair().unwrap();
    master.bitcoin_xpub().unwrap();
    master.vpn_key().unwrap();
    master.mobi().unwrap();

    master.zeroize();

    assert!(master.is_zeroized());
    assert!(master.seed().iter().all(|&b| b == 0));
    assert_eq!(master.mnemonic(), None);
    assert!(matches!(master.nostr_keypair(), Err(KeyError::Zeroized)));
    assert!(matches!(master.nostr_keys(), Err(KeyError::Zeroized)));
    assert!(matches!(master.bitcoin_xpub(), Err(KeyError::Zeroized)));
    assert!(matches!(master.bitcoin_xpub_string(), Err(KeyError::Zeroized)));
    assert!(matches!(
        master.bitcoin_address(bee_core::Branch::Receive, 0),
        Err(KeyError::Zeroized)
    ));
    assert!(matches!(master.vpn_key(), Err(KeyError::Zeroized)));
    assert!(matches!(master.mobi(), Err(KeyError::Zeroized)));

    // Idempotent
    master.zeroize();
    assert!(master.is_zeroized());
}

#[test]
fn test_zeroized_identity_refuses_secret_operations() {
    let master = MasterKey::from_mnemonic(WORDS, Network::Bitcoin, "").unwrap();
    let mut identity = SchnorrIdentity::from_master_key(&master).unwrap();
    let peer = SchnorrIdentity::generate();
    let public_key = identity.public_key();

    identity.zeroize();

    assert!(identity.is_zeroized());
    assert_eq!(identity.public_key(), public_key);
    assert!(matches!(
        identity.sign_message(b"hello"),
        Err(IdentityError::Key(KeyError::Zeroized))
    ));
    assert!(matches!(
        identity.derive_shared_secret(&peer.public_key()),
        Err(IdentityError::Key(KeyError::Zeroized))
    ));
    assert!(matches!(
        identity.nsec(),
        Err(IdentityError::Key(KeyError::Zeroized))
    ));
}

#[test]
fn test_from_seed_wipes_caller_buffer() {
    let mut seed = [0x42u8; 64];
    let master = MasterKey::from_seed(&mut seed, Network::Bitcoin);
    assert_eq!(seed, [0u8; 64]);
    assert_eq!(master.seed(), &[0x42u8; 64]);
}

#[test]
fn test_locked_bytes_wipe() {
    let mut secret = [0xA5u8; 32];
    let mut locked = LockedBytes::new(&mut secret);
    assert_eq!(secret, [0u8; 32]);
    assert_eq!(locked.as_bytes(), &[0xA5u8; 32]);

    locked.wipe();
    assert!(locked.is_zeroed());
}

#[test]
fn test_vpn_key_zeroize() {
    let mut key = VpnKey::from_raw([0xFFu8; 32]);
    assert!(is_clamped(key.private_key()));
    key.zeroize();
    assert_eq!(key.private_key(), &[0u8; 32]);
}

// ============================================================================
// 2. Invalid input rejection
// ============================================================================

#[test]
fn test_invalid_mnemonics_rejected() {
    let bad_checksum =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
    let not_a_word =
        "leader monkey parrot ring guide accident before fence cannon height naive beez";

    for phrase in ["", "   ", bad_checksum, not_a_word, "leader monkey parrot"] {
        assert!(!validate_mnemonic(phrase), "{:?} should be rejected", phrase);
        assert!(matches!(
            MasterKey::from_mnemonic(phrase, Network::Bitcoin, ""),
            Err(KeyError::InvalidMnemonic(_))
        ));
    }
}

#[test]
fn test_invalid_strength_rejected() {
    for bits in [0, 127, 160, 192, 512] {
        assert!(matches!(
            MasterKey::generate(bits, Network::Bitcoin),
            Err(KeyError::InvalidStrength(b)) if b == bits
        ));
    }
}

#[test]
fn test_empty_passphrase_kdf_rejected() {
    assert!(matches!(
        crypto::derive_key(b"", &[0u8; SALT_LEN]),
        Err(CryptoError::InvalidInput(_))
    ));
}

#[test]
fn test_passphrase_sealed_vault() {
    let salt = crypto::generate_salt();
    let key = crypto::derive_key(b"correct horse battery staple", &salt).unwrap();
    let sealed = crypto::seal(&key, WORDS.as_bytes()).unwrap();
    assert_eq!(sealed.len(), NONCE_LEN + WORDS.len() + TAG_LEN);
    assert_eq!(crypto::unseal(&key, &sealed).unwrap(), WORDS.as_bytes());

    let wrong = crypto::derive_key(b"wrong horse battery staple", &salt).unwrap();
    assert_eq!(
        crypto::unseal(&wrong, &sealed),
        Err(CryptoError::AuthenticationFailed)
    );
}

#[test]
fn test_every_sealed_byte_is_authenticated() {
    let alice = SchnorrIdentity::generate();
    let bob = SchnorrIdentity::generate();
    let bytes = alice.encrypt(&bob.public_key(), b"short").unwrap().to_bytes();

    // Byte 0 is the version tag, checked before authentication
    for index in 1..bytes.len() {
        let mut tampered = bytes.clone();
        tampered[index] ^= 0x01;
        let message = SealedMessage::from_bytes(&tampered).unwrap();
        assert!(
            matches!(
                bob.decrypt(&alice.public_key(), &message),
                Err(IdentityError::AuthenticationFailed)
            ),
            "flip at byte {} went unnoticed",
            index
        );
    }
}

#[test]
fn test_sealed_message_for_third_party_unreadable() {
    let alice = SchnorrIdentity::generate();
    let bob = SchnorrIdentity::generate();
    let eve = SchnorrIdentity::generate();

    let wire = alice.encrypt_to_string(&bob.public_key(), "private").unwrap();
    assert!(matches!(
        eve.decrypt_str(&alice.public_key(), &wire),
        Err(IdentityError::AuthenticationFailed)
    ));
    assert!(matches!(
        eve.decrypt_str(&bob.public_key(), &wire),
        Err(IdentityError::AuthenticationFailed)
    ));
}

#[test]
fn test_identity_key_length_errors() {
    let id = SchnorrIdentity::generate();
    for len in [0, 31, 33, 64] {
        let key = vec![2u8; len];
        assert!(matches!(
            id.derive_shared_secret(&key),
            Err(IdentityError::InvalidLength { .. })
        ));
        assert!(matches!(
            id.encrypt(&key, b"x"),
            Err(IdentityError::InvalidLength { .. })
        ));
    }
}

// ============================================================================
// 3. Malformed inputs don't panic
// ============================================================================

#[test]
fn test_mobi_garbage_inputs() {
    let inputs = [
        "",
        "-",
        "12345",
        "1234567890123",
        "abcdefghijkl",
        "１２３４５６７８９０１２", // full-width digits
        "123-456-789-01x",
        "123 456 789 012 345 678 901 234",
        "\u{0}\u{0}\u{0}",
    ];
    for input in inputs {
        assert!(!Mobi::validate(input), "{:?} should be invalid", input);
        assert!(Mobi::try_parse(input).is_none());
        assert!(matches!(Mobi::parse(input), Err(MobiError::InvalidFormat(_))));
    }
}

#[test]
fn test_mobi_bad_public_keys() {
    assert!(matches!(
        Mobi::from_public_key_hex("zz"),
        Err(MobiError::InvalidLength { expected: 32, got: 1 })
    ));
    assert!(matches!(
        Mobi::from_public_key_hex(&"zz".repeat(32)),
        Err(MobiError::InvalidHex(_))
    ));
    assert!(matches!(
        Mobi::from_public_key_slice(&[0u8; 33]),
        Err(MobiError::InvalidLength { expected: 32, got: 33 })
    ));
    assert!(matches!(
        Mobi::from_npub("npub1invalid"),
        Err(MobiError::Bech32(_))
    ));
}

#[test]
fn test_sealed_message_garbage() {
    for len in 0..SealedMessage::MIN_LEN {
        assert!(SealedMessage::from_bytes(&vec![1u8; len]).is_err());
    }
    assert!(SealedMessage::from_base64("not base64 at all!").is_err());
    assert!(SealedMessage::from_base64(&BASE64.encode([1u8; 8])).is_err());

    // Parseable but meaningless
    let noise = SealedMessage::from_bytes(&[1u8; 64]).unwrap();
    let a = SchnorrIdentity::generate();
    let b = SchnorrIdentity::generate();
    assert!(a.decrypt(&b.public_key(), &noise).is_err());
}

#[test]
fn test_verify_garbage_never_panics() {
    for fill in [0x00u8, 0x01, 0x7F, 0xFF] {
        let pk = [fill; 32];
        let hash = [fill; 32];
        let sig = [fill; 64];
        assert!(!verify(&pk, &hash, &sig).unwrap());
    }
}

#[test]
fn test_unseal_short_blob() {
    let key = [0u8; KEY_LEN];
    for len in 0..(NONCE_LEN + TAG_LEN) {
        assert!(matches!(
            crypto::unseal(&key, &vec![0u8; len]),
            Err(CryptoError::InvalidFormat { .. })
        ));
    }
}

#[test]
fn test_vpn_import_garbage() {
    assert!(VpnKey::from_private_base64("").is_err());
    assert!(VpnKey::from_private_base64("@@@@").is_err());
    assert!(VpnKey::from_private_base64(&BASE64.encode([9u8; 33])).is_err());
}

// ============================================================================
// 4. No key material in Debug output
// ============================================================================

#[test]
fn test_debug_output_redacts_secrets() {
    let master = MasterKey::from_mnemonic(WORDS, Network::Bitcoin, "").unwrap();
    let nostr = master.nostr_keypair().unwrap();
    let secret_hex = nostr.private_key_hex();
    let vpn = master.vpn_key().unwrap();
    let vpn_secret = vpn.private_key_base64();
    let identity = SchnorrIdentity::from_master_key(&master).unwrap();

    let outputs = [
        format!("{:?}", master),
        format!("{:?}", nostr),
        format!("{:?}", vpn),
        format!("{:?}", identity),
    ];
    for out in &outputs {
        assert!(!out.contains(secret_hex.as_str()), "leaked nostr key: {}", out);
        assert!(!out.contains(vpn_secret.as_str()), "leaked vpn key: {}", out);
        assert!(!out.contains("leader"), "leaked mnemonic: {}", out);
        assert!(!out.contains(&hex::encode(master.seed())), "leaked seed: {}", out);
    }
}

#[test]
fn test_parsed_mnemonic_is_normalized() {
    let messy = format!("  {}  ", WORDS.to_uppercase().replace(' ', "\t"));
    let parsed = parse_mnemonic(&messy).unwrap();
    assert_eq!(parsed.to_string(), WORDS);
}
