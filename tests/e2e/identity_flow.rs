//! End-to-end identity flow
//!
//! Mnemonic in, every identity out, then two parties using those identities
//! to sign, exchange sealed messages and agree on VPN keys.

use std::str::FromStr;

use bee_core::keys::{derive_bitcoin_child, derive_nostr_keypair};
use bee_core::schnorr::{verify, verify_message};
use bee_core::{Branch, MasterKey, Mobi, Network, SchnorrIdentity, SealedMessage};
use bitcoin::bip32::{ChildNumber, Xpub};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, CompressedPublicKey};
use nostr_sdk::ToBech32;

const ALICE_WORDS: &str =
    "leader monkey parrot ring guide accident before fence cannon height naive bean";
const BOB_WORDS: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn alice() -> MasterKey {
    MasterKey::from_mnemonic(ALICE_WORDS, Network::Bitcoin, "").unwrap()
}

fn bob() -> MasterKey {
    MasterKey::from_mnemonic(BOB_WORDS, Network::Bitcoin, "").unwrap()
}

#[test]
fn test_full_identity_from_mnemonic() {
    let master = alice();

    // Nostr (NIP-06)
    let keys = master.nostr_keys().unwrap();
    assert_eq!(
        keys.public_key().to_hex(),
        "17162c921dc4d2518f9a101db33695df1afb56ab82f5ff3e5da6eec3ca5cd917"
    );
    let identity = SchnorrIdentity::from_master_key(&master).unwrap();
    assert_eq!(identity.npub().unwrap(), keys.public_key().to_bech32().unwrap());

    // Mobi agrees however the public key is presented
    let mobi = master.mobi().unwrap();
    assert_eq!(*mobi, identity.mobi().unwrap());
    assert_eq!(*mobi, Mobi::from_npub(&identity.npub().unwrap()).unwrap());
    assert_eq!(*mobi, Mobi::from_public_key_hex(&identity.public_key_hex()).unwrap());
    assert_eq!(mobi.full().len(), 21);
    assert!(mobi.full().starts_with(mobi.display()));

    // Bitcoin
    assert!(master.bitcoin_xpub_string().unwrap().starts_with("xpub"));
    let address = master.bitcoin_address(Branch::Receive, 0).unwrap();
    assert!(address.to_string().starts_with("bc1q"));

    // VPN
    let vpn = master.vpn_key().unwrap();
    assert_eq!(vpn.public_key_base64().len(), 44);
}

#[test]
fn test_identity_survives_reload() {
    let first = alice();
    let second = MasterKey::from_mnemonic(
        &ALICE_WORDS.to_uppercase().replace(' ', "\n  "),
        Network::Bitcoin,
        "",
    )
    .unwrap();

    assert_eq!(
        first.nostr_keypair().unwrap(),
        second.nostr_keypair().unwrap()
    );
    assert_eq!(
        first.bitcoin_xpub_string().unwrap(),
        second.bitcoin_xpub_string().unwrap()
    );
    assert_eq!(first.mobi().unwrap(), second.mobi().unwrap());
    assert_eq!(
        first.vpn_key().unwrap().public_key(),
        second.vpn_key().unwrap().public_key()
    );
}

#[test]
fn test_passphrase_gives_unrelated_identity() {
    let plain = alice();
    let protected = MasterKey::from_mnemonic(ALICE_WORDS, Network::Bitcoin, "hive").unwrap();

    assert_ne!(plain.seed(), protected.seed());
    assert_ne!(plain.nostr_keypair().unwrap(), protected.nostr_keypair().unwrap());
    assert!(!plain.mobi().unwrap().full_matches(protected.mobi().unwrap()));
}

#[test]
fn test_master_key_matches_free_functions() {
    let master = alice();
    let seed = *master.seed();

    assert_eq!(
        &derive_nostr_keypair(&seed).unwrap(),
        master.nostr_keypair().unwrap()
    );

    let child = derive_bitcoin_child(&seed, Network::Bitcoin, Branch::Change, 4).unwrap();
    assert_eq!(child, master.derive_bitcoin_key(Branch::Change, 4).unwrap());
}

#[test]
fn test_watch_only_wallet_from_xpub_string() {
    let master = alice();
    let xpub = Xpub::from_str(&master.bitcoin_xpub_string().unwrap()).unwrap();
    let secp = Secp256k1::verification_only();

    for index in 0..5 {
        let path = [
            ChildNumber::from_normal_idx(0).unwrap(),
            ChildNumber::from_normal_idx(index).unwrap(),
        ];
        let child = xpub.derive_pub(&secp, &path).unwrap();
        let watch_only = Address::p2wpkh(&CompressedPublicKey(child.public_key), Network::Bitcoin);
        assert_eq!(
            watch_only,
            master.bitcoin_address(Branch::Receive, index).unwrap()
        );
    }
}

#[test]
fn test_testnet_identity() {
    let mainnet = alice();
    let testnet = MasterKey::from_mnemonic(ALICE_WORDS, Network::Testnet, "").unwrap();

    // Nostr, Mobi and VPN identities do not depend on the network
    assert_eq!(mainnet.mobi().unwrap(), testnet.mobi().unwrap());
    assert_eq!(
        mainnet.vpn_key().unwrap().public_key(),
        testnet.vpn_key().unwrap().public_key()
    );

    // Bitcoin keys use coin type 1
    assert!(testnet.bitcoin_xpub_string().unwrap().starts_with("tpub"));
    let address = testnet.bitcoin_address(Branch::Receive, 0).unwrap();
    assert!(address.to_string().starts_with("tb1q"));
    assert_ne!(
        mainnet.derive_bitcoin_key(Branch::Receive, 0).unwrap(),
        testnet.derive_bitcoin_key(Branch::Receive, 0).unwrap()
    );
}

#[test]
fn test_two_party_signed_sealed_exchange() {
    let alice_master = alice();
    let bob_master = bob();
    let alice = SchnorrIdentity::from_master_key(&alice_master).unwrap();
    let bob = SchnorrIdentity::from_master_key(&bob_master).unwrap();

    // Alice signs and seals a note for Bob
    let note = b"meet at the hive at noon";
    let signature = alice.sign_message(note).unwrap();
    let wire = alice
        .encrypt(&bob.public_key(), note)
        .unwrap()
        .to_base64();

    // Bob opens it and checks the signature
    let sealed = SealedMessage::from_base64(&wire).unwrap();
    let opened = bob.decrypt(&alice.public_key(), &sealed).unwrap();
    assert_eq!(opened, note);
    assert!(verify_message(&alice.public_key(), &opened, &signature).unwrap());
    assert!(!verify_message(&bob.public_key(), &opened, &signature).unwrap());

    // And replies with the string helpers
    let reply = bob.encrypt_to_string(&alice.public_key(), "see you there").unwrap();
    assert_eq!(
        alice.decrypt_str(&bob.public_key(), &reply).unwrap(),
        "see you there"
    );
}

#[test]
fn test_shared_secret_agreement_between_master_keys() {
    let alice = SchnorrIdentity::from_master_key(&alice()).unwrap();
    let bob = SchnorrIdentity::from_master_key(&bob()).unwrap();

    assert_eq!(
        *alice.derive_shared_secret(&bob.public_key()).unwrap(),
        *bob.derive_shared_secret(&alice.public_key()).unwrap()
    );
}

#[test]
fn test_vpn_key_agreement() {
    let alice_master = alice();
    let bob_master = bob();
    let alice_vpn = alice_master.vpn_key().unwrap();
    let bob_vpn = bob_master.vpn_key().unwrap();

    let ab = alice_vpn.diffie_hellman(bob_vpn.public_key());
    let ba = bob_vpn.diffie_hellman(alice_vpn.public_key());
    assert_eq!(*ab, *ba);
    assert_ne!(*ab, [0u8; 32]);
}

#[test]
fn test_signature_interop_with_secp256k1() {
    let identity = SchnorrIdentity::from_master_key(&alice()).unwrap();
    let hash = [0x5Au8; 32];
    let signature = identity.sign(&hash).unwrap();

    let secp = secp256k1::Secp256k1::verification_only();
    let sig = secp256k1::schnorr::Signature::from_slice(&signature).unwrap();
    let pk = secp256k1::XOnlyPublicKey::from_slice(&identity.public_key()).unwrap();
    let msg = secp256k1::Message::from_digest(hash);
    assert!(secp.verify_schnorr(&sig, &msg, &pk).is_ok());
    assert!(verify(&identity.public_key(), &hash, &signature).unwrap());
}

#[test]
fn test_mobi_json_shape() {
    let master = alice();
    let mobi = master.mobi().unwrap();

    let json = serde_json::to_string(mobi).unwrap();
    assert_eq!(json, format!("\"{}\"", mobi.full()));
    let back: Mobi = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, mobi);

    assert!(serde_json::from_str::<Mobi>("\"12345\"").is_err());
}

#[test]
fn test_mobi_lookup_by_prefix() {
    let master = alice();
    let mobi = master.mobi().unwrap();

    assert!(mobi.display_matches(&mobi.format_display()));
    assert!(mobi.display_matches(&mobi.format_full()));
    assert!(mobi.display_matches(mobi.extended()));

    // A prefix typed by a user parses, but only compares by display
    let typed = Mobi::parse(&mobi.format_display()).unwrap();
    assert_eq!(typed.display(), mobi.display());
    assert!(typed.display_matches(mobi.full()));
}
