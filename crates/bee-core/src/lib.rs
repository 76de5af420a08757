//! Bee Core
//!
//! Deterministic identity derivation for Bee.
//!
//! # Key Derivation
//!
//! From a single BIP-39 seed:
//! - Nostr keys via NIP-06: m/44'/1237'/0'/0/0
//! - Bitcoin keys via BIP-84: m/84'/0'/0' (m/84'/1'/0' on test networks)
//! - VPN (X25519) keys: m/44'/51820'/0'/0'/0'
//!
//! The Nostr public key is further mapped to a 21-digit Mobi number.
//!
//! # Secrets in memory
//!
//! The seed lives in a page-locked buffer and every secret type wipes itself
//! on drop. See [`memory`].

pub mod crypto;
pub mod keys;
pub mod master;
pub mod memory;
pub mod mobi;
pub mod schnorr;
pub mod seed;
pub mod vpn;

pub use crypto::CryptoError;
pub use keys::{Branch, KeyError, KeyPair, BIP84_PATH, BIP84_TESTNET_PATH, NIP06_PATH, VPN_PATH};
pub use master::MasterKey;
pub use memory::disable_core_dumps;
pub use mobi::{Mobi, MobiError};
pub use schnorr::{IdentityError, SchnorrIdentity, SealedMessage};
pub use seed::{generate_mnemonic, parse_mnemonic, validate_mnemonic, SeedError, WordCount};
pub use vpn::{VpnKey, VpnKeyError};

/// Re-exported so callers can name networks without depending on `bitcoin`.
pub use bitcoin::Network;
