//! Key derivation from BIP-39 seed
//!
//! Derives Nostr keys (NIP-06), Bitcoin account keys (BIP-84) and the raw
//! VPN key material from a single seed. Every path is walked from the same
//! BIP-32 root.

use std::fmt;

use bitcoin::bip32::{ChildNumber, DerivationPath, Xpriv, Xpub};
use bitcoin::secp256k1::{Secp256k1, Signing};
use bitcoin::{Address, CompressedPublicKey, Network, NetworkKind};
use nostr_sdk::Keys as NostrKeys;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::mobi::MobiError;
use crate::seed::SeedError;

/// NIP-06 derivation path for Nostr keys
pub const NIP06_PATH: &str = "m/44'/1237'/0'/0/0";

/// BIP-84 account path on mainnet (native segwit)
pub const BIP84_PATH: &str = "m/84'/0'/0'";

/// BIP-84 account path on every test network
pub const BIP84_TESTNET_PATH: &str = "m/84'/1'/0'";

/// Path of the WireGuard-style VPN key. Fully hardened so the account xpub
/// reveals nothing about it.
pub const VPN_PATH: &str = "m/44'/51820'/0'/0'/0'";

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Unsupported mnemonic strength: {0} bits (expected 128 or 256)")]
    InvalidStrength(usize),
    #[error("Invalid length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Derivation failed: {0}")]
    DerivationFailed(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Key material has been zeroized")]
    Zeroized,
    #[error(transparent)]
    Mobi(#[from] MobiError),
}

impl From<SeedError> for KeyError {
    fn from(e: SeedError) -> Self {
        match e {
            SeedError::InvalidMnemonic(msg) => KeyError::InvalidMnemonic(msg),
            SeedError::InvalidStrength(bits) => KeyError::InvalidStrength(bits),
        }
    }
}

/// External branch of a BIP-84 account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// `.../0/i`
    Receive,
    /// `.../1/i`
    Change,
}

impl Branch {
    pub fn index(self) -> u32 {
        match self {
            Branch::Receive => 0,
            Branch::Change => 1,
        }
    }
}

/// A private key and the matching public key bytes.
///
/// The public key is 32 bytes for x-only (Nostr) keys and 33 bytes for
/// compressed secp256k1 (Bitcoin) keys.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyPair {
    private_key: [u8; 32],
    public_key: Vec<u8>,
}

impl KeyPair {
    pub(crate) fn new(private_key: [u8; 32], public_key: Vec<u8>) -> Self {
        Self {
            private_key,
            public_key,
        }
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.private_key))
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }

    /// Nostr keys built from the private half.
    pub fn to_nostr_keys(&self) -> Result<NostrKeys, KeyError> {
        let secret_key = nostr_sdk::SecretKey::from_slice(&self.private_key)
            .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;
        Ok(NostrKeys::new(secret_key))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// BIP-84 account path for a network.
pub fn bitcoin_account_path(network: Network) -> &'static str {
    match NetworkKind::from(network) {
        NetworkKind::Main => BIP84_PATH,
        NetworkKind::Test => BIP84_TESTNET_PATH,
    }
}

fn parse_path(path: &str) -> Result<DerivationPath, KeyError> {
    path.parse()
        .map_err(|e: bitcoin::bip32::Error| KeyError::InvalidPath(e.to_string()))
}

/// Walk `path` from the BIP-32 root of `seed`.
pub fn derive_xpriv<C: Signing>(
    secp: &Secp256k1<C>,
    seed: &[u8; 64],
    network: Network,
    path: &str,
) -> Result<Xpriv, KeyError> {
    let master = Xpriv::new_master(network, seed)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

    let path = parse_path(path)?;
    log::debug!("deriving key at {}", path);

    master
        .derive_priv(secp, &path)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))
}

/// Derive the NIP-06 keypair (x-only public key).
pub fn derive_nostr_keypair(seed: &[u8; 64]) -> Result<KeyPair, KeyError> {
    let secp = Secp256k1::new();
    let derived = derive_xpriv(&secp, seed, Network::Bitcoin, NIP06_PATH)?;
    let (xonly, _parity) = derived.private_key.x_only_public_key(&secp);
    Ok(KeyPair::new(
        derived.private_key.secret_bytes(),
        xonly.serialize().to_vec(),
    ))
}

/// Derive Nostr keys from seed using NIP-06 path
pub fn derive_nostr_keys(seed: &[u8; 64]) -> Result<NostrKeys, KeyError> {
    derive_nostr_keypair(seed)?.to_nostr_keys()
}

/// Derive the BIP-84 account key for `network`.
pub fn derive_bitcoin_account(seed: &[u8; 64], network: Network) -> Result<Xpriv, KeyError> {
    let secp = Secp256k1::new();
    derive_xpriv(&secp, seed, network, bitcoin_account_path(network))
}

/// Derive the account extended public key for `network`.
pub fn derive_bitcoin_xpub(seed: &[u8; 64], network: Network) -> Result<Xpub, KeyError> {
    let secp = Secp256k1::new();
    let account = derive_bitcoin_account(seed, network)?;
    Ok(Xpub::from_priv(&secp, &account))
}

/// Derive the key at `account/branch/index`. The public key is compressed.
pub fn derive_bitcoin_child(
    seed: &[u8; 64],
    network: Network,
    branch: Branch,
    index: u32,
) -> Result<KeyPair, KeyError> {
    let secp = Secp256k1::new();
    let account = derive_bitcoin_account(seed, network)?;

    let steps = [
        ChildNumber::from_normal_idx(branch.index())
            .map_err(|e| KeyError::InvalidPath(e.to_string()))?,
        ChildNumber::from_normal_idx(index).map_err(|e| KeyError::InvalidPath(e.to_string()))?,
    ];
    let child = account
        .derive_priv(&secp, &steps)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

    let public = child.private_key.public_key(&secp);
    Ok(KeyPair::new(
        child.private_key.secret_bytes(),
        public.serialize().to_vec(),
    ))
}

/// P2WPKH address for a compressed public key.
pub fn p2wpkh_address(public_key: &[u8], network: Network) -> Result<Address, KeyError> {
    let compressed = CompressedPublicKey::from_slice(public_key).map_err(|_| {
        KeyError::InvalidLength {
            expected: 33,
            got: public_key.len(),
        }
    })?;
    Ok(Address::p2wpkh(&compressed, network))
}

/// Raw 32 bytes at [`VPN_PATH`], before clamping.
pub fn derive_vpn_raw(seed: &[u8; 64]) -> Result<Zeroizing<[u8; 32]>, KeyError> {
    let secp = Secp256k1::new();
    let derived = derive_xpriv(&secp, seed, Network::Bitcoin, VPN_PATH)?;
    Ok(Zeroizing::new(derived.private_key.secret_bytes()))
}
