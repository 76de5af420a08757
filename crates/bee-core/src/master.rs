//! The master key: one seed, every protocol key.
//!
//! A [`MasterKey`] owns the 64-byte BIP-39 seed (held in locked memory) and
//! hands out keys derived from it on demand. Each derived key is computed the
//! first time it is asked for and cached until [`MasterKey::zeroize`].
//!
//! ```text
//! mnemonic ──► seed ──┬─► m/44'/1237'/0'/0/0      Nostr (x-only secp256k1) ──► Mobi
//!                     ├─► m/84'/{0,1}'/0'         Bitcoin account (xpub, addresses)
//!                     └─► m/44'/51820'/0'/0'/0'   VPN (clamped X25519)
//! ```
//!
//! Caches are `OnceLock`s filled compute-then-init: two threads racing on the
//! first access both derive, one value wins, and both derivations are equal.

use std::fmt;
use std::sync::OnceLock;

use bitcoin::bip32::Xpub;
use bitcoin::{Address, Network};
use nostr_sdk::Keys as NostrKeys;
use zeroize::{Zeroize, Zeroizing};

use crate::keys::{self, Branch, KeyError, KeyPair};
use crate::memory::LockedBytes;
use crate::mobi::Mobi;
use crate::seed::{self, WordCount};
use crate::vpn::VpnKey;

pub const SEED_LEN: usize = 64;

pub struct MasterKey {
    network: Network,
    mnemonic: Option<Zeroizing<String>>,
    seed: LockedBytes<SEED_LEN>,
    zeroized: bool,
    nostr: OnceLock<KeyPair>,
    bitcoin_xpub: OnceLock<Xpub>,
    vpn: OnceLock<VpnKey>,
    mobi: OnceLock<Mobi>,
}

impl MasterKey {
    /// Build from a BIP-39 phrase.
    ///
    /// The phrase is lower-cased and its whitespace collapsed before it is
    /// validated or stretched.
    pub fn from_mnemonic(
        phrase: &str,
        network: Network,
        passphrase: &str,
    ) -> Result<Self, KeyError> {
        let mnemonic = seed::parse_mnemonic(phrase)?;
        let normalized = seed::normalize_mnemonic(phrase);
        let mut stretched = seed::derive_seed(&mnemonic, passphrase);

        let mut key = Self::from_seed(&mut stretched, network);
        key.mnemonic = Some(normalized);
        Ok(key)
    }

    /// Generate a fresh mnemonic with 128 or 256 bits of entropy.
    pub fn generate(strength_bits: usize, network: Network) -> Result<Self, KeyError> {
        let count = WordCount::from_strength(strength_bits)?;
        let mnemonic = seed::generate_mnemonic(count)?;
        let phrase = Zeroizing::new(mnemonic.to_string());
        Self::from_mnemonic(&phrase, network, "")
    }

    /// Build from an already-stretched seed. The caller's buffer is wiped.
    pub fn from_seed(seed: &mut [u8; SEED_LEN], network: Network) -> Self {
        log::debug!("master key created for {}", network);
        Self {
            network,
            mnemonic: None,
            seed: LockedBytes::new(seed),
            zeroized: false,
            nostr: OnceLock::new(),
            bitcoin_xpub: OnceLock::new(),
            vpn: OnceLock::new(),
            mobi: OnceLock::new(),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// The normalized phrase, if this key was built from one.
    pub fn mnemonic(&self) -> Option<&str> {
        self.mnemonic.as_deref().map(String::as_str)
    }

    /// The raw seed. All zeros after [`MasterKey::zeroize`].
    pub fn seed(&self) -> &[u8; SEED_LEN] {
        self.seed.as_bytes()
    }

    pub fn is_zeroized(&self) -> bool {
        self.zeroized
    }

    fn live_seed(&self) -> Result<&[u8; SEED_LEN], KeyError> {
        if self.zeroized {
            return Err(KeyError::Zeroized);
        }
        Ok(self.seed.as_bytes())
    }

    /// NIP-06 keypair with a 32-byte x-only public key.
    pub fn nostr_keypair(&self) -> Result<&KeyPair, KeyError> {
        if let Some(pair) = self.nostr.get() {
            return Ok(pair);
        }
        let pair = keys::derive_nostr_keypair(self.live_seed()?)?;
        Ok(self.nostr.get_or_init(|| pair))
    }

    /// The Nostr key as `nostr_sdk::Keys`.
    pub fn nostr_keys(&self) -> Result<NostrKeys, KeyError> {
        self.nostr_keypair()?.to_nostr_keys()
    }

    /// Extended public key of the BIP-84 account for this network.
    pub fn bitcoin_xpub(&self) -> Result<&Xpub, KeyError> {
        if let Some(xpub) = self.bitcoin_xpub.get() {
            return Ok(xpub);
        }
        let xpub = keys::derive_bitcoin_xpub(self.live_seed()?, self.network)?;
        Ok(self.bitcoin_xpub.get_or_init(|| xpub))
    }

    pub fn bitcoin_xpub_string(&self) -> Result<String, KeyError> {
        Ok(self.bitcoin_xpub()?.to_string())
    }

    /// Key at `account/branch/index`, derived fresh on every call.
    pub fn derive_bitcoin_key(&self, branch: Branch, index: u32) -> Result<KeyPair, KeyError> {
        keys::derive_bitcoin_child(self.live_seed()?, self.network, branch, index)
    }

    /// Native segwit address at `account/branch/index`.
    pub fn bitcoin_address(&self, branch: Branch, index: u32) -> Result<Address, KeyError> {
        let pair = self.derive_bitcoin_key(branch, index)?;
        keys::p2wpkh_address(pair.public_key(), self.network)
    }

    /// Clamped Curve25519 key for the VPN.
    pub fn vpn_key(&self) -> Result<&VpnKey, KeyError> {
        if let Some(key) = self.vpn.get() {
            return Ok(key);
        }
        let raw = keys::derive_vpn_raw(self.live_seed()?)?;
        let key = VpnKey::from_raw(*raw);
        Ok(self.vpn.get_or_init(|| key))
    }

    /// Mobi of the Nostr public key.
    pub fn mobi(&self) -> Result<&Mobi, KeyError> {
        if let Some(mobi) = self.mobi.get() {
            return Ok(mobi);
        }
        let pair = self.nostr_keypair()?;
        let mobi = Mobi::from_public_key_slice(pair.public_key())?;
        Ok(self.mobi.get_or_init(|| mobi))
    }

    /// Wipe the seed and mnemonic and drop every cached key.
    ///
    /// Irreversible: every later derivation fails with [`KeyError::Zeroized`].
    pub fn zeroize(&mut self) {
        if self.zeroized {
            return;
        }
        self.seed.wipe();
        if let Some(mut phrase) = self.mnemonic.take() {
            phrase.zeroize();
        }
        if let Some(mut pair) = self.nostr.take() {
            pair.zeroize();
        }
        if let Some(mut key) = self.vpn.take() {
            key.zeroize();
        }
        self.bitcoin_xpub.take();
        self.mobi.take();
        self.zeroized = true;
        log::info!("master key zeroized");
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("network", &self.network)
            .field("zeroized", &self.zeroized)
            .finish_non_exhaustive()
    }
}
