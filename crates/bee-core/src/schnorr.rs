//! BIP-340 Schnorr identity
//!
//! Signing and verification over 32-byte message hashes, ECDH against x-only
//! public keys, and an authenticated envelope ([`SealedMessage`]) keyed by the
//! ECDH secret.
//!
//! # Shared secret
//!
//! A counterparty is known only by the x coordinate of their key. The full
//! point is recovered with the even-`y` root of `y² = x³ + 7`, multiplied by
//! our secret, and the x coordinate of the product is the shared secret. The
//! lifted point is either `P` or `-P`; both give the same x, so the secret is
//! symmetric between the two parties.
//!
//! # Envelope
//!
//! ```text
//! version (1) || nonce (24) || XChaCha20-Poly1305(key, plaintext, aad = version)
//! key = SHA-256("bee/seal/v1" || shared_secret)
//! ```

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use nostr_sdk::{FromBech32, ToBech32};
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{
    ecdh, schnorr, All, Keypair, Message, Parity, PublicKey, Secp256k1, SecretKey, XOnlyPublicKey,
};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::{self, CryptoError, NONCE_LEN, TAG_LEN};
use crate::keys::KeyError;
use crate::master::MasterKey;
use crate::mobi::{Mobi, MobiError};

/// Only envelope version this build reads or writes.
pub const SEAL_VERSION: u8 = 0x01;

const SEAL_KEY_CONTEXT: &[u8] = b"bee/seal/v1";

pub const SIGNATURE_LEN: usize = 64;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid {what} length: expected {expected} bytes, got {got}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Bech32 error: {0}")]
    Bech32(String),
    #[error("Unsupported sealed message version: {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("Authentication failed: wrong key or corrupted message")]
    AuthenticationFailed,
    #[error("Invalid sealed message encoding: {0}")]
    InvalidEncoding(String),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Mobi(#[from] MobiError),
    #[error(transparent)]
    Crypto(CryptoError),
}

impl From<CryptoError> for IdentityError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AuthenticationFailed => IdentityError::AuthenticationFailed,
            other => IdentityError::Crypto(other),
        }
    }
}

fn fixed<const N: usize>(what: &'static str, bytes: &[u8]) -> Result<[u8; N], IdentityError> {
    bytes.try_into().map_err(|_| IdentityError::InvalidLength {
        what,
        expected: N,
        got: bytes.len(),
    })
}

/// Recover the even-`y` point for an x-only public key.
pub fn lift_x(x: &[u8]) -> Result<PublicKey, IdentityError> {
    let x: [u8; 32] = fixed("public key", x)?;
    let xonly =
        XOnlyPublicKey::from_slice(&x).map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
    Ok(PublicKey::from_x_only_public_key(xonly, Parity::Even))
}

/// Verify a BIP-340 signature.
///
/// Only wrong input lengths are errors. A public key that is not on the
/// curve, or any signature that does not verify, is `Ok(false)`.
pub fn verify(pubkey: &[u8], message_hash: &[u8], signature: &[u8]) -> Result<bool, IdentityError> {
    let pubkey: [u8; 32] = fixed("public key", pubkey)?;
    let hash: [u8; 32] = fixed("message hash", message_hash)?;
    let signature: [u8; SIGNATURE_LEN] = fixed("signature", signature)?;

    let Ok(xonly) = XOnlyPublicKey::from_slice(&pubkey) else {
        return Ok(false);
    };
    let Ok(sig) = schnorr::Signature::from_slice(&signature) else {
        return Ok(false);
    };

    let secp = Secp256k1::verification_only();
    Ok(secp
        .verify_schnorr(&sig, &Message::from_digest(hash), &xonly)
        .is_ok())
}

/// Verify a signature made with [`SchnorrIdentity::sign_message`].
pub fn verify_message(
    pubkey: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, IdentityError> {
    verify(pubkey, &Sha256::digest(message), signature)
}

/// A secp256k1 keypair used as a Nostr identity.
///
/// The secret key is overwritten on drop or by [`SchnorrIdentity::zeroize`].
pub struct SchnorrIdentity {
    secp: Secp256k1<All>,
    keypair: Keypair,
    public_key: XOnlyPublicKey,
    zeroized: bool,
}

impl SchnorrIdentity {
    fn from_secret_key(secret: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let keypair = Keypair::from_secret_key(&secp, &secret);
        let (public_key, _parity) = keypair.x_only_public_key();
        Self {
            secp,
            keypair,
            public_key,
            zeroized: false,
        }
    }

    fn live_keypair(&self) -> Result<&Keypair, IdentityError> {
        if self.zeroized {
            return Err(KeyError::Zeroized.into());
        }
        Ok(&self.keypair)
    }

    /// The NIP-06 identity of a master key.
    pub fn from_master_key(master: &MasterKey) -> Result<Self, IdentityError> {
        let pair = master.nostr_keypair()?;
        Self::from_secret_bytes(pair.private_key())
    }

    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, IdentityError> {
        let bytes: Zeroizing<[u8; 32]> = Zeroizing::new(fixed("private key", secret)?);
        let secret = SecretKey::from_slice(&bytes[..])
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Ok(Self::from_secret_key(secret))
    }

    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, IdentityError> {
        if secret_hex.len() != 64 {
            return Err(IdentityError::InvalidLength {
                what: "private key",
                expected: 32,
                got: secret_hex.len() / 2,
            });
        }
        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(secret_hex, &mut bytes[..])
            .map_err(|e| IdentityError::InvalidKey(e.to_string()))?;
        Self::from_secret_bytes(&bytes[..])
    }

    /// Import a bech32 `nsec1...` key.
    pub fn from_nsec(nsec: &str) -> Result<Self, IdentityError> {
        let secret = nostr_sdk::SecretKey::from_bech32(nsec)
            .map_err(|e| IdentityError::Bech32(e.to_string()))?;
        let bytes = Zeroizing::new(secret.to_secret_bytes());
        Self::from_secret_bytes(&bytes[..])
    }

    /// A random identity.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, _) = secp.generate_keypair(&mut OsRng);
        Self::from_secret_key(secret)
    }

    /// x-only public key.
    pub fn public_key(&self) -> [u8; 32] {
        self.public_key.serialize()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key())
    }

    pub fn npub(&self) -> Result<String, IdentityError> {
        let pk = nostr_sdk::PublicKey::from_slice(&self.public_key())
            .map_err(|e| IdentityError::Bech32(e.to_string()))?;
        pk.to_bech32().map_err(|e| IdentityError::Bech32(e.to_string()))
    }

    pub fn nsec(&self) -> Result<Zeroizing<String>, IdentityError> {
        let bytes = Zeroizing::new(self.live_keypair()?.secret_bytes());
        let secret = nostr_sdk::SecretKey::from_slice(&bytes[..])
            .map_err(|e| IdentityError::Bech32(e.to_string()))?;
        secret
            .to_bech32()
            .map(Zeroizing::new)
            .map_err(|e| IdentityError::Bech32(e.to_string()))
    }

    pub fn mobi(&self) -> Result<Mobi, IdentityError> {
        Ok(Mobi::from_public_key(&self.public_key())?)
    }

    /// Sign a 32-byte hash with fresh auxiliary randomness.
    pub fn sign(&self, message_hash: &[u8]) -> Result<[u8; SIGNATURE_LEN], IdentityError> {
        let mut aux = [0u8; 32];
        OsRng.fill_bytes(&mut aux);
        self.sign_with_aux(message_hash, &aux)
    }

    /// Sign with caller-supplied auxiliary randomness (deterministic).
    pub fn sign_with_aux(
        &self,
        message_hash: &[u8],
        aux: &[u8; 32],
    ) -> Result<[u8; SIGNATURE_LEN], IdentityError> {
        let keypair = self.live_keypair()?;
        let hash: [u8; 32] = fixed("message hash", message_hash)?;
        let sig = self
            .secp
            .sign_schnorr_with_aux_rand(&Message::from_digest(hash), keypair, aux);
        Ok(sig.serialize())
    }

    /// Sign `SHA-256(message)`.
    pub fn sign_message(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LEN], IdentityError> {
        self.sign(&Sha256::digest(message))
    }

    /// x coordinate of `secret · lift_x(other)`.
    pub fn derive_shared_secret(
        &self,
        other_pubkey: &[u8],
    ) -> Result<Zeroizing<[u8; 32]>, IdentityError> {
        let keypair = self.live_keypair()?;
        let point = lift_x(other_pubkey)?;
        let secret = SecretKey::from_keypair(keypair);
        let xy = Zeroizing::new(ecdh::shared_secret_point(&point, &secret));

        let mut shared = Zeroizing::new([0u8; 32]);
        shared.copy_from_slice(&xy[..32]);
        Ok(shared)
    }

    fn seal_key(&self, other_pubkey: &[u8]) -> Result<Zeroizing<[u8; 32]>, IdentityError> {
        let shared = self.derive_shared_secret(other_pubkey)?;
        let mut hasher = Sha256::new();
        hasher.update(SEAL_KEY_CONTEXT);
        hasher.update(&shared[..]);
        Ok(Zeroizing::new(hasher.finalize().into()))
    }

    /// Encrypt `plaintext` so only `recipient_pubkey` (and we) can read it.
    pub fn encrypt(
        &self,
        recipient_pubkey: &[u8],
        plaintext: &[u8],
    ) -> Result<SealedMessage, IdentityError> {
        let key = self.seal_key(recipient_pubkey)?;
        let sealed = crypto::seal_with_aad(&key, plaintext, &[SEAL_VERSION])?;
        SealedMessage::from_parts(SEAL_VERSION, &sealed)
    }

    /// Decrypt a message from `sender_pubkey`.
    pub fn decrypt(
        &self,
        sender_pubkey: &[u8],
        message: &SealedMessage,
    ) -> Result<Vec<u8>, IdentityError> {
        if message.version != SEAL_VERSION {
            return Err(IdentityError::UnsupportedVersion(message.version));
        }
        let key = self.seal_key(sender_pubkey)?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + message.ciphertext.len());
        sealed.extend_from_slice(&message.nonce);
        sealed.extend_from_slice(&message.ciphertext);
        Ok(crypto::unseal_with_aad(&key, &sealed, &[message.version])?)
    }

    /// [`SchnorrIdentity::encrypt`] returning the base64 text form.
    pub fn encrypt_to_string(
        &self,
        recipient_pubkey: &[u8],
        plaintext: &str,
    ) -> Result<String, IdentityError> {
        Ok(self.encrypt(recipient_pubkey, plaintext.as_bytes())?.to_base64())
    }

    /// Decrypt the base64 text form. The plaintext must be UTF-8.
    pub fn decrypt_str(&self, sender_pubkey: &[u8], encoded: &str) -> Result<String, IdentityError> {
        let message = SealedMessage::from_base64(encoded)?;
        let plaintext = self.decrypt(sender_pubkey, &message)?;
        String::from_utf8(plaintext).map_err(|e| IdentityError::InvalidEncoding(e.to_string()))
    }

    /// Overwrite the secret key. The public key stays readable; signing,
    /// ECDH and `nsec` fail with [`KeyError::Zeroized`] from then on.
    pub fn zeroize(&mut self) {
        self.keypair.non_secure_erase();
        self.zeroized = true;
    }

    pub fn is_zeroized(&self) -> bool {
        self.zeroized
    }
}

impl Drop for SchnorrIdentity {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for SchnorrIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchnorrIdentity")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Versioned output of [`SchnorrIdentity::encrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    version: u8,
    nonce: [u8; NONCE_LEN],
    /// Ciphertext followed by the 16-byte tag
    ciphertext: Vec<u8>,
}

impl SealedMessage {
    pub const MIN_LEN: usize = 1 + NONCE_LEN + TAG_LEN;

    fn from_parts(version: u8, sealed: &[u8]) -> Result<Self, IdentityError> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(IdentityError::InvalidLength {
                what: "sealed message",
                expected: Self::MIN_LEN,
                got: sealed.len() + 1,
            });
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let mut n = [0u8; NONCE_LEN];
        n.copy_from_slice(nonce);
        Ok(Self {
            version,
            nonce: n,
            ciphertext: ciphertext.to_vec(),
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Serialize: `version || nonce || ciphertext || tag`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + NONCE_LEN + self.ciphertext.len());
        bytes.push(self.version);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Parse the serialized form. Any version tag is accepted here;
    /// [`SchnorrIdentity::decrypt`] rejects unknown ones.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IdentityError> {
        match bytes.split_first() {
            Some((&version, rest)) if bytes.len() >= Self::MIN_LEN => {
                Self::from_parts(version, rest)
            }
            _ => Err(IdentityError::InvalidLength {
                what: "sealed message",
                expected: Self::MIN_LEN,
                got: bytes.len(),
            }),
        }
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    pub fn from_base64(encoded: &str) -> Result<Self, IdentityError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| IdentityError::InvalidEncoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}
