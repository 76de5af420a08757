//! Authenticated encryption and key stretching
//!
//! Argon2id turns a passphrase into a 256-bit key; XChaCha20-Poly1305 seals
//! data under that key (or any other 32-byte key, such as a Schnorr shared
//! secret hash).
//!
//! # Sealed format
//!
//! ```text
//! nonce (24 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! # Security Notes
//!
//! - Argon2id is memory-hard (resistant to GPU/ASIC attacks)
//! - The 192-bit nonce is drawn from the OS CSPRNG on every seal, so random
//!   nonces never collide in practice
//! - Keys returned by [`derive_key`] are zeroized on drop

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

/// Argon2id parameters (OWASP recommendations for 2024+)
/// - m_cost: 64 MiB memory
/// - t_cost: 3 iterations
/// - p_cost: 4 parallel lanes
const ARGON2_M_COST: u32 = 65536;
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

/// Symmetric key size (256 bits)
pub const KEY_LEN: usize = 32;

/// Salt length for Argon2
pub const SALT_LEN: usize = 16;

/// Nonce length for XChaCha20-Poly1305
pub const NONCE_LEN: usize = 24;

/// Poly1305 tag length
pub const TAG_LEN: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Authentication failed: wrong key or corrupted data")]
    AuthenticationFailed,
    #[error("Invalid sealed data: {got} bytes is shorter than the {min}-byte minimum")]
    InvalidFormat { min: usize, got: usize },
}

/// Derive a 32-byte key from a passphrase using Argon2id.
///
/// Deterministic for a given passphrase and salt. An empty passphrase is
/// rejected.
pub fn derive_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    if passphrase.is_empty() {
        return Err(CryptoError::InvalidInput("empty passphrase".into()));
    }

    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(KEY_LEN))
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase, salt, &mut key[..])
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    Ok(key)
}

/// Fresh random salt for [`derive_key`].
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// `len` bytes from the OS CSPRNG.
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut out = vec![0u8; len];
    OsRng.fill_bytes(&mut out);
    out
}

/// Encrypt `plaintext` under `key`. Output: `nonce || ciphertext || tag`.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    seal_with_aad(key, plaintext, &[])
}

/// Decrypt data produced by [`seal`].
pub fn unseal(key: &[u8; KEY_LEN], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    unseal_with_aad(key, sealed, &[])
}

/// [`seal`] with associated data bound into the tag.
pub fn seal_with_aad(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// [`unseal`] with associated data. The AAD must match what was sealed.
pub fn unseal_with_aad(
    key: &[u8; KEY_LEN],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let min = NONCE_LEN + TAG_LEN;
    if sealed.len() < min {
        return Err(CryptoError::InvalidFormat {
            min,
            got: sealed.len(),
        });
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::AuthenticationFailed)
}
