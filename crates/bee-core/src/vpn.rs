//! Curve25519 VPN key
//!
//! Raw HD-derived bytes are clamped per RFC 7748 and used as an X25519
//! private key. The text encoding is the one WireGuard uses: standard base64
//! of the 32 raw bytes.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use thiserror::Error;
use x25519_dalek::{x25519, X25519_BASEPOINT_BYTES};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VpnKeyError {
    #[error("Invalid key length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("Invalid base64 key: {0}")]
    InvalidEncoding(String),
}

/// Clamp a scalar for X25519.
///
/// Clears the low three bits (cofactor), clears the top bit and sets bit 254.
pub fn clamp(mut raw: [u8; 32]) -> [u8; 32] {
    raw[0] &= 0b1111_1000;
    raw[31] &= 0b0111_1111;
    raw[31] |= 0b0100_0000;
    raw
}

/// Whether `key` already satisfies the clamping rules.
pub fn is_clamped(key: &[u8; 32]) -> bool {
    key[0] & 0b0000_0111 == 0 && key[31] & 0b1000_0000 == 0 && key[31] & 0b0100_0000 != 0
}

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct VpnKey {
    private_key: [u8; 32],
    public_key: [u8; 32],
}

impl VpnKey {
    /// Clamp `raw` and compute its X25519 public key.
    pub fn from_raw(raw: [u8; 32]) -> Self {
        let private_key = clamp(raw);
        let public_key = x25519(private_key, X25519_BASEPOINT_BYTES);
        Self {
            private_key,
            public_key,
        }
    }

    /// Import a WireGuard private key. Unclamped input is clamped.
    pub fn from_private_base64(encoded: &str) -> Result<Self, VpnKeyError> {
        let mut decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| VpnKeyError::InvalidEncoding(e.to_string()))?;
        let result = <[u8; 32]>::try_from(decoded.as_slice())
            .map(Self::from_raw)
            .map_err(|_| VpnKeyError::InvalidLength(decoded.len()));
        decoded.zeroize();
        result
    }

    pub fn private_key(&self) -> &[u8; 32] {
        &self.private_key
    }

    pub fn public_key(&self) -> &[u8; 32] {
        &self.public_key
    }

    pub fn private_key_base64(&self) -> zeroize::Zeroizing<String> {
        zeroize::Zeroizing::new(BASE64.encode(self.private_key))
    }

    pub fn public_key_base64(&self) -> String {
        BASE64.encode(self.public_key)
    }

    /// Raw X25519 Diffie-Hellman with a peer's public key.
    pub fn diffie_hellman(&self, peer_public: &[u8; 32]) -> zeroize::Zeroizing<[u8; 32]> {
        zeroize::Zeroizing::new(x25519(self.private_key, *peer_public))
    }
}

impl fmt::Debug for VpnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VpnKey")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key_base64())
            .finish()
    }
}
