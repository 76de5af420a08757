//! Mobi: a 21-digit numeric identifier derived from a public key
//!
//! ```text
//! pubkey (32 bytes)
//!     -> SHA-256(pubkey)             first 9 bytes as a 72-bit integer v
//!     -> v < 10^21 ?  done           else SHA-256(pubkey || r), r = 1, 2, ...
//!     -> 21 zero-padded decimal digits
//! ```
//!
//! `2^72 > 10^21`, so reducing `v` modulo `10^21` would favour small values.
//! Out-of-range draws are rejected and re-hashed instead. Each draw lands with
//! probability `10^21 / 2^72 ≈ 0.847`; the 256-attempt cap is never reached in
//! practice.
//!
//! Shorter views are always prefixes of the full value:
//!
//! | View       | Digits | Formatted          |
//! |------------|--------|--------------------|
//! | `display`  | 12     | `123-456-789-012`  |
//! | `extended` | 15     | 5 groups of 3      |
//! | `long`     | 18     | (unformatted)      |
//! | `full`     | 21     | 7 groups of 3      |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const FULL_LEN: usize = 21;
pub const DISPLAY_LEN: usize = 12;
pub const EXTENDED_LEN: usize = 15;
pub const LONG_LEN: usize = 18;

/// Exclusive upper bound of a Mobi value.
const MOBI_BOUND: u128 = 1_000_000_000_000_000_000_000;

/// Round 0 plus rounds 1..=255 (the round counter is a single byte).
const MAX_ATTEMPTS: usize = 256;

/// Characters `normalize` strips before checking digits.
const SEPARATORS: [char; 5] = [' ', '-', '.', '(', ')'];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MobiError {
    #[error("Invalid public key length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Invalid Mobi format: {0:?}")]
    InvalidFormat(String),
    #[error("Mobi derivation exhausted after {0} attempts")]
    DerivationExhausted(usize),
    #[error("Invalid npub: {0}")]
    Bech32(String),
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mobi {
    full: String,
}

impl Mobi {
    /// Derive the Mobi for a 32-byte public key.
    pub fn from_public_key(pubkey: &[u8; 32]) -> Result<Self, MobiError> {
        derive_with(pubkey, |data| Sha256::digest(data).into())
    }

    /// Like [`Mobi::from_public_key`], checking the length first.
    pub fn from_public_key_slice(pubkey: &[u8]) -> Result<Self, MobiError> {
        let key: &[u8; 32] = pubkey.try_into().map_err(|_| MobiError::InvalidLength {
            expected: 32,
            got: pubkey.len(),
        })?;
        Self::from_public_key(key)
    }

    /// Derive from a 64-character hex public key.
    pub fn from_public_key_hex(pubkey_hex: &str) -> Result<Self, MobiError> {
        if pubkey_hex.len() != 64 {
            return Err(MobiError::InvalidLength {
                expected: 32,
                got: pubkey_hex.len() / 2,
            });
        }
        let mut key = [0u8; 32];
        hex::decode_to_slice(pubkey_hex, &mut key)
            .map_err(|e| MobiError::InvalidHex(e.to_string()))?;
        Self::from_public_key(&key)
    }

    /// Derive from a bech32 `npub1...` public key.
    pub fn from_npub(npub: &str) -> Result<Self, MobiError> {
        use nostr_sdk::FromBech32;

        let pk = nostr_sdk::PublicKey::from_bech32(npub)
            .map_err(|e| MobiError::Bech32(e.to_string()))?;
        Self::from_public_key_hex(&pk.to_hex())
    }

    /// Strip separators and check the digit count.
    ///
    /// Returns the bare digits, or `None` if anything other than ASCII digits
    /// remains or the count is not 12, 15, 18 or 21.
    pub fn normalize(input: &str) -> Option<String> {
        let digits: String = input.chars().filter(|c| !SEPARATORS.contains(c)).collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        match digits.len() {
            DISPLAY_LEN | EXTENDED_LEN | LONG_LEN | FULL_LEN => Some(digits),
            _ => None,
        }
    }

    /// Parse any of the four views, formatted or not.
    ///
    /// Shorter inputs are right-padded with zeros to 21 digits, so a parsed
    /// 12-digit Mobi is indistinguishable from a full Mobi whose last nine
    /// digits happen to be zero. Compare parsed partial values with
    /// [`Mobi::display_matches`] rather than equality.
    pub fn parse(input: &str) -> Result<Self, MobiError> {
        let mut full =
            Self::normalize(input).ok_or_else(|| MobiError::InvalidFormat(input.to_string()))?;
        while full.len() < FULL_LEN {
            full.push('0');
        }
        Ok(Self { full })
    }

    pub fn try_parse(input: &str) -> Option<Self> {
        Self::parse(input).ok()
    }

    pub fn validate(input: &str) -> bool {
        Self::normalize(input).is_some()
    }

    pub fn full(&self) -> &str {
        &self.full
    }

    pub fn display(&self) -> &str {
        &self.full[..DISPLAY_LEN]
    }

    pub fn extended(&self) -> &str {
        &self.full[..EXTENDED_LEN]
    }

    pub fn long(&self) -> &str {
        &self.full[..LONG_LEN]
    }

    /// `123-456-789-012`
    pub fn format_display(&self) -> String {
        group_by_three(self.display())
    }

    /// `123-456-789-012-345`
    pub fn format_extended(&self) -> String {
        group_by_three(self.extended())
    }

    /// `123-456-789-012-345-678-901`
    pub fn format_full(&self) -> String {
        group_by_three(&self.full)
    }

    /// Whether the first 12 digits of `input` equal [`Mobi::display`].
    ///
    /// Digits past the twelfth are ignored; unparseable input never matches.
    pub fn display_matches(&self, input: &str) -> bool {
        match Self::normalize(input) {
            Some(digits) => digits[..DISPLAY_LEN] == *self.display(),
            None => false,
        }
    }

    pub fn full_matches(&self, other: &Mobi) -> bool {
        self.full == other.full
    }
}

fn group_by_three(digits: &str) -> String {
    digits
        .as_bytes()
        .chunks(3)
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("-")
}

fn leading_72_bits(hash: &[u8; 32]) -> u128 {
    hash[..9]
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b))
}

/// Rejection-sample a value below 10^21 using `hash` as the random oracle.
fn derive_with<H>(pubkey: &[u8; 32], hash: H) -> Result<Mobi, MobiError>
where
    H: Fn(&[u8]) -> [u8; 32],
{
    let mut input = [0u8; 33];
    input[..32].copy_from_slice(pubkey);

    for attempt in 0..MAX_ATTEMPTS {
        let digest = if attempt == 0 {
            hash(&input[..32])
        } else {
            input[32] = attempt as u8;
            hash(&input)
        };

        let value = leading_72_bits(&digest);
        if value < MOBI_BOUND {
            log::trace!("mobi accepted on round {}", attempt);
            return Ok(Mobi {
                full: format!("{:0width$}", value, width = FULL_LEN),
            });
        }
    }

    Err(MobiError::DerivationExhausted(MAX_ATTEMPTS))
}

impl fmt::Display for Mobi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_display())
    }
}

impl fmt::Debug for Mobi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mobi").field(&self.full).finish()
    }
}

impl FromStr for Mobi {
    type Err = MobiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Mobi {
    type Error = MobiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Mobi> for String {
    fn from(mobi: Mobi) -> Self {
        mobi.full
    }
}
