//! BIP-39 mnemonic handling
//!
//! Normalization, validation, generation and seed stretching. The wordlist and
//! checksum live in the `bip39` crate; this module only decides how phrases
//! are cleaned up before they reach it.

use bip39::{Language, Mnemonic};
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Unsupported mnemonic strength: {0} bits (expected 128 or 256)")]
    InvalidStrength(usize),
}

/// Entropy sizes accepted by [`generate_mnemonic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCount {
    /// 128 bits of entropy
    Twelve,
    /// 256 bits of entropy
    TwentyFour,
}

impl WordCount {
    /// Map an entropy size in bits to a word count.
    pub fn from_strength(bits: usize) -> Result<Self, SeedError> {
        match bits {
            128 => Ok(Self::Twelve),
            256 => Ok(Self::TwentyFour),
            other => Err(SeedError::InvalidStrength(other)),
        }
    }

    pub fn words(self) -> usize {
        match self {
            Self::Twelve => 12,
            Self::TwentyFour => 24,
        }
    }
}

/// Lower-case a phrase and collapse every whitespace run to a single space.
///
/// Two phrases that differ only in case or spacing normalize to the same
/// string, and therefore stretch to the same seed.
pub fn normalize_mnemonic(phrase: &str) -> Zeroizing<String> {
    let lowered = Zeroizing::new(phrase.to_lowercase());
    let words: Vec<&str> = lowered.split_whitespace().collect();
    Zeroizing::new(words.join(" "))
}

/// Whether a phrase passes wordlist and checksum validation after normalization.
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse_mnemonic(phrase).is_ok()
}

/// Generate a new English mnemonic from the OS CSPRNG.
pub fn generate_mnemonic(count: WordCount) -> Result<Mnemonic, SeedError> {
    Mnemonic::generate_in(Language::English, count.words())
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))
}

/// Parse a mnemonic, normalizing it first.
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, SeedError> {
    let normalized = normalize_mnemonic(phrase);
    Mnemonic::parse_in_normalized(Language::English, &normalized)
        .map_err(|e| SeedError::InvalidMnemonic(e.to_string()))
}

/// Derive seed bytes from mnemonic (with optional passphrase)
pub fn derive_seed(mnemonic: &Mnemonic, passphrase: &str) -> Zeroizing<[u8; 64]> {
    Zeroizing::new(mnemonic.to_seed(passphrase))
}
