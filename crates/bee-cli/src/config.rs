//! CLI configuration, parsed from a TOML file plus environment variable overrides.
//!
//! Priority: environment variables > config file > defaults.

use anyhow::{Context, Result};
use bee_core::Network;
use serde::{Deserialize, Serialize};
use std::path::Path;

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const MAX_ADDRESS_COUNT: u32 = 100;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeeConfig {
    #[serde(default)]
    pub general: GeneralSection,

    #[serde(default)]
    pub bitcoin: BitcoinSection,

    /// Where the secret inputs come from
    #[serde(default)]
    pub identity: IdentitySection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralSection {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinSection {
    /// Bitcoin network: "bitcoin", "testnet", "signet", "regtest"
    #[serde(default = "default_network")]
    pub network: String,

    /// Receive addresses printed by `bee identity`
    #[serde(default = "default_address_count")]
    pub address_count: u32,
}

impl Default for BitcoinSection {
    fn default() -> Self {
        Self {
            network: default_network(),
            address_count: default_address_count(),
        }
    }
}

/// Names of the environment variables holding the mnemonic and passphrase.
///
/// The secrets themselves never go in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySection {
    #[serde(default = "default_mnemonic_env")]
    pub mnemonic_env: String,

    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            mnemonic_env: default_mnemonic_env(),
            passphrase_env: default_passphrase_env(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_network() -> String {
    "bitcoin".to_string()
}

fn default_address_count() -> u32 {
    3
}

fn default_mnemonic_env() -> String {
    "BEE_MNEMONIC".to_string()
}

fn default_passphrase_env() -> String {
    "BEE_PASSPHRASE".to_string()
}

/// Map a network name to a `Network`.
pub fn parse_network(name: &str) -> Option<Network> {
    match name {
        "bitcoin" | "mainnet" => Some(Network::Bitcoin),
        "testnet" | "testnet3" => Some(Network::Testnet),
        "signet" => Some(Network::Signet),
        "regtest" => Some(Network::Regtest),
        _ => None,
    }
}

impl BeeConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: BeeConfig =
            toml::from_str(&contents).with_context(|| "Failed to parse TOML config")?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `BEE_LOG_LEVEL`
    /// - `BEE_NETWORK`
    /// - `BEE_ADDRESS_COUNT` (ignored unless it parses as an integer)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BEE_LOG_LEVEL") {
            self.general.log_level = v;
        }
        if let Ok(v) = std::env::var("BEE_NETWORK") {
            self.bitcoin.network = v;
        }
        if let Ok(v) = std::env::var("BEE_ADDRESS_COUNT") {
            if let Ok(count) = v.parse::<u32>() {
                self.bitcoin.address_count = count;
            }
        }
    }

    /// The configured network. Unknown names fall back to mainnet;
    /// [`BeeConfig::validate`] rejects them first.
    pub fn network(&self) -> Network {
        parse_network(&self.bitcoin.network).unwrap_or(Network::Bitcoin)
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            LOG_LEVELS.contains(&self.general.log_level.as_str()),
            "general.log_level must be one of {:?}, got {:?}",
            LOG_LEVELS,
            self.general.log_level
        );

        anyhow::ensure!(
            parse_network(&self.bitcoin.network).is_some(),
            "bitcoin.network must be bitcoin, testnet, signet or regtest, got {:?}",
            self.bitcoin.network
        );

        anyhow::ensure!(
            (1..=MAX_ADDRESS_COUNT).contains(&self.bitcoin.address_count),
            "bitcoin.address_count must be between 1 and {}",
            MAX_ADDRESS_COUNT
        );

        anyhow::ensure!(
            !self.identity.mnemonic_env.is_empty(),
            "identity.mnemonic_env must not be empty"
        );
        anyhow::ensure!(
            !self.identity.passphrase_env.is_empty(),
            "identity.passphrase_env must not be empty"
        );

        Ok(())
    }
}
