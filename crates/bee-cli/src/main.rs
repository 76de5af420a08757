//! Bee CLI: derive and inspect identities from a BIP-39 mnemonic
//!
//! # Usage
//!
//! ```bash
//! bee generate --words 24
//! BEE_MNEMONIC="..." bee identity --config bee.toml
//! bee mobi npub1...
//! bee check-mobi 123-456-789-012
//! ```

mod config;

use anyhow::{Context, Result};
use bee_core::{Branch, MasterKey, Mobi, Network, SchnorrIdentity, WordCount};
use std::path::PathBuf;
use zeroize::Zeroizing;

enum Command {
    Generate { words: WordCount },
    Identity,
    Mobi { pubkey: String },
    CheckMobi { value: String },
}

fn main() -> Result<()> {
    // Keep seed material out of core files
    bee_core::disable_core_dumps();

    // Parse CLI args (manual, no clap)
    let args: Vec<String> = std::env::args().collect();

    let mut config_path = PathBuf::from("bee.toml");
    let mut words = WordCount::Twelve;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                match args.get(i) {
                    Some(path) => config_path = PathBuf::from(path),
                    None => anyhow::bail!("--config requires a path argument"),
                }
            }
            "--words" | "-w" => {
                i += 1;
                words = match args.get(i).map(String::as_str) {
                    Some("12") => WordCount::Twelve,
                    Some("24") => WordCount::TwentyFour,
                    Some(other) => anyhow::bail!("--words must be 12 or 24, got {}", other),
                    None => anyhow::bail!("--words requires 12 or 24"),
                };
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--version" | "-V" => {
                println!("bee {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            flag if flag.starts_with('-') => {
                anyhow::bail!("Unknown argument: {}", flag);
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        [] => {
            print_help();
            return Ok(());
        }
        [cmd] if cmd == "generate" => Command::Generate { words },
        [cmd] if cmd == "identity" => Command::Identity,
        [cmd, pubkey] if cmd == "mobi" => Command::Mobi {
            pubkey: pubkey.clone(),
        },
        [cmd, value] if cmd == "check-mobi" => Command::CheckMobi {
            value: value.clone(),
        },
        [cmd, ..] => anyhow::bail!("Unknown command or wrong arguments: {} (see --help)", cmd),
    };

    // Load config
    let mut bee_config = config::BeeConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Apply env overrides
    bee_config.apply_env_overrides();

    // Validate
    bee_config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    std::env::set_var("RUST_LOG", &bee_config.general.log_level);
    env_logger::init();

    log::debug!(
        "Loaded config from {} (network {})",
        config_path.display(),
        bee_config.bitcoin.network
    );

    match command {
        Command::Generate { words } => generate(&bee_config, words),
        Command::Identity => identity(&bee_config),
        Command::Mobi { pubkey } => mobi(&pubkey),
        Command::CheckMobi { value } => check_mobi(&value),
    }
}

fn generate(cfg: &config::BeeConfig, words: WordCount) -> Result<()> {
    let master = MasterKey::generate(words.words() / 3 * 32, cfg.network())
        .context("Failed to generate mnemonic")?;

    println!("Mnemonic ({} words), write it down and keep it offline:", words.words());
    println!();
    println!("    {}", master.mnemonic().unwrap_or_default());
    println!();
    print_identity(&master, cfg.bitcoin.address_count)
}

fn identity(cfg: &config::BeeConfig) -> Result<()> {
    let mnemonic = Zeroizing::new(
        std::env::var(&cfg.identity.mnemonic_env)
            .with_context(|| format!("Set {} to your mnemonic", cfg.identity.mnemonic_env))?,
    );
    let passphrase =
        Zeroizing::new(std::env::var(&cfg.identity.passphrase_env).unwrap_or_default());

    let master = MasterKey::from_mnemonic(&mnemonic, cfg.network(), &passphrase)
        .context("Failed to load mnemonic")?;
    print_identity(&master, cfg.bitcoin.address_count)
}

fn print_identity(master: &MasterKey, address_count: u32) -> Result<()> {
    let nostr = SchnorrIdentity::from_master_key(master)?;
    let mobi = master.mobi()?;

    println!("Mobi:          {}", mobi.format_display());
    println!("  extended:    {}", mobi.format_extended());
    println!("  full:        {}", mobi.format_full());
    println!("Nostr npub:    {}", nostr.npub()?);
    println!("Nostr pubkey:  {}", nostr.public_key_hex());
    println!("Network:       {}", network_label(master.network()));
    println!("Account xpub:  {}", master.bitcoin_xpub_string()?);
    for index in 0..address_count {
        println!(
            "  receive/{:<3}  {}",
            index,
            master.bitcoin_address(Branch::Receive, index)?
        );
    }
    println!("VPN pubkey:    {}", master.vpn_key()?.public_key_base64());
    Ok(())
}

fn network_label(network: Network) -> &'static str {
    match network {
        Network::Bitcoin => "bitcoin",
        Network::Testnet => "testnet",
        Network::Signet => "signet",
        Network::Regtest => "regtest",
        _ => "other",
    }
}

fn mobi(pubkey: &str) -> Result<()> {
    let derived = if pubkey.starts_with("npub1") {
        Mobi::from_npub(pubkey)
    } else {
        Mobi::from_public_key_hex(pubkey)
    };
    let mobi = derived.with_context(|| format!("Cannot derive a Mobi from {}", pubkey))?;

    println!("{}", mobi.format_display());
    println!("{}", mobi.format_extended());
    println!("{}", mobi.format_full());
    Ok(())
}

fn check_mobi(value: &str) -> Result<()> {
    let Some(digits) = Mobi::normalize(value) else {
        anyhow::bail!("{:?} is not a Mobi (expected 12, 15, 18 or 21 digits)", value);
    };
    let mobi = Mobi::parse(&digits)?;

    println!("Valid {}-digit Mobi", digits.len());
    println!("  display:     {}", mobi.format_display());
    if digits.len() == bee_core::mobi::FULL_LEN {
        println!("  extended:    {}", mobi.format_extended());
        println!("  full:        {}", mobi.format_full());
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"Bee: one mnemonic, every identity

USAGE:
    bee [OPTIONS] <COMMAND>

COMMANDS:
    generate              Create a new mnemonic and print its identity
    identity              Print the identity for the mnemonic in $BEE_MNEMONIC
    mobi <PUBKEY>         Mobi number for a hex or npub Nostr public key
    check-mobi <VALUE>    Validate a Mobi number

OPTIONS:
    -c, --config <PATH>   Config file path (default: ./bee.toml, optional)
    -w, --words <12|24>   Mnemonic length for `generate` (default: 12)
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    BEE_LOG_LEVEL         Log level (error/warn/info/debug/trace)
    BEE_NETWORK           Bitcoin network (bitcoin/testnet/signet/regtest)
    BEE_ADDRESS_COUNT     Receive addresses to print (1-100)
    BEE_MNEMONIC          Mnemonic read by `identity` (name configurable)
    BEE_PASSPHRASE        Optional BIP-39 passphrase (name configurable)

EXAMPLES:
    bee generate --words 24
    BEE_NETWORK=signet bee identity
    bee check-mobi 123-456-789-012
"#
    );
}
