//! Application configuration.
//!
//! Loaded from a JSON file (path in `LOOPSWAP_CONFIG`, default `config.json`),
//! then selectively overridden from the environment. Every section has
//! defaults, so a partial file is fine.

use loopswap_core::{AddressBook, AssetAddresses, Symbol};
use loopswap_engine::{Denylist, EngineConfig};
use loopswap_executor::{DEFAULT_SWAP_PROGRAM_ID, DEFAULT_TOKEN_PROGRAM_ID};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_PATH_VAR: &str = "LOOPSWAP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

const RPC_URL_VAR: &str = "LOOPSWAP_RPC_URL";
const WS_URL_VAR: &str = "LOOPSWAP_WS_URL";
const KEYPAIR_VAR: &str = "LOOPSWAP_KEYPAIR";
const POOL_FEED_URL_VAR: &str = "LOOPSWAP_POOL_FEED_URL";

/// Configuration errors. All are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid address for {field}: '{value}'")]
    InvalidAddress { field: String, value: String },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkSettings,
    pub wallet: WalletSettings,
    pub program: ProgramSettings,
    pub engine: EngineSettings,
    pub execution: ExecutionSettings,
    /// Seconds between stats log lines.
    pub stats_interval_secs: u64,
    /// Fallback log level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: NetworkSettings::default(),
            wallet: WalletSettings::default(),
            program: ProgramSettings::default(),
            engine: EngineSettings::default(),
            execution: ExecutionSettings::default(),
            stats_interval_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let display = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Load from the file named by `LOOPSWAP_CONFIG` and apply environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overwrite connection and wallet settings from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup(RPC_URL_VAR) {
            self.network.rpc_url = v;
        }
        if let Some(v) = lookup(WS_URL_VAR) {
            self.network.ws_url = v;
        }
        if let Some(v) = lookup(KEYPAIR_VAR) {
            self.wallet.keypair_path = v;
        }
        if let Some(v) = lookup(POOL_FEED_URL_VAR) {
            self.network.pool_feed_url = v;
        }
    }
}

/// Endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub rpc_url: String,
    pub ws_url: String,
    /// Pool listing endpoint, fetched once at startup.
    pub pool_feed_url: String,
    /// Commitment for the batched reserve read.
    pub commitment: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            ws_url: "wss://api.mainnet-beta.solana.com".to_string(),
            pool_feed_url: "http://127.0.0.1:8080/pools".to_string(),
            commitment: "confirmed".to_string(),
        }
    }
}

/// Addresses for one asset, as base58 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAddressSettings {
    pub mint: String,
    pub token_account: String,
}

/// Signing key and token accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSettings {
    pub keypair_path: String,
    pub address_book: BTreeMap<String, AssetAddressSettings>,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            keypair_path: "keypair.json".to_string(),
            address_book: BTreeMap::new(),
        }
    }
}

impl WalletSettings {
    /// Parse every entry into an [`AddressBook`].
    pub fn address_book(&self) -> Result<AddressBook, ConfigError> {
        let mut book = AddressBook::new();
        for (symbol, entry) in &self.address_book {
            book.insert(
                symbol,
                AssetAddresses {
                    mint: parse_pubkey(&format!("{}.mint", symbol), &entry.mint)?,
                    token_account: parse_pubkey(
                        &format!("{}.token_account", symbol),
                        &entry.token_account,
                    )?,
                },
            );
        }
        Ok(book)
    }
}

/// On-chain programs the swap instructions target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSettings {
    pub swap_program_id: String,
    pub token_program_id: String,
}

impl Default for ProgramSettings {
    fn default() -> Self {
        Self {
            swap_program_id: DEFAULT_SWAP_PROGRAM_ID.to_string(),
            token_program_id: DEFAULT_TOKEN_PROGRAM_ID.to_string(),
        }
    }
}

impl ProgramSettings {
    pub fn swap_program(&self) -> Result<Pubkey, ConfigError> {
        parse_pubkey("swap_program_id", &self.swap_program_id)
    }

    pub fn token_program(&self) -> Result<Pubkey, ConfigError> {
        parse_pubkey("token_program_id", &self.token_program_id)
    }
}

/// Detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Candidate asset symbols. Pools outside this set are ignored.
    pub assets: Vec<String>,
    /// Pair names excluded from every path, e.g. pegged stable pairs.
    pub denylist: Vec<String>,
    pub min_profit: u64,
    pub burst_threshold: u64,
    pub burst_repeats: u32,
    pub cooldown_ms: u64,
    pub fee_numerator: u64,
    pub fee_denominator: u64,
    pub haircut_divisor: u64,
    pub cycle_interval_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        Self {
            assets: ["SOL", "USDC", "USDT", "ETH", "mSOL", "ORCA"]
                .into_iter()
                .map(String::from)
                .collect(),
            denylist: vec!["USDC/USDT".to_string()],
            min_profit: defaults.min_profit,
            burst_threshold: defaults.burst_threshold,
            burst_repeats: defaults.burst_repeats,
            cooldown_ms: defaults.cooldown.as_millis() as u64,
            fee_numerator: defaults.fee_numerator,
            fee_denominator: defaults.fee_denominator,
            haircut_divisor: defaults.haircut_divisor,
            cycle_interval_ms: defaults.cycle_interval.as_millis() as u64,
        }
    }
}

impl EngineSettings {
    pub fn symbols(&self) -> Vec<Symbol> {
        self.assets.iter().map(|s| Symbol::new(s)).collect()
    }

    pub fn denylist(&self) -> Denylist {
        Denylist::new(self.denylist.iter())
    }
}

impl From<&EngineSettings> for EngineConfig {
    fn from(settings: &EngineSettings) -> Self {
        EngineConfig {
            min_profit: settings.min_profit,
            burst_threshold: settings.burst_threshold,
            burst_repeats: settings.burst_repeats,
            cooldown: Duration::from_millis(settings.cooldown_ms),
            fee_numerator: settings.fee_numerator,
            fee_denominator: settings.fee_denominator,
            haircut_divisor: settings.haircut_divisor,
            cycle_interval: Duration::from_millis(settings.cycle_interval_ms),
        }
    }
}

/// Submission settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    pub mode: ExecutionMode,
    /// Skip the node's simulation before accepting a transaction.
    pub skip_preflight: bool,
}

/// Execution mode for the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Submit every fired loop.
    #[default]
    Live,
    /// Sign and log, never submit.
    DryRun,
}

impl From<ExecutionMode> for loopswap_executor::ExecutionMode {
    fn from(mode: ExecutionMode) -> Self {
        match mode {
            ExecutionMode::Live => loopswap_executor::ExecutionMode::Live,
            ExecutionMode::DryRun => loopswap_executor::ExecutionMode::DryRun,
        }
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value).map_err(|_| ConfigError::InvalidAddress {
        field: field.to_string(),
        value: value.to_string(),
    })
}
