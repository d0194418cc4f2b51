//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/example.toml.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::application::{ChainSettings, WorkerSettings};
use crate::strategy::{ScoringParams, TradingSetParams};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scoring: ScoringSection,
    #[serde(default)]
    pub trading_set: TradingSetSection,
    #[serde(default)]
    pub worker: WorkerSection,
    pub chains: Vec<ChainSection>,
    #[serde(default)]
    pub one_inch: OneInchSection,
    #[serde(default)]
    pub paper: PaperSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Momentum scoring section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    pub initial_score: f64,
    /// Multiplier for unfavorable (rising) price moves
    pub rise_multiplier: f64,
    /// Multiplier for favorable (falling) price moves
    pub fall_multiplier: f64,
    pub rise_bonus: f64,
    pub rise_bonus_threshold_pct: f64,
    /// Per-pass score clamp before any cooldown cycle
    pub base_cap: f64,
    /// Clamp growth per cooldown cycle
    pub cap_step: f64,
}

impl Default for ScoringSection {
    fn default() -> Self {
        let p = ScoringParams::default();
        Self {
            initial_score: p.initial_score,
            rise_multiplier: p.rise_multiplier,
            fall_multiplier: p.fall_multiplier,
            rise_bonus: p.rise_bonus,
            rise_bonus_threshold_pct: p.rise_bonus_threshold_pct,
            base_cap: p.base_cap,
            cap_step: p.cap_step,
        }
    }
}

/// Trading set section
///
/// Token amounts are in base units and may be written as integers or, when
/// they exceed the TOML integer range, as decimal strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingSetSection {
    pub max_size: usize,
    pub min_set_size: usize,
    pub admission_score: f64,
    pub native_admission_score: f64,
    pub native_maturity_score: f64,
    pub maturity_step: f64,
    pub strike_ceiling: u32,
    pub score_floor: f64,
    pub native_score_floor: f64,
    pub native_strike_ceiling: u32,
    /// Round-trip probe loss tolerance (80 = 0.8%)
    pub max_round_trip_loss_bps: u32,
    #[serde(deserialize_with = "amount::deserialize")]
    pub probe_amount: u128,
    #[serde(deserialize_with = "amount::deserialize")]
    pub buy_amount: u128,
    /// Native balance kept for gas, never sold
    #[serde(deserialize_with = "amount::deserialize")]
    pub native_reserve: u128,
    /// Share of native above the reserve converted on fallback
    pub native_liquidation_pct: u8,
}

impl Default for TradingSetSection {
    fn default() -> Self {
        let p = TradingSetParams::default();
        Self {
            max_size: p.max_size,
            min_set_size: p.min_set_size,
            admission_score: p.admission_score,
            native_admission_score: p.native_admission_score,
            native_maturity_score: p.native_maturity_score,
            maturity_step: p.maturity_step,
            strike_ceiling: p.strike_ceiling,
            score_floor: p.score_floor,
            native_score_floor: p.native_score_floor,
            native_strike_ceiling: p.native_strike_ceiling,
            max_round_trip_loss_bps: p.max_round_trip_loss_bps,
            probe_amount: p.probe_amount,
            buy_amount: p.buy_amount,
            native_reserve: p.native_reserve,
            native_liquidation_pct: p.native_liquidation_pct,
        }
    }
}

/// Worker loop section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    pub poll_interval_secs: u64,
    /// Polls spent in cooldown after a fallback (dormancy = passes * interval)
    pub cooldown_passes: u32,
    /// Timeout applied to every external call
    pub call_timeout_secs: u64,
    #[serde(deserialize_with = "amount::deserialize")]
    pub quote_amount: u128,
    #[serde(deserialize_with = "amount::deserialize")]
    pub native_quote_amount: u128,
}

impl Default for WorkerSection {
    fn default() -> Self {
        let s = WorkerSettings::default();
        Self {
            poll_interval_secs: s.poll_interval.as_secs(),
            cooldown_passes: s.cooldown_passes,
            call_timeout_secs: s.call_timeout.as_secs(),
            quote_amount: s.quote_amount,
            native_quote_amount: s.native_quote_amount,
        }
    }
}

/// One chain to run a worker on
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSection {
    pub name: String,
    pub chain_id: u64,
    /// Native gas token address (1inch uses 0xeeee...eeee)
    pub native_token: String,
    /// Stable token address used for pricing native and for the fallback
    pub stable_token: String,
}

/// 1inch API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OneInchSection {
    pub api_url: String,
    /// API key (prefer the ONE_INCH_API_KEY env var)
    pub api_key: Option<String>,
    /// Wallet whose balances are inspected (prefer the WALLET_ADDRESS env var)
    pub wallet_address: Option<String>,
    pub timeout_secs: u64,
}

impl Default for OneInchSection {
    fn default() -> Self {
        Self {
            api_url: "https://api.1inch.dev".to_string(),
            api_key: None,
            wallet_address: None,
            timeout_secs: 30,
        }
    }
}

impl OneInchSection {
    /// Get API key with environment variable fallback
    /// Checks ONE_INCH_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        non_empty(&self.api_key).or_else(|| std::env::var("ONE_INCH_API_KEY").ok())
    }

    /// Get wallet address with environment variable fallback
    pub fn get_wallet_address(&self) -> Option<String> {
        non_empty(&self.wallet_address)
            .or_else(|| std::env::var("WALLET_ADDRESS").ok())
            .map(|w| w.to_lowercase())
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Paper trading section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaperSection {
    /// Simulate swaps instead of using a live wallet
    pub enabled: bool,
    /// Starting native balance in base units
    #[serde(deserialize_with = "amount::deserialize")]
    pub initial_native_balance: u128,
    pub slippage_bps: u16,
}

impl Default for PaperSection {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_native_balance: 10 * 10u128.pow(18),
            slippage_bps: 50,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log to file instead of stdout
    pub log_to_file: bool,
    /// Log file path (`~` is expanded)
    pub log_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: "logs/rotator.log".to_string(),
        }
    }
}

impl LoggingSection {
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).to_string())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;
    config.normalize();
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Lowercase token addresses so they compare equal to API responses
    fn normalize(&mut self) {
        for chain in &mut self.chains {
            chain.native_token = chain.native_token.to_lowercase();
            chain.stable_token = chain.stable_token.to_lowercase();
        }
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        ScoringParams::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        TradingSetParams::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        // Validate worker section
        if self.worker.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.worker.cooldown_passes == 0 {
            return Err(ConfigError::ValidationError(
                "cooldown_passes must be > 0".to_string(),
            ));
        }

        if self.worker.call_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "call_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.worker.quote_amount == 0 || self.worker.native_quote_amount == 0 {
            return Err(ConfigError::ValidationError(
                "quote amounts must be > 0".to_string(),
            ));
        }

        // Validate chains
        if self.chains.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one [[chains]] entry is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for chain in &self.chains {
            if chain.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "chain name cannot be empty".to_string(),
                ));
            }
            if !names.insert(chain.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate chain name: {}",
                    chain.name
                )));
            }
            if chain.chain_id == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "chain_id must be > 0 for {}",
                    chain.name
                )));
            }
            if chain.native_token.is_empty() || chain.stable_token.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "native_token and stable_token are required for {}",
                    chain.name
                )));
            }
            if chain.native_token == chain.stable_token {
                return Err(ConfigError::ValidationError(format!(
                    "native_token and stable_token must differ for {}",
                    chain.name
                )));
            }
        }

        // Validate 1inch
        if self.one_inch.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "api_url cannot be empty".to_string(),
            ));
        }

        if self.paper.slippage_bps > 10_000 {
            return Err(ConfigError::ValidationError(format!(
                "paper slippage_bps must be <= 10000, got {}",
                self.paper.slippage_bps
            )));
        }

        // Validate logging
        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Look up a chain by name
    pub fn chain(&self, name: &str) -> Option<&ChainSection> {
        self.chains.iter().find(|c| c.name == name)
    }
}

impl From<&Config> for ScoringParams {
    fn from(config: &Config) -> Self {
        let s = &config.scoring;
        ScoringParams {
            initial_score: s.initial_score,
            rise_multiplier: s.rise_multiplier,
            fall_multiplier: s.fall_multiplier,
            rise_bonus: s.rise_bonus,
            rise_bonus_threshold_pct: s.rise_bonus_threshold_pct,
            base_cap: s.base_cap,
            cap_step: s.cap_step,
        }
    }
}

impl From<&Config> for TradingSetParams {
    fn from(config: &Config) -> Self {
        let t = &config.trading_set;
        TradingSetParams {
            max_size: t.max_size,
            min_set_size: t.min_set_size,
            admission_score: t.admission_score,
            native_admission_score: t.native_admission_score,
            native_maturity_score: t.native_maturity_score,
            maturity_step: t.maturity_step,
            strike_ceiling: t.strike_ceiling,
            score_floor: t.score_floor,
            native_score_floor: t.native_score_floor,
            native_strike_ceiling: t.native_strike_ceiling,
            max_round_trip_loss_bps: t.max_round_trip_loss_bps,
            probe_amount: t.probe_amount,
            buy_amount: t.buy_amount,
            native_reserve: t.native_reserve,
            native_liquidation_pct: t.native_liquidation_pct,
        }
    }
}

impl From<&Config> for WorkerSettings {
    fn from(config: &Config) -> Self {
        let w = &config.worker;
        WorkerSettings {
            poll_interval: Duration::from_secs(w.poll_interval_secs),
            cooldown_passes: w.cooldown_passes,
            call_timeout: Duration::from_secs(w.call_timeout_secs),
            quote_amount: w.quote_amount,
            native_quote_amount: w.native_quote_amount,
        }
    }
}

impl From<&ChainSection> for ChainSettings {
    fn from(chain: &ChainSection) -> Self {
        ChainSettings {
            name: chain.name.clone(),
            chain_id: chain.chain_id,
            native_token: chain.native_token.clone(),
            stable_token: chain.stable_token.clone(),
        }
    }
}

/// Base-unit amounts written as a TOML integer or a decimal string
mod amount {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Int(v) => Ok(v as u128),
            Raw::Str(s) => s
                .trim()
                .replace('_', "")
                .parse::<u128>()
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[scoring]
initial_score = 1.0
rise_multiplier = 1.5
fall_multiplier = 1.2
rise_bonus = 1.0
rise_bonus_threshold_pct = 1.0
base_cap = 10.0
cap_step = 5.0

[trading_set]
max_size = 6
min_set_size = 3
admission_score = 5.0
native_admission_score = 1.0
native_maturity_score = 3.0
maturity_step = 1.0
strike_ceiling = 2
score_floor = 0.0
native_score_floor = -5.0
native_strike_ceiling = 7
max_round_trip_loss_bps = 80
probe_amount = 1_000_000_000_000_000
buy_amount = "100000000000000000"
native_reserve = "1_000_000_000_000_000_000"
native_liquidation_pct = 90

[worker]
poll_interval_secs = 30
cooldown_passes = 120
call_timeout_secs = 10
quote_amount = 1_000_000_000_000
native_quote_amount = 1_000_000

[[chains]]
name = "polygon"
chain_id = 137
native_token = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE"
stable_token = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"

[[chains]]
name = "base"
chain_id = 8453
native_token = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
stable_token = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"

[one_inch]
api_url = "https://api.1inch.dev"
api_key = "test-key"

[paper]
enabled = true
initial_native_balance = "10000000000000000000"

[logging]
level = "info"
log_to_file = false
log_file = "~/logs/rotator.log"
"#
        .to_string()
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.trading_set.max_size, 6);
        assert_eq!(config.trading_set.buy_amount, 10u128.pow(17));
        assert_eq!(config.trading_set.native_reserve, 10u128.pow(18));
        assert_eq!(config.paper.initial_native_balance, 10u128.pow(19));
        assert_eq!(config.worker.quote_amount, 10u128.pow(12));
    }

    #[test]
    fn test_token_addresses_lowercased() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        let polygon = config.chain("polygon").unwrap();
        assert_eq!(
            polygon.native_token,
            "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
        );
        assert!(config.chain("solana").is_none());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file = write_config(
            r#"
[[chains]]
name = "polygon"
chain_id = 137
native_token = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
stable_token = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scoring.rise_multiplier, 1.5);
        assert_eq!(config.trading_set.max_round_trip_loss_bps, 80);
        assert_eq!(config.worker.poll_interval_secs, 30);
        assert_eq!(config.logging.level, "info");
        assert!(config.paper.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[[chains]\nname = ");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_no_chains_rejected() {
        let file = write_config("chains = []\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_duplicate_chain_rejected() {
        let content = create_valid_config().replace("name = \"base\"", "name = \"polygon\"");
        let file = write_config(&content);
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate chain name"));
    }

    #[test]
    fn test_native_equals_stable_rejected() {
        let content = create_valid_config().replace(
            "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
            "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee",
        );
        let file = write_config(&content);
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let content = create_valid_config().replace("max_size = 6", "max_size = 0");
        let file = write_config(&content);
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("trading set size"));
    }

    #[test]
    fn test_invalid_log_level() {
        let content = create_valid_config().replace("level = \"info\"", "level = \"loud\"");
        let file = write_config(&content);
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_bad_amount_string() {
        let content = create_valid_config()
            .replace("buy_amount = \"100000000000000000\"", "buy_amount = \"lots\"");
        let file = write_config(&content);
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_config_to_params() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();

        let scoring = ScoringParams::from(&config);
        assert_eq!(scoring.cap(1), 15.0);

        let set = TradingSetParams::from(&config);
        assert_eq!(set.native_liquidation_pct, 90);

        let worker = WorkerSettings::from(&config);
        assert_eq!(worker.poll_interval, Duration::from_secs(30));

        let chain = ChainSettings::from(&config.chains[1]);
        assert_eq!(chain.chain_id, 8453);
    }

    #[test]
    fn test_api_key_prefers_config() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.one_inch.get_api_key(), Some("test-key".to_string()));
    }

    #[test]
    fn test_log_path_expands_tilde() {
        let file = write_config(&create_valid_config());
        let config = load_config(file.path()).unwrap();
        let path = config.logging.log_path();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("logs/rotator.log"));
    }
}
