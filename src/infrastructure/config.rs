//! Configuration management
//!
//! Loads configuration from config.toml at startup. Every section has
//! defaults, so a missing file or a partial file is fine.

use crate::core::{Instrument, Kind, NthRootSolver};
use crate::ValidationError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Engine configuration
///
/// Loaded from config.toml at startup. Holds calculation parameters and the
/// instruments registered before the console starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Instruments registered at startup
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentSeed>,
}

/// Calculation parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Trailing window for the console's volume-weighted price query
    #[serde(default = "default_vwap_window_minutes")]
    pub vwap_window_minutes: u32,

    /// Newton iteration ceiling for the market index root
    #[serde(default = "default_max_root_iterations")]
    pub max_root_iterations: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for JSON log files; console only when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Instrument kind in a seed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    Common,
    Preferred,
}

/// One `[[instruments]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstrumentSeed {
    pub kind: SeedKind,
    pub symbol: String,
    pub par_value: Decimal,
    pub last_annual_dividend: Decimal,
    pub periods_per_year: u32,
    /// Dividend per period (common) or fixed dividend rate (preferred)
    pub dividend: Decimal,
}

impl InstrumentSeed {
    fn new(
        kind: SeedKind,
        symbol: &str,
        par_value: Decimal,
        last_annual_dividend: Decimal,
        periods_per_year: u32,
        dividend: Decimal,
    ) -> Self {
        Self {
            kind,
            symbol: symbol.to_string(),
            par_value,
            last_annual_dividend,
            periods_per_year,
            dividend,
        }
    }

    /// Build the instrument this entry describes
    pub fn build(&self) -> Result<Instrument, ValidationError> {
        let kind = match self.kind {
            SeedKind::Common => Kind::Common {
                dividend_per_period: self.dividend,
            },
            SeedKind::Preferred => Kind::Preferred {
                fixed_dividend_rate: self.dividend,
            },
        };
        Instrument::new(
            &self.symbol,
            self.par_value,
            self.last_annual_dividend,
            self.periods_per_year,
            kind,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
            instruments: default_instruments(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vwap_window_minutes: default_vwap_window_minutes(),
            max_root_iterations: default_max_root_iterations(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_vwap_window_minutes() -> u32 {
    15
}

fn default_max_root_iterations() -> u64 {
    NthRootSolver::DEFAULT_MAX_ITERATIONS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_instruments() -> Vec<InstrumentSeed> {
    use SeedKind::{Common, Preferred};
    vec![
        InstrumentSeed::new(Common, "TEA", dec!(100), dec!(0), 1, dec!(0)),
        InstrumentSeed::new(Common, "POP", dec!(100), dec!(8), 1, dec!(8)),
        InstrumentSeed::new(Common, "ALE", dec!(60), dec!(23), 1, dec!(23)),
        InstrumentSeed::new(Preferred, "GIN", dec!(100), dec!(8), 4, dec!(0.02)),
        InstrumentSeed::new(Common, "JOE", dec!(250), dec!(13), 1, dec!(13)),
    ]
}

impl Config {
    /// Load configuration from config.toml, or the file named by `CONFIG_PATH`
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %config_path, "config file not found, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.vwap_window_minutes == 0 {
            return Err(ConfigError::Invalid(
                "engine.vwap_window_minutes must be at least 1".to_string(),
            ));
        }
        if self.engine.max_root_iterations == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_root_iterations must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for seed in &self.instruments {
            seed.build()
                .map_err(|e| ConfigError::Invalid(format!("instrument {}: {e}", seed.symbol)))?;
            if !seen.insert(seed.symbol.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "instrument {} listed more than once",
                    seed.symbol
                )));
            }
        }
        Ok(())
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}
