//! Stock market metrics engine
//!
//! Per-instrument dividend yield, P/E ratio and volume-weighted price, plus
//! a market-wide geometric-mean index, over a concurrent instrument registry.

pub mod console;
pub mod core;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use crate::core::{Instrument, Kind, Registry, RootError, Side, Symbol, Transaction};
pub use infrastructure::config::{Config, ConfigError, EngineConfig, LoggingConfig};

use rust_decimal::Decimal;
use thiserror::Error;

/// Rejected input when building or updating domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid symbol {0:?}: expected 1-4 ASCII letters")]
    Symbol(String),

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: Decimal },

    #[error("periods per year must be at least 1")]
    NonPositivePeriods,

    #[error("quantity must be at least 1")]
    NonPositiveQuantity,

    #[error("price must be strictly positive (got {0})")]
    NonPositivePrice(Decimal),

    #[error("dividend attribute {0} is out of range for the instrument kind")]
    InvalidDividendAttribute(Decimal),
}

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
