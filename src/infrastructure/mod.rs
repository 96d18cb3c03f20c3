//! Infrastructure - startup concerns only
//!
//! - Configuration management
//! - Logging

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError, EngineConfig, InstrumentSeed, LoggingConfig, SeedKind};
pub use logging::init_logging;
