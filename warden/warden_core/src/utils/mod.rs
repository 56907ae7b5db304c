//! Utility modules.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigValue};
pub use logging::LogLevel;
