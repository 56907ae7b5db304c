//! Session options.

use serde::{Deserialize, Serialize};
use warden_cache::DEFAULT_GROWTH;
use warden_core::error::{ConfigError, Result};
use warden_core::traits::SESSION_RELATION_COUNT;
use warden_core::utils::Config;

/// Name of the parameter deciding whether privilege checks before `reset`
/// raise an error.
pub const ERROR_ON_UNINITIALIZED_PARAM: &str = "warden.error_on_uninitialized_session";

/// Options fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Slots added each time the privilege cache fills up
    #[serde(default = "default_cache_growth")]
    pub cache_growth: usize,

    /// Parameter consulted for the uninitialized-session policy
    #[serde(default = "default_uninitialized_param")]
    pub uninitialized_param: String,

    /// Policy used when the parameter is not set
    #[serde(default = "default_error_on_uninitialized")]
    pub default_error_on_uninitialized: bool,

    /// Number of relations the store must hold once initialized
    #[serde(default = "default_expected_relations")]
    pub expected_relations: i64,
}

fn default_cache_growth() -> usize {
    DEFAULT_GROWTH
}

fn default_uninitialized_param() -> String {
    ERROR_ON_UNINITIALIZED_PARAM.to_string()
}

fn default_error_on_uninitialized() -> bool {
    true
}

fn default_expected_relations() -> i64 {
    SESSION_RELATION_COUNT
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cache_growth: default_cache_growth(),
            uninitialized_param: default_uninitialized_param(),
            default_error_on_uninitialized: default_error_on_uninitialized(),
            expected_relations: default_expected_relations(),
        }
    }
}

impl SessionOptions {
    /// Read options from the `warden.session` table of a configuration,
    /// falling back to defaults for anything missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut options = Self::default();

        if let Some(value) = config.get("warden.session.cache_growth") {
            let growth = value
                .as_integer()
                .filter(|g| *g > 0)
                .ok_or_else(|| ConfigError::WrongType {
                    name: "warden.session.cache_growth".to_string(),
                    expected: "positive integer",
                })?;
            options.cache_growth = growth as usize;
        }
        if let Some(value) = config.get("warden.session.uninitialized_param") {
            options.uninitialized_param = value
                .as_str()
                .ok_or_else(|| ConfigError::WrongType {
                    name: "warden.session.uninitialized_param".to_string(),
                    expected: "string",
                })?
                .to_string();
        }
        if let Some(flag) = config.get_bool("warden.session.default_error_on_uninitialized")? {
            options.default_error_on_uninitialized = flag;
        }

        Ok(options)
    }
}
