//! Configuration utilities.
//!
//! This module provides a configuration value tree that can be parsed from
//! TOML and queried with dotted paths, e.g. `warden.error_on_uninitialized_session`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{ConfigError, Result};
use crate::traits::ConfigSource;

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Null value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer value.
    Integer(i64),

    /// Floating-point value.
    Float(f64),

    /// String value.
    String(String),

    /// Array of values.
    Array(Vec<ConfigValue>),

    /// Map of values.
    Map(HashMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Get this value as a boolean.
    ///
    /// # Returns
    ///
    /// The boolean value, or `None` if this value is not a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a value from a map by key.
    ///
    /// # Returns
    ///
    /// The value with the given key, or `None` if this value is not a map
    /// or the key does not exist.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        match self {
            Self::Map(m) => m.get(key),
            _ => None,
        }
    }

    /// Merge this value with another value.
    ///
    /// Maps are merged recursively, with keys from `other` winning.
    /// Anything else is replaced by `other`.
    pub fn merge(&mut self, other: ConfigValue) {
        match (self, other) {
            (Self::Map(a), Self::Map(b)) => {
                for (key, value) in b {
                    match a.get_mut(&key) {
                        Some(existing) => existing.merge(value),
                        None => {
                            a.insert(key, value);
                        }
                    }
                }
            }
            (a, b) => {
                *a = b;
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::String(s) => write!(f, "\"{}\"", s),
            Self::Array(a) => write!(f, "[{} values]", a.len()),
            Self::Map(m) => write!(f, "{{{} keys}}", m.len()),
        }
    }
}

/// A configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// The root value.
    pub root: ConfigValue,
}

impl Config {
    /// Create a configuration with an empty map root.
    pub fn new_map() -> Self {
        Self {
            root: ConfigValue::Map(HashMap::new()),
        }
    }

    /// Parse a configuration from TOML text.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::utils::config::Config;
    ///
    /// let config = Config::from_toml_str("[warden]\nerror_on_uninitialized_session = false\n")
    ///     .expect("valid toml");
    /// assert_eq!(
    ///     config.get_bool("warden.error_on_uninitialized_session").unwrap(),
    ///     Some(false)
    /// );
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let root: ConfigValue =
            toml::from_str(text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Ok(Self { root })
    }

    /// Get a value by dotted path.
    ///
    /// An empty path returns the root.
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('.')
            .try_fold(&self.root, |current, key| current.get(key))
    }

    /// Get a boolean by dotted path.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(bool))` - The value.
    /// * `Ok(None)` - Nothing is set at `path`.
    /// * `Err` - Something other than a boolean is set at `path`.
    pub fn get_bool(&self, path: &str) -> Result<Option<bool>> {
        match self.get(path) {
            None | Some(ConfigValue::Null) => Ok(None),
            Some(value) => value.as_bool().map(Some).ok_or_else(|| {
                ConfigError::WrongType {
                    name: path.to_string(),
                    expected: "boolean",
                }
                .into()
            }),
        }
    }

    /// Set a value by dotted path, creating intermediate maps.
    pub fn set(&mut self, path: &str, value: impl Into<ConfigValue>) {
        let mut current = &mut self.root;
        for key in path.split('.') {
            if !matches!(current, ConfigValue::Map(_)) {
                *current = ConfigValue::Map(HashMap::new());
            }
            if let ConfigValue::Map(map) = current {
                current = map.entry(key.to_string()).or_default();
            }
        }
        *current = value.into();
    }

    /// Merge another configuration into this one.
    pub fn merge(&mut self, other: Config) {
        self.root.merge(other.root);
    }
}

impl ConfigSource for Config {
    fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        Config::get_bool(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let mut config = Config::new_map();
        config.set("warden.error_on_uninitialized_session", true);
        config.set("warden.cache.growth", 32i64);

        assert_eq!(
            config.get_bool("warden.error_on_uninitialized_session").unwrap(),
            Some(true)
        );
        assert_eq!(
            config.get("warden.cache.growth").and_then(|v| v.as_integer()),
            Some(32)
        );
        assert_eq!(config.get_bool("warden.missing").unwrap(), None);
        assert!(config.get_bool("warden.cache.growth").is_err());
    }

    #[test]
    fn test_set_replaces_scalars_on_the_path() {
        let mut config = Config::default();
        config.set("warden", "flat");
        config.set("warden.session.cache_growth", 8i64);

        assert_eq!(
            config.get("warden.session.cache_growth").and_then(|v| v.as_integer()),
            Some(8)
        );
        assert!(matches!(config.get("warden"), Some(ConfigValue::Map(_))));
    }

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml_str(
            r#"
            [warden]
            error_on_uninitialized_session = false
            name = "test"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.get_bool("warden.error_on_uninitialized_session").unwrap(),
            Some(false)
        );
        assert_eq!(
            config.get("warden.name").and_then(|v| v.as_str()),
            Some("test")
        );

        assert!(Config::from_toml_str("[warden").is_err());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::new_map();
        base.set("warden.a", true);
        base.set("warden.b", false);

        let mut overlay = Config::new_map();
        overlay.set("warden.b", true);

        base.merge(overlay);
        assert_eq!(base.get_bool("warden.a").unwrap(), Some(true));
        assert_eq!(base.get_bool("warden.b").unwrap(), Some(true));
    }
}
