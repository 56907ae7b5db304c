//! Configuration sources for sessions.

use std::collections::HashMap;

use warden_core::error::Result;
use warden_core::traits::ConfigSource;

/// A configuration source holding fixed boolean parameters.
#[derive(Debug, Clone, Default)]
pub struct FixedConfigSource {
    values: HashMap<String, bool>,
}

impl FixedConfigSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn with(mut self, name: impl Into<String>, value: bool) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

impl ConfigSource for FixedConfigSource {
    fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        Ok(self.values.get(name).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_source() {
        let source = FixedConfigSource::new().with("a", true);
        assert_eq!(source.get_bool("a").unwrap(), Some(true));
        assert_eq!(source.get_bool("b").unwrap(), None);
    }
}
