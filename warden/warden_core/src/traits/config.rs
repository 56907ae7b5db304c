//! Configuration source trait.

use crate::error::Result;

/// Source of named configuration parameters.
pub trait ConfigSource {
    /// Look up a boolean parameter.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(bool))` - The parameter's value.
    /// * `Ok(None)` - The parameter is not set.
    /// * `Err` - If the parameter is set but is not a boolean.
    fn get_bool(&self, name: &str) -> Result<Option<bool>>;
}
