//! Scope and privilege identifiers.
//!
//! A scope is a security context, identified by a `(scope_type, scope_id)`
//! pair. Scope keys are totally ordered lexicographically, which is the
//! order the privilege cache is kept in.
//!
//! # Examples
//!
//! ```
//! use warden_core::scope::ScopeKey;
//!
//! let global = ScopeKey::global();
//! let personal = ScopeKey::personal(42);
//! let department = ScopeKey::new(3, 7);
//!
//! assert!(global < personal);
//! assert!(personal < department);
//! assert_eq!(personal.to_string(), "(2,42)");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a privilege; a member of a privilege bitmap.
pub type PrivilegeId = u32;

/// Identifier of a role; a member of a role bitmap.
pub type RoleId = u32;

/// Scope type of the single global scope.
pub const GLOBAL_SCOPE_TYPE: i32 = 1;

/// Scope type of personal scopes; the scope id is the accessor id.
pub const PERSONAL_SCOPE_TYPE: i32 = 2;

/// Key identifying a security context.
///
/// Field order matters: the derived ordering compares `scope_type` first
/// and `scope_id` second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeKey {
    /// Type of scope, e.g. global, personal or an organizational unit
    pub scope_type: i32,

    /// Identifier of the scope within its type
    pub scope_id: i32,
}

impl ScopeKey {
    /// Create a scope key.
    pub const fn new(scope_type: i32, scope_id: i32) -> Self {
        Self {
            scope_type,
            scope_id,
        }
    }

    /// The global scope, `(GLOBAL_SCOPE_TYPE, 0)`.
    pub const fn global() -> Self {
        Self::new(GLOBAL_SCOPE_TYPE, 0)
    }

    /// The personal scope of an accessor.
    pub const fn personal(accessor_id: i32) -> Self {
        Self::new(PERSONAL_SCOPE_TYPE, accessor_id)
    }

    /// Whether this is the global scope.
    pub fn is_global(&self) -> bool {
        *self == Self::global()
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.scope_type, self.scope_id)
    }
}

impl From<(i32, i32)> for ScopeKey {
    fn from((scope_type, scope_id): (i32, i32)) -> Self {
        Self::new(scope_type, scope_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexicographic_order() {
        let mut keys = vec![
            ScopeKey::new(3, 1),
            ScopeKey::new(1, 0),
            ScopeKey::new(2, 99),
            ScopeKey::new(2, 4),
            ScopeKey::new(3, -1),
        ];
        keys.sort();

        assert_eq!(
            keys,
            vec![
                ScopeKey::new(1, 0),
                ScopeKey::new(2, 4),
                ScopeKey::new(2, 99),
                ScopeKey::new(3, -1),
                ScopeKey::new(3, 1),
            ]
        );
    }

    #[test]
    fn test_well_known_scopes() {
        assert!(ScopeKey::global().is_global());
        assert!(!ScopeKey::personal(0).is_global());
        assert_eq!(ScopeKey::from((2, 5)), ScopeKey::personal(5));
    }
}
