//! # Warden Core
//!
//! `warden_core` provides the building blocks shared by the Warden crates:
//! error types, scope identifiers, the bitmap used for privilege and role
//! sets, session context metadata, configuration values and the traits
//! through which a session reaches its collaborators.
//!
//! ## Collaborators
//!
//! A session depends on four things it does not implement itself:
//!
//! 1. **Session store** ([`traits::SessionStore`]): the staging relations
//!    holding computed privileges and session context.
//! 2. **Query executor** ([`traits::QueryExecutor`]): runs parameterized
//!    statements and streams rows to a callback.
//! 3. **Scope hierarchy** ([`traits::ScopeHierarchy`]): yields the superior
//!    scopes of a scope.
//! 4. **Config source** ([`traits::ConfigSource`]): named boolean parameters.

pub mod error;
pub mod macros;
pub mod scope;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::{CacheError, ConfigError, Error, Result, SessionError, StoreError};
pub use scope::{PrivilegeId, RoleId, ScopeKey, GLOBAL_SCOPE_TYPE, PERSONAL_SCOPE_TYPE};
pub use traits::{ConfigSource, QueryExecutor, ScopeHierarchy, SessionStore};
pub use types::{Bitmap, SessionContext};
pub use utils::{Config, ConfigValue, LogLevel};
