//! Traits for the collaborators a session depends on.
//!
//! The session never talks to a database, a catalog or a configuration
//! file directly. It goes through these traits, which keeps the privilege
//! logic testable against in-memory implementations.

pub mod config;
pub mod hierarchy;
pub mod query;
pub mod store;

pub use config::ConfigSource;
pub use hierarchy::{FlatHierarchy, ScopeHierarchy};
pub use query::{
    bool_from_query, run_command, run_query, with_connection, PlanCache, PlanHandle, QueryExecutor,
    Statement,
};
pub use store::{PrivilegeRow, Relation, SessionStore, StoreStatus, SESSION_RELATION_COUNT};
