//! Scope hierarchy implementations.

mod closure;
mod query;

pub use closure::ClosureHierarchy;
pub use query::QueryHierarchy;
