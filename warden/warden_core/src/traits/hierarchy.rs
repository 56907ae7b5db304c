//! Scope hierarchy trait.

use crate::error::Result;
use crate::scope::ScopeKey;

/// Source of superior (ancestor) scopes.
///
/// Privileges granted in a superior scope apply to every scope beneath it.
/// The hierarchy is defined outside the session; implementations may hold
/// a precomputed closure or ask the backing store.
pub trait ScopeHierarchy {
    /// Visit the superior scopes of `scope`, nearest first where the
    /// implementation knows the distance.
    ///
    /// A scope is not its own superior. Visiting stops as soon as `visit`
    /// returns `false`.
    fn superiors_of(
        &mut self,
        scope: ScopeKey,
        visit: &mut dyn FnMut(ScopeKey) -> bool,
    ) -> Result<()>;
}

/// A hierarchy in which no scope has superiors.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatHierarchy;

impl ScopeHierarchy for FlatHierarchy {
    fn superiors_of(
        &mut self,
        _scope: ScopeKey,
        _visit: &mut dyn FnMut(ScopeKey) -> bool,
    ) -> Result<()> {
        Ok(())
    }
}
