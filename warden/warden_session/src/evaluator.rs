//! Privilege predicates.
//!
//! Every predicate first passes the session gate (ready, cache loaded),
//! then probes the cache. Only the superior-scope predicates go further:
//! the cache holds scopes, not the hierarchy between them, so superior
//! scopes come from the session's [`ScopeHierarchy`] and each one is probed
//! in turn until one holds the privilege.
//!
//! Each outcome is counted, including `false` answers given before reset.

use warden_cache::SearchCursor;
use warden_core::error::Result;
use warden_core::scope::{PrivilegeId, ScopeKey};
use warden_core::traits::{ScopeHierarchy, SessionStore};

use crate::session::Session;

/// Lookup hints, one per kind of probe.
///
/// Global and personal probes hit the same entry almost every time; scope
/// probes wander. Keeping them apart stops one from spoiling the other.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PredicateCursors {
    pub(crate) global: SearchCursor,
    pub(crate) personal: SearchCursor,
    pub(crate) scope: SearchCursor,
    pub(crate) superior: SearchCursor,
}

impl<S, H> Session<S, H>
where
    S: SessionStore,
    H: ScopeHierarchy,
{
    /// Whether the session holds `privilege` in the global scope.
    pub fn i_have_global_priv(&mut self, privilege: PrivilegeId) -> Result<bool> {
        if !self.begin_check()? {
            return Ok(false);
        }
        let result = self.holds_global(privilege);
        Ok(self.counts.record(result))
    }

    /// Whether the session holds `privilege` in the personal scope of
    /// `accessor_id`.
    pub fn i_have_personal_priv(
        &mut self,
        privilege: PrivilegeId,
        accessor_id: i32,
    ) -> Result<bool> {
        if !self.begin_check()? {
            return Ok(false);
        }
        let result = self.cache.test_with(
            ScopeKey::personal(accessor_id),
            privilege,
            &mut self.cursors.personal,
        );
        Ok(self.counts.record(result))
    }

    /// Whether the session holds `privilege` in exactly the given scope.
    pub fn i_have_priv_in_scope(
        &mut self,
        privilege: PrivilegeId,
        scope_type: i32,
        scope_id: i32,
    ) -> Result<bool> {
        if !self.begin_check()? {
            return Ok(false);
        }
        let result = self.holds_in_scope(ScopeKey::new(scope_type, scope_id), privilege);
        Ok(self.counts.record(result))
    }

    /// Whether the session holds `privilege` in the given scope or
    /// globally.
    pub fn i_have_priv_in_scope_or_global(
        &mut self,
        privilege: PrivilegeId,
        scope_type: i32,
        scope_id: i32,
    ) -> Result<bool> {
        if !self.begin_check()? {
            return Ok(false);
        }
        let result = self.holds_global(privilege)
            || self.holds_in_scope(ScopeKey::new(scope_type, scope_id), privilege);
        Ok(self.counts.record(result))
    }

    /// Whether the session holds `privilege` in any scope superior to the
    /// given one. The scope itself does not count.
    pub fn i_have_priv_in_superior_scope(
        &mut self,
        privilege: PrivilegeId,
        scope_type: i32,
        scope_id: i32,
    ) -> Result<bool> {
        if !self.begin_check()? {
            return Ok(false);
        }
        let result = self.holds_in_superior(ScopeKey::new(scope_type, scope_id), privilege)?;
        Ok(self.counts.record(result))
    }

    /// Whether the session holds `privilege` in the given scope or any
    /// scope superior to it.
    pub fn i_have_priv_in_scope_or_superior(
        &mut self,
        privilege: PrivilegeId,
        scope_type: i32,
        scope_id: i32,
    ) -> Result<bool> {
        if !self.begin_check()? {
            return Ok(false);
        }
        let scope = ScopeKey::new(scope_type, scope_id);
        let result =
            self.holds_in_scope(scope, privilege) || self.holds_in_superior(scope, privilege)?;
        Ok(self.counts.record(result))
    }

    /// Whether the session holds `privilege` globally, in the given scope,
    /// or in any scope superior to it.
    pub fn i_have_priv_in_scope_or_superior_or_global(
        &mut self,
        privilege: PrivilegeId,
        scope_type: i32,
        scope_id: i32,
    ) -> Result<bool> {
        if !self.begin_check()? {
            return Ok(false);
        }
        let scope = ScopeKey::new(scope_type, scope_id);
        let result = self.holds_global(privilege)
            || self.holds_in_scope(scope, privilege)
            || self.holds_in_superior(scope, privilege)?;
        Ok(self.counts.record(result))
    }

    fn holds_global(&mut self, privilege: PrivilegeId) -> bool {
        self.cache.test_with(ScopeKey::global(), privilege, &mut self.cursors.global)
    }

    fn holds_in_scope(&mut self, scope: ScopeKey, privilege: PrivilegeId) -> bool {
        self.cache.test_with(scope, privilege, &mut self.cursors.scope)
    }

    fn holds_in_superior(&mut self, scope: ScopeKey, privilege: PrivilegeId) -> Result<bool> {
        let cache = &self.cache;
        let cursor = &mut self.cursors.superior;
        let mut found = false;

        self.hierarchy.superiors_of(scope, &mut |superior| {
            if cache.test_with(superior, privilege, cursor) {
                found = true;
                return false;
            }
            true
        })?;

        Ok(found)
    }
}
