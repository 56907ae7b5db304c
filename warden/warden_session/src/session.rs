//! The session object.
//!
//! A `Session` owns everything one database session needs to answer
//! privilege checks: the verified store, the privilege cache, the session
//! context, the result counters and the lookup cursors. Nothing is shared
//! between sessions; two sessions in one process are fully independent.

use once_cell::unsync::OnceCell;
use tracing::{debug, error, info, warn};
use warden_cache::PrivilegeCache;
use warden_core::error::{Result, SessionError};
use warden_core::scope::ScopeKey;
use warden_core::traits::{
    ConfigSource, FlatHierarchy, PrivilegeRow, Relation, ScopeHierarchy, SessionStore,
};
use warden_core::types::{Bitmap, SessionContext};

use crate::counters::ResultCounts;
use crate::evaluator::PredicateCursors;
use crate::lifecycle::{verify_store, SessionState, StoreAction};
use crate::options::SessionOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Ready,
    TamperDetected,
}

/// A session's privilege state.
///
/// # Lifecycle
///
/// A new session is uninitialized. [`reset`](Self::reset) verifies the
/// store and makes the session ready with an empty, unloaded cache. The
/// first privilege check afterwards loads the cache from the store, unless
/// privileges were pushed with
/// [`add_scope_privileges`](Self::add_scope_privileges) first.
pub struct Session<S, H = FlatHierarchy> {
    pub(crate) store: S,
    pub(crate) hierarchy: H,
    config: Box<dyn ConfigSource>,
    options: SessionOptions,
    phase: Phase,
    pub(crate) cache: PrivilegeCache,
    context: Option<SessionContext>,
    pub(crate) counts: ResultCounts,
    pub(crate) cursors: PredicateCursors,
    error_on_uninitialized: OnceCell<bool>,
}

impl<S, H> Session<S, H>
where
    S: SessionStore,
    H: ScopeHierarchy,
{
    /// Create a session with default options.
    ///
    /// # Arguments
    ///
    /// * `store` - The session's persistent store.
    /// * `hierarchy` - Source of superior scopes.
    /// * `config` - Source of the uninitialized-session policy parameter.
    pub fn new(store: S, hierarchy: H, config: impl ConfigSource + 'static) -> Self {
        Self::with_options(store, hierarchy, config, SessionOptions::default())
    }

    /// Create a session with explicit options.
    pub fn with_options(
        store: S,
        hierarchy: H,
        config: impl ConfigSource + 'static,
        options: SessionOptions,
    ) -> Self {
        Self {
            store,
            hierarchy,
            config: Box::new(config),
            cache: PrivilegeCache::with_growth(options.cache_growth),
            options,
            phase: Phase::Uninitialized,
            context: None,
            counts: ResultCounts::default(),
            cursors: PredicateCursors::default(),
            error_on_uninitialized: OnceCell::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Uninitialized => SessionState::Uninitialized,
            Phase::Ready => SessionState::Ready {
                loaded: self.cache.is_loaded(),
            },
            Phase::TamperDetected => SessionState::TamperDetected,
        }
    }

    /// Whether the session has been reset successfully.
    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// The session's options.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Read-only view of the privilege cache.
    pub fn cache(&self) -> &PrivilegeCache {
        &self.cache
    }

    /// The session's store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The session's scope hierarchy.
    pub fn hierarchy_mut(&mut self) -> &mut H {
        &mut self.hierarchy
    }

    /// Verify and reinitialize the store, discarding all privileges and the
    /// session context.
    ///
    /// # Errors
    ///
    /// Fails with a tamper error, leaving the session in
    /// [`SessionState::TamperDetected`], if the store's relations exist in
    /// part or are accessible to others. Store failures propagate and leave
    /// the session uninitialized.
    pub fn reset(&mut self) -> Result<()> {
        self.context = None;
        self.reinitialize(true)
    }

    /// Like [`reset`](Self::reset), but keeps the session context.
    pub fn reset_privileges(&mut self) -> Result<()> {
        self.reinitialize(false)
    }

    fn reinitialize(&mut self, full: bool) -> Result<()> {
        self.phase = Phase::Uninitialized;
        self.cursors = PredicateCursors::default();

        let status = self.store.inspect()?;
        let action = match verify_store(status, self.options.expected_relations) {
            Ok(action) => action,
            Err(err) => {
                error!(
                    relations = status.relation_count,
                    restricted = status.restricted_count,
                    "Session store failed verification: {}",
                    err
                );
                self.phase = Phase::TamperDetected;
                self.cache.clear();
                self.context = None;
                return Err(err.into());
            }
        };

        match action {
            StoreAction::Create => self.store.create_relations()?,
            StoreAction::Truncate => {
                self.store.truncate(Relation::SessionPrivileges)?;
                if full {
                    self.store.truncate(Relation::OriginalPrivileges)?;
                    self.store.truncate(Relation::SessionContext)?;
                }
            }
        }

        self.cache.clear();
        self.phase = Phase::Ready;
        info!(?action, full, "Session reset");
        Ok(())
    }

    /// Record the session context, in memory and in the store.
    pub fn set_session_context(
        &mut self,
        accessor_id: i32,
        session_id: i64,
        login_context: ScopeKey,
        session_context: ScopeKey,
        mapping_context: ScopeKey,
        parent_session_id: Option<i64>,
    ) -> Result<SessionContext> {
        self.require_ready()?;
        let context = SessionContext::new(
            accessor_id,
            session_id,
            login_context,
            session_context,
            mapping_context,
            parent_session_id,
        );
        self.store.store_context(&context)?;
        self.context = Some(context.clone());
        Ok(context)
    }

    /// The session context, read from the store if not yet in memory.
    pub fn get_session_context(&mut self) -> Result<Option<SessionContext>> {
        if self.context.is_none() && self.is_ready() {
            self.context = self.store.load_context()?;
        }
        Ok(self.context.clone())
    }

    /// Push a scope's privileges straight into the cache.
    ///
    /// Scopes must be pushed in ascending order within a load cycle; a scope
    /// at or below the last one pushed fails with `CacheError::OutOfOrder`
    /// and leaves the cache unchanged. Pushing marks the cache loaded, so no
    /// lazy load from the store follows.
    pub fn add_scope_privileges(
        &mut self,
        scope_type: i32,
        scope_id: i32,
        roles: &Bitmap,
        privileges: &Bitmap,
    ) -> Result<()> {
        self.require_ready()?;
        self.cache
            .try_add(ScopeKey::new(scope_type, scope_id), roles, privileges)?;
        self.cache.mark_loaded();
        Ok(())
    }

    /// Replace a cached scope's privileges. Does nothing if the scope is
    /// not cached.
    pub fn update_scope_privileges(
        &mut self,
        scope_type: i32,
        scope_id: i32,
        roles: &Bitmap,
        privileges: &Bitmap,
    ) -> Result<()> {
        self.require_ready()?;
        self.ensure_loaded()?;
        let key = ScopeKey::new(scope_type, scope_id);
        if !self.cache.update(key, roles, privileges) {
            debug!(scope = %key, "Update of uncached scope ignored");
        }
        Ok(())
    }

    /// Write a privilege row to the store.
    ///
    /// The cache is invalidated; the next check reloads it from the store.
    pub fn stage_privileges(&mut self, row: PrivilegeRow) -> Result<()> {
        self.require_ready()?;
        self.store.store_privileges(row)?;
        self.cache.clear();
        Ok(())
    }

    /// Save the current stored privileges so they can be restored later.
    pub fn save_original_privileges(&mut self) -> Result<()> {
        self.require_ready()?;
        self.store.save_original_privileges()
    }

    /// Bring back the privileges saved by
    /// [`save_original_privileges`](Self::save_original_privileges).
    pub fn restore_original_privileges(&mut self) -> Result<()> {
        self.require_ready()?;
        self.store.restore_original_privileges()?;
        self.cache.clear();
        Ok(())
    }

    /// Roles held in a scope.
    pub fn roles_in_scope(&mut self, scope: ScopeKey) -> Result<Option<Bitmap>> {
        self.require_ready()?;
        self.ensure_loaded()?;
        Ok(self.cache.roles(scope).cloned())
    }

    /// Predicate outcome counts.
    pub fn result_counts(&self) -> ResultCounts {
        self.counts
    }

    /// Predicate outcome counts as `(false_count, true_count)`.
    pub fn get_result_counts(&self) -> (u64, u64) {
        self.counts.as_pair()
    }

    pub(crate) fn require_ready(&self) -> Result<()> {
        match self.phase {
            Phase::Ready => Ok(()),
            Phase::TamperDetected => Err(SessionError::Tampered.into()),
            Phase::Uninitialized => Err(SessionError::NotReady.into()),
        }
    }

    /// The uninitialized-session policy, read once per session.
    fn error_on_uninitialized(&self) -> Result<bool> {
        self.error_on_uninitialized
            .get_or_try_init(|| {
                Ok(self
                    .config
                    .get_bool(&self.options.uninitialized_param)?
                    .unwrap_or(self.options.default_error_on_uninitialized))
            })
            .copied()
    }

    /// Gate every predicate passes through.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The session is ready and the cache is loaded.
    /// * `Ok(false)` - The session is not ready and the policy says to
    ///   answer `false`.
    /// * `Err` - The session is not ready and the policy says to raise, the
    ///   policy could not be read, or loading the cache failed.
    ///
    /// Every outcome other than `Ok(true)` is counted as a `false` answer.
    pub(crate) fn begin_check(&mut self) -> Result<bool> {
        let gate = self.open_gate();
        if !matches!(gate, Ok(true)) {
            self.counts.record(false);
        }
        gate
    }

    fn open_gate(&mut self) -> Result<bool> {
        if let Err(err) = self.require_ready() {
            if self.error_on_uninitialized()? {
                warn!("Privilege check before session reset");
                return Err(err);
            }
            debug!("Privilege check before session reset answered false");
            return Ok(false);
        }
        self.ensure_loaded()?;
        Ok(true)
    }

    pub(crate) fn ensure_loaded(&mut self) -> Result<()> {
        if self.cache.is_loaded() {
            return Ok(());
        }

        let cache = &mut self.cache;
        let scanned = self.store.scan_privileges(&mut |row| {
            cache.try_add(row.scope, &row.roles, &row.privileges)?;
            Ok(true)
        });

        match scanned {
            Ok(rows) => {
                self.cache.mark_loaded();
                debug!(rows, "Loaded session privileges");
                Ok(())
            }
            Err(err) => {
                self.cache.clear();
                Err(err)
            }
        }
    }
}
