//! In-memory session store.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use warden_core::error::{Result, StoreError};
use warden_core::scope::ScopeKey;
use warden_core::traits::{PrivilegeRow, Relation, SessionStore, StoreStatus};
use warden_core::types::SessionContext;

#[derive(Debug, Clone, Default)]
struct Table {
    /// Principals other than the owning session allowed to use the table.
    grants: BTreeSet<String>,
    privileges: BTreeMap<ScopeKey, PrivilegeRow>,
    context: Option<SessionContext>,
}

/// An in-memory session store.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    /// The tables, indexed by relation.
    tables: Arc<DashMap<Relation, Table>>,

    /// Failure to report from the next store operation.
    pending_failure: Arc<Mutex<Option<String>>>,
}

impl InMemorySessionStore {
    /// Create a store with no relations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a relation exists.
    pub fn has_relation(&self, relation: Relation) -> bool {
        self.tables.contains_key(&relation)
    }

    /// Create a single relation, as someone other than the session might.
    pub fn create_relation(&self, relation: Relation) {
        self.tables.insert(relation, Table::default());
    }

    /// Drop a relation.
    pub fn drop_relation(&self, relation: Relation) {
        self.tables.remove(&relation);
    }

    /// Grant another principal access to a relation.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the grant was recorded.
    /// * `Err` - If the relation does not exist.
    pub fn grant(&self, relation: Relation, principal: impl Into<String>) -> Result<()> {
        let mut table = self
            .tables
            .get_mut(&relation)
            .ok_or_else(|| StoreError::RelationNotFound(relation.name().to_string()))?;
        table.grants.insert(principal.into());
        Ok(())
    }

    /// Number of rows in the session privileges relation.
    pub fn privilege_row_count(&self) -> usize {
        self.tables
            .get(&Relation::SessionPrivileges)
            .map_or(0, |t| t.privileges.len())
    }

    /// Make the next store operation fail, as a lost connection would.
    pub fn fail_next(&self, reason: impl Into<String>) {
        *self.pending_failure.lock() = Some(reason.into());
    }

    fn check_failure(&self) -> Result<()> {
        match self.pending_failure.lock().take() {
            Some(reason) => Err(StoreError::ConnectFailed(reason).into()),
            None => Ok(()),
        }
    }

    fn with_table<T>(&self, relation: Relation, f: impl FnOnce(&mut Table) -> T) -> Result<T> {
        self.check_failure()?;
        let mut table = self
            .tables
            .get_mut(&relation)
            .ok_or_else(|| StoreError::RelationNotFound(relation.name().to_string()))?;
        Ok(f(&mut *table))
    }
}

impl SessionStore for InMemorySessionStore {
    fn inspect(&mut self) -> Result<StoreStatus> {
        self.check_failure()?;
        let mut status = StoreStatus::absent();
        for table in self.tables.iter() {
            status.relation_count += 1;
            if table.grants.is_empty() {
                status.restricted_count += 1;
            }
        }
        Ok(status)
    }

    fn create_relations(&mut self) -> Result<()> {
        self.check_failure()?;
        for relation in Relation::ALL {
            self.tables.insert(relation, Table::default());
        }
        Ok(())
    }

    fn truncate(&mut self, relation: Relation) -> Result<()> {
        self.with_table(relation, |table| {
            table.privileges.clear();
            table.context = None;
        })
    }

    fn scan_privileges(
        &mut self,
        on_row: &mut dyn FnMut(PrivilegeRow) -> Result<bool>,
    ) -> Result<usize> {
        // Copy out first so the callback never runs under the map's lock
        let rows: Vec<PrivilegeRow> = self.with_table(Relation::SessionPrivileges, |table| {
            table.privileges.values().cloned().collect()
        })?;

        let mut processed = 0;
        for row in rows {
            processed += 1;
            if !on_row(row)? {
                break;
            }
        }
        Ok(processed)
    }

    fn store_privileges(&mut self, row: PrivilegeRow) -> Result<()> {
        self.with_table(Relation::SessionPrivileges, |table| {
            table.privileges.insert(row.scope, row);
        })
    }

    fn store_context(&mut self, context: &SessionContext) -> Result<()> {
        self.with_table(Relation::SessionContext, |table| {
            table.context = Some(context.clone());
        })
    }

    fn load_context(&mut self) -> Result<Option<SessionContext>> {
        self.with_table(Relation::SessionContext, |table| table.context.clone())
    }

    fn save_original_privileges(&mut self) -> Result<()> {
        let current = self.with_table(Relation::SessionPrivileges, |table| {
            table.privileges.clone()
        })?;
        self.with_table(Relation::OriginalPrivileges, |table| {
            table.privileges = current;
        })
    }

    fn restore_original_privileges(&mut self) -> Result<()> {
        let saved = self.with_table(Relation::OriginalPrivileges, |table| {
            table.privileges.clone()
        })?;
        self.with_table(Relation::SessionPrivileges, |table| {
            table.privileges = saved;
        })
    }
}
