//! Persistent session store trait.
//!
//! The persistent session store is the staging area the surrounding
//! system writes computed privileges into. Its relations are protected by
//! the host's access control; the session verifies that protection on
//! every reset before trusting anything it holds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::scope::ScopeKey;
use crate::types::{Bitmap, SessionContext};

/// A relation owned by the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Relation {
    /// Privileges the session currently holds, one row per scope.
    SessionPrivileges,

    /// Privileges saved before the session switched identity.
    OriginalPrivileges,

    /// The session context.
    SessionContext,
}

impl Relation {
    /// Every relation, in creation order.
    pub const ALL: [Relation; 3] = [
        Relation::SessionPrivileges,
        Relation::OriginalPrivileges,
        Relation::SessionContext,
    ];

    /// Name of the relation in the backing store.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionPrivileges => "warden_session_privileges",
            Self::OriginalPrivileges => "warden_orig_privileges",
            Self::SessionContext => "warden_session_context",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Number of relations a session store owns once initialized.
pub const SESSION_RELATION_COUNT: i64 = Relation::ALL.len() as i64;

/// Result of inspecting the store's backing relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStatus {
    /// Number of session relations that exist.
    pub relation_count: i64,

    /// Number of those relations with no access granted to anyone but the
    /// owning session.
    pub restricted_count: i64,
}

impl StoreStatus {
    /// Status of a store whose relations do not exist yet.
    pub fn absent() -> Self {
        Self {
            relation_count: 0,
            restricted_count: 0,
        }
    }
}

/// A row of the session privileges relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeRow {
    /// Scope the privileges apply in.
    pub scope: ScopeKey,

    /// Roles held in the scope.
    #[serde(default)]
    pub roles: Bitmap,

    /// Privileges held in the scope.
    #[serde(default)]
    pub privileges: Bitmap,
}

impl PrivilegeRow {
    /// Create a privilege row.
    pub fn new(scope: impl Into<ScopeKey>, roles: Bitmap, privileges: Bitmap) -> Self {
        Self {
            scope: scope.into(),
            roles,
            privileges,
        }
    }
}

/// Trait for persistent session stores.
///
/// Methods take `&mut self`: a store belongs to exactly one session and is
/// used serially.
pub trait SessionStore {
    /// Inspect the backing relations.
    ///
    /// # Returns
    ///
    /// * `Ok(StoreStatus)` - How many relations exist and how many of them
    ///   are restricted to the session.
    /// * `Err` - If the inspection query failed.
    fn inspect(&mut self) -> Result<StoreStatus>;

    /// Create the backing relations, empty and restricted.
    fn create_relations(&mut self) -> Result<()>;

    /// Delete every row from one relation.
    fn truncate(&mut self, relation: Relation) -> Result<()>;

    /// Visit the stored privilege rows in ascending scope order.
    ///
    /// # Arguments
    ///
    /// * `on_row` - Called for each row; returning `Ok(false)` stops the scan.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - The number of rows visited.
    /// * `Err` - If the scan failed or `on_row` returned an error.
    fn scan_privileges(
        &mut self,
        on_row: &mut dyn FnMut(PrivilegeRow) -> Result<bool>,
    ) -> Result<usize>;

    /// Write a privilege row into the session privileges relation.
    fn store_privileges(&mut self, row: PrivilegeRow) -> Result<()>;

    /// Replace the stored session context.
    fn store_context(&mut self, context: &SessionContext) -> Result<()>;

    /// Read the stored session context, if any.
    fn load_context(&mut self) -> Result<Option<SessionContext>>;

    /// Copy the session privileges into the original privileges relation,
    /// replacing its contents.
    fn save_original_privileges(&mut self) -> Result<()>;

    /// Replace the session privileges with the saved original privileges.
    fn restore_original_privileges(&mut self) -> Result<()>;
}
