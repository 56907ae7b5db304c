//! Session context metadata.
//!
//! The session context records who the session is acting for and in which
//! security contexts it logged in. It carries no privileges of its own.

use serde::{Deserialize, Serialize};

use crate::scope::ScopeKey;

/// Identity and context of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// The accessor (user) the session acts for.
    pub accessor_id: i32,

    /// Identifier of the session.
    pub session_id: i64,

    /// Context in which the accessor authenticated.
    pub login_context: ScopeKey,

    /// Context the session is operating in.
    pub session_context: ScopeKey,

    /// Context used to map roles to privileges.
    pub mapping_context: ScopeKey,

    /// Session this one was derived from, if any.
    #[serde(default)]
    pub parent_session_id: Option<i64>,
}

impl SessionContext {
    /// Create a session context.
    ///
    /// A parent session id equal to `session_id` means "no parent" and is
    /// normalized to `None`.
    pub fn new(
        accessor_id: i32,
        session_id: i64,
        login_context: ScopeKey,
        session_context: ScopeKey,
        mapping_context: ScopeKey,
        parent_session_id: Option<i64>,
    ) -> Self {
        Self {
            accessor_id,
            session_id,
            login_context,
            session_context,
            mapping_context,
            parent_session_id: parent_session_id.filter(|parent| *parent != session_id),
        }
    }

    /// Whether the session was derived from another session.
    pub fn has_parent(&self) -> bool {
        self.parent_session_id.is_some()
    }

    /// The accessor's personal scope.
    pub fn personal_scope(&self) -> ScopeKey {
        ScopeKey::personal(self.accessor_id)
    }
}
