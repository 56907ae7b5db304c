//! Session lifecycle states and store verification.
//!
//! A session becomes ready only after its store has been verified. The
//! store's relations must either not exist at all, in which case the
//! session creates them and trusts them, or exist in full with no access
//! granted to anyone else. Anything in between means someone else created
//! or opened up the staging area, possibly with forged privilege rows in
//! it, and the reset fails.

use serde::{Deserialize, Serialize};
use warden_core::error::SessionError;
use warden_core::traits::StoreStatus;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// `reset` has not completed successfully.
    Uninitialized,

    /// The store is verified. `loaded` tells whether the privilege cache
    /// has been populated for the current load cycle.
    Ready {
        /// Whether the cache holds this cycle's privileges
        loaded: bool,
    },

    /// The last reset found the store tampered with.
    TamperDetected,
}

impl SessionState {
    /// Whether privilege checks may proceed.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// What the lifecycle controller must do to a verified store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    /// No relations exist; create them.
    Create,

    /// All relations exist and are restricted; empty them.
    Truncate,
}

/// Decide whether a store can be trusted.
///
/// # Arguments
///
/// * `status` - Result of inspecting the store.
/// * `expected` - Number of relations an initialized store holds.
///
/// # Returns
///
/// * `Ok(StoreAction)` - How to (re)initialize the store.
/// * `Err(SessionError)` - The store has been tampered with.
pub fn verify_store(status: StoreStatus, expected: i64) -> Result<StoreAction, SessionError> {
    match status.relation_count {
        0 => Ok(StoreAction::Create),
        found if found == expected => {
            if status.restricted_count == expected {
                Ok(StoreAction::Truncate)
            } else {
                Err(SessionError::ExternalAccess {
                    relations: found,
                    restricted: status.restricted_count,
                })
            }
        }
        found => Err(SessionError::UnexpectedRelationCount { found, expected }),
    }
}
