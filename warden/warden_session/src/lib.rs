//! # Warden Session
//!
//! `warden_session` enforces row-level access control inside a long-lived
//! database session. Callers ask "does this session hold privilege P in
//! scope S?" many times per transaction; the answers come from an
//! in-memory cache built from a verified staging store.
//!
//! Key pieces:
//!
//! 1. **[`Session`]**: owns the store, cache, context and counters of one
//!    session, and drives the lifecycle (`reset`, lazy load).
//!
//! 2. **Tamper detection**: before trusting the store, [`reset`](Session::reset)
//!    checks that its relations are either absent or complete and closed
//!    to everyone else.
//!
//! 3. **Predicates**: `i_have_*` methods on [`Session`], answering from the
//!    cache and falling back to the [`ScopeHierarchy`](warden_core::ScopeHierarchy)
//!    for superior scopes.
//!
//! 4. **Stores and hierarchies**: an in-memory store, a store that speaks
//!    SQL through a [`QueryExecutor`](warden_core::QueryExecutor), and
//!    matching hierarchy implementations.
//!
//! ## Usage Example
//!
//! ```rust
//! use warden_core::{Bitmap, ScopeKey};
//! use warden_session::{ClosureHierarchy, FixedConfigSource, InMemorySessionStore, Session};
//!
//! let store = InMemorySessionStore::new();
//! let mut hierarchy = ClosureHierarchy::new();
//! hierarchy.add_superior(ScopeKey::new(3, 10), ScopeKey::new(4, 1));
//!
//! let mut session = Session::new(store, hierarchy, FixedConfigSource::new());
//! session.reset().unwrap();
//! session.add_scope_privileges(1, 0, &Bitmap::new(), &Bitmap::from([5])).unwrap();
//! session.add_scope_privileges(4, 1, &Bitmap::new(), &Bitmap::from([8])).unwrap();
//!
//! assert!(session.i_have_global_priv(5).unwrap());
//! assert!(session.i_have_priv_in_scope_or_superior(8, 3, 10).unwrap());
//! assert!(!session.i_have_priv_in_scope(8, 3, 10).unwrap());
//! ```

pub mod config;
pub mod counters;
pub mod evaluator;
pub mod executor;
pub mod hierarchy;
pub mod lifecycle;
pub mod options;
pub mod session;
pub mod store;

pub use config::FixedConfigSource;
pub use counters::ResultCounts;
pub use executor::SharedExecutor;
pub use hierarchy::{ClosureHierarchy, QueryHierarchy};
pub use lifecycle::{verify_store, SessionState, StoreAction};
pub use options::{SessionOptions, ERROR_ON_UNINITIALIZED_PARAM};
pub use session::Session;
pub use store::{InMemorySessionStore, QueryBackedStore};
