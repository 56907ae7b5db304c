//! Session store implementations.
//!
//! - [`InMemorySessionStore`]: relations held in process memory, with an
//!   explicit access list per relation. Cloning shares the relations, which
//!   lets tests play the surrounding system (or an adversary) alongside the
//!   session.
//! - [`QueryBackedStore`]: relations living in a relational store, reached
//!   through a [`QueryExecutor`](warden_core::QueryExecutor).

mod in_memory;
mod query_backed;

pub use in_memory::InMemorySessionStore;
pub use query_backed::QueryBackedStore;
