//! # Warden Cache
//!
//! `warden_cache` holds a session's privileges in memory for the lifetime
//! of the session. It is a sorted array of scope entries with
//! amortized-constant append and logarithmic lookup:
//!
//! - **[`PrivilegeCache`]**: the entries, grown a fixed number of slots at a
//!   time and cleared (not freed) between load cycles.
//! - **[`SearchCursor`]**: a caller-owned lookup hint for repeated probes of
//!   the same or nearby scopes.
//!
//! ## Usage Example
//!
//! ```rust
//! use warden_cache::{PrivilegeCache, SearchCursor};
//! use warden_core::{Bitmap, ScopeKey};
//!
//! let mut cache = PrivilegeCache::new();
//! cache.add(ScopeKey::global(), &Bitmap::new(), &Bitmap::from([5])).unwrap();
//! cache.add(ScopeKey::personal(42), &Bitmap::new(), &Bitmap::from([7])).unwrap();
//!
//! let mut cursor = SearchCursor::new();
//! assert!(cache.test_with(ScopeKey::personal(42), 7, &mut cursor));
//! assert!(!cache.test(ScopeKey::global(), 7));
//! ```

pub mod cache;
pub mod cursor;

pub use cache::{PrivilegeCache, ScopeEntry, DEFAULT_GROWTH};
pub use cursor::SearchCursor;
