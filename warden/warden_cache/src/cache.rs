//! The privilege cache.
//!
//! Entries are kept in strictly ascending `ScopeKey` order. The cache does
//! not sort: callers append in order, either one push at a time or from a
//! store scan that is already ordered by `(scope_type, scope_id)`.

use warden_core::error::CacheError;
use warden_core::log_event;
use warden_core::scope::{PrivilegeId, ScopeKey};
use warden_core::types::Bitmap;

use crate::cursor::SearchCursor;

/// Number of slots added each time the cache fills up.
pub const DEFAULT_GROWTH: usize = 16;

/// Privileges and roles held in one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeEntry {
    /// The scope.
    pub key: ScopeKey,

    /// Roles held in the scope.
    pub roles: Bitmap,

    /// Privileges held in the scope.
    pub privileges: Bitmap,
}

/// Sorted, binary-searchable array of scope entries.
///
/// Bitmaps are copied in and owned by the cache, so entries outlive the
/// transaction that produced them.
#[derive(Debug, Clone)]
pub struct PrivilegeCache {
    entries: Vec<ScopeEntry>,
    capacity: usize,
    growth: usize,
    loaded: bool,
}

impl PrivilegeCache {
    /// Create an empty cache growing by [`DEFAULT_GROWTH`] slots.
    pub fn new() -> Self {
        Self::with_growth(DEFAULT_GROWTH)
    }

    /// Create an empty cache growing by `growth` slots at a time.
    ///
    /// A growth of zero is treated as one.
    pub fn with_growth(growth: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: 0,
            growth: growth.max(1),
            loaded: false,
        }
    }

    /// Number of active entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no active entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of allocated slots. Only ever grows.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots added per growth step.
    pub fn growth(&self) -> usize {
        self.growth
    }

    /// Whether the cache has been populated for the current load cycle.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Mark the cache as populated for the current load cycle.
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Entry at `index`.
    pub fn get(&self, index: usize) -> Option<&ScopeEntry> {
        self.entries.get(index)
    }

    /// Active entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ScopeEntry> {
        self.entries.iter()
    }

    /// Greatest key in the cache.
    pub fn last_key(&self) -> Option<ScopeKey> {
        self.entries.last().map(|e| e.key)
    }

    /// Append an entry.
    ///
    /// `key` must be greater than every key already in the cache. This is
    /// checked only in debug builds; use [`try_add`](Self::try_add) when the
    /// order is not already guaranteed by the caller.
    pub fn add(
        &mut self,
        key: ScopeKey,
        roles: &Bitmap,
        privileges: &Bitmap,
    ) -> Result<(), CacheError> {
        debug_assert!(
            self.last_key().map_or(true, |last| last < key),
            "scope {} added out of order",
            key
        );
        self.push(key, roles, privileges)
    }

    /// Append an entry, rejecting keys that are not strictly ascending.
    pub fn try_add(
        &mut self,
        key: ScopeKey,
        roles: &Bitmap,
        privileges: &Bitmap,
    ) -> Result<(), CacheError> {
        if let Some(last) = self.last_key() {
            if key <= last {
                return Err(CacheError::OutOfOrder { key, last });
            }
        }
        self.push(key, roles, privileges)
    }

    fn push(
        &mut self,
        key: ScopeKey,
        roles: &Bitmap,
        privileges: &Bitmap,
    ) -> Result<(), CacheError> {
        if self.entries.len() == self.capacity {
            self.grow()?;
        }
        self.entries.push(ScopeEntry {
            key,
            roles: roles.clone(),
            privileges: privileges.clone(),
        });
        Ok(())
    }

    fn grow(&mut self) -> Result<(), CacheError> {
        let target = self.capacity + self.growth;
        self.entries
            .try_reserve_exact(target - self.entries.len())
            .map_err(|_| CacheError::GrowFailed(target))?;
        self.capacity = target;

        log_event!(LogLevel::Trace, "Privilege cache grown",
            capacity => target,
            len => self.entries.len(),
        );
        Ok(())
    }

    /// Replace the bitmaps of an existing entry.
    ///
    /// Does nothing when `key` is not in the cache.
    ///
    /// # Returns
    ///
    /// `true` if the entry was found and replaced.
    pub fn update(&mut self, key: ScopeKey, roles: &Bitmap, privileges: &Bitmap) -> bool {
        match self.find(key) {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.roles = roles.clone();
                entry.privileges = privileges.clone();
                true
            }
            None => false,
        }
    }

    /// Index of the entry for `key`.
    pub fn find(&self, key: ScopeKey) -> Option<usize> {
        self.entries.binary_search_by_key(&key, |e| e.key).ok()
    }

    /// Index of the entry for `key`, starting from the cursor's hint.
    ///
    /// When the hinted entry is the one sought no search happens at all;
    /// otherwise the search is confined to the side of the hint the key
    /// falls on. A hit moves the cursor.
    pub fn find_with(&self, key: ScopeKey, cursor: &mut SearchCursor) -> Option<usize> {
        let (lo, hi) = match cursor.hint().and_then(|i| self.entries.get(i).map(|e| (i, e))) {
            Some((i, entry)) if entry.key == key => return Some(i),
            Some((i, entry)) if entry.key < key => (i + 1, self.entries.len()),
            Some((i, _)) => (0, i),
            None => (0, self.entries.len()),
        };

        let found = self.entries[lo..hi]
            .binary_search_by_key(&key, |e| e.key)
            .ok()
            .map(|i| lo + i);
        if let Some(index) = found {
            cursor.remember(index);
        }
        found
    }

    /// Whether `privilege` is held in scope `key`.
    ///
    /// An absent scope holds nothing.
    pub fn test(&self, key: ScopeKey, privilege: PrivilegeId) -> bool {
        self.find(key)
            .is_some_and(|i| self.entries[i].privileges.contains(privilege))
    }

    /// Like [`test`](Self::test), searching from the cursor's hint.
    pub fn test_with(
        &self,
        key: ScopeKey,
        privilege: PrivilegeId,
        cursor: &mut SearchCursor,
    ) -> bool {
        self.find_with(key, cursor)
            .is_some_and(|i| self.entries[i].privileges.contains(privilege))
    }

    /// Roles held in scope `key`.
    pub fn roles(&self, key: ScopeKey) -> Option<&Bitmap> {
        self.find(key).map(|i| &self.entries[i].roles)
    }

    /// Privileges held in scope `key`.
    pub fn privileges(&self, key: ScopeKey) -> Option<&Bitmap> {
        self.find(key).map(|i| &self.entries[i].privileges)
    }

    /// Drop every entry and mark the cache unloaded.
    ///
    /// Allocated slots are kept for the next load cycle.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.loaded = false;
    }
}

impl Default for PrivilegeCache {
    fn default() -> Self {
        Self::new()
    }
}
