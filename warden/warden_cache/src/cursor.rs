//! Search cursors.
//!
//! A predicate evaluated once per row of a query tends to probe the same
//! scope, or a neighbouring one, over and over. A cursor remembers where
//! the last probe landed so the next one can start there.
//!
//! Cursors are owned by whoever does the probing. They are plain values,
//! never shared through the cache, so two evaluators cannot disturb each
//! other's hints.

/// Remembered position of the last successful lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchCursor {
    last: Option<usize>,
}

impl SearchCursor {
    /// A cursor with no hint.
    pub fn new() -> Self {
        Self { last: None }
    }

    /// The hinted index, if any.
    pub fn hint(&self) -> Option<usize> {
        self.last
    }

    pub(crate) fn remember(&mut self, index: usize) {
        self.last = Some(index);
    }

    /// Forget the hint.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
