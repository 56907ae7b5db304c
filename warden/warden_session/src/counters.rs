//! Predicate result counters.
//!
//! Counters exist for instrumentation only; nothing reads them to decide
//! anything.

use serde::{Deserialize, Serialize};

/// Saturating counts of predicate outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultCounts {
    /// Predicates that returned (or would have returned) `false`
    pub false_count: u64,

    /// Predicates that returned `true`
    pub true_count: u64,
}

impl ResultCounts {
    /// Record one outcome and hand it back.
    pub fn record(&mut self, result: bool) -> bool {
        if result {
            self.true_count = self.true_count.saturating_add(1);
        } else {
            self.false_count = self.false_count.saturating_add(1);
        }
        result
    }

    /// Counts as `(false_count, true_count)`.
    pub fn as_pair(&self) -> (u64, u64) {
        (self.false_count, self.true_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record() {
        let mut counts = ResultCounts::default();
        assert!(counts.record(true));
        assert!(!counts.record(false));
        assert!(!counts.record(false));
        assert_eq!(counts.as_pair(), (2, 1));
    }

    #[test]
    fn test_saturates() {
        let mut counts = ResultCounts {
            false_count: u64::MAX,
            true_count: 0,
        };
        counts.record(false);
        assert_eq!(counts.false_count, u64::MAX);
    }
}
