//! In-memory scope hierarchy.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use warden_core::error::Result;
use warden_core::traits::ScopeHierarchy;
use warden_core::ScopeKey;

/// A scope hierarchy built from direct superior edges.
///
/// Superiors are visited breadth first, so nearer scopes come before more
/// distant ones. Cycles in the edges are tolerated; every scope is visited
/// at most once and a scope is never reported as its own superior.
#[derive(Debug, Clone, Default)]
pub struct ClosureHierarchy {
    parents: HashMap<ScopeKey, BTreeSet<ScopeKey>>,
}

impl ClosureHierarchy {
    /// Create an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `superior` is directly above `scope`.
    pub fn add_superior(&mut self, scope: ScopeKey, superior: ScopeKey) -> &mut Self {
        if scope != superior {
            self.parents.entry(scope).or_default().insert(superior);
        }
        self
    }

    /// Build a hierarchy from `(scope, superior)` edges.
    pub fn from_edges(edges: impl IntoIterator<Item = (ScopeKey, ScopeKey)>) -> Self {
        let mut hierarchy = Self::new();
        for (scope, superior) in edges {
            hierarchy.add_superior(scope, superior);
        }
        hierarchy
    }

    /// Direct superiors of `scope`.
    pub fn direct_superiors(&self, scope: ScopeKey) -> impl Iterator<Item = ScopeKey> + '_ {
        self.parents.get(&scope).into_iter().flatten().copied()
    }

    /// All superiors of `scope`, nearest first.
    pub fn all_superiors(&self, scope: ScopeKey) -> Vec<ScopeKey> {
        let mut found = Vec::new();
        self.walk(scope, &mut |superior| {
            found.push(superior);
            true
        });
        found
    }

    fn walk(&self, scope: ScopeKey, visit: &mut dyn FnMut(ScopeKey) -> bool) {
        let mut seen = HashSet::from([scope]);
        let mut queue: VecDeque<ScopeKey> = self.direct_superiors(scope).collect();

        while let Some(next) = queue.pop_front() {
            if !seen.insert(next) {
                continue;
            }
            if !visit(next) {
                return;
            }
            queue.extend(self.direct_superiors(next));
        }
    }
}

impl ScopeHierarchy for ClosureHierarchy {
    fn superiors_of(
        &mut self,
        scope: ScopeKey,
        visit: &mut dyn FnMut(ScopeKey) -> bool,
    ) -> Result<()> {
        self.walk(scope, visit);
        Ok(())
    }
}
