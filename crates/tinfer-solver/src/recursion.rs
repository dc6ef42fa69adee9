//! Re-entrancy and depth guard for recursive lattice queries.
//!
//! Subtype checks over bounds like `<T extends Comparable<T>>` revisit the
//! pair they started from. The guard tracks the pairs currently being
//! checked so that the caller can answer re-entrant pairs optimistically,
//! and caps total depth and work for types that grow as they recurse.
//! A cycle is reported ahead of the depth limit.

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Outcome of `RecursionGuard::enter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed; the caller must `leave` with the same key.
    Entered,
    /// The key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

pub struct RecursionGuard<K: Hash + Eq + Clone> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
}

impl<K: Hash + Eq + Clone> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
        }
    }

    pub fn enter(&mut self, key: &K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);
        if self.iterations > self.max_iterations {
            return RecursionResult::IterationExceeded;
        }
        if self.visiting.contains(key) {
            return RecursionResult::Cycle;
        }
        if self.depth >= self.max_depth {
            return RecursionResult::DepthExceeded;
        }
        self.visiting.insert(key.clone());
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: &K) {
        let was_present = self.visiting.remove(key);
        debug_assert!(was_present, "RecursionGuard::leave without matching enter");
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reentry_is_a_cycle() {
        let mut guard = RecursionGuard::new(10, 100);
        assert_eq!(guard.enter(&1), RecursionResult::Entered);
        assert_eq!(guard.enter(&1), RecursionResult::Cycle);
        assert_eq!(guard.enter(&2), RecursionResult::Entered);
        assert_eq!(guard.depth(), 2);
        guard.leave(&2);
        guard.leave(&1);
        assert_eq!(guard.depth(), 0);
        assert_eq!(guard.enter(&1), RecursionResult::Entered);
    }

    #[test]
    fn test_depth_and_iteration_limits() {
        let mut guard = RecursionGuard::new(2, 100);
        assert_eq!(guard.enter(&1), RecursionResult::Entered);
        assert_eq!(guard.enter(&2), RecursionResult::Entered);
        assert_eq!(guard.enter(&3), RecursionResult::DepthExceeded);
        assert_eq!(guard.enter(&1), RecursionResult::Cycle);

        let mut guard = RecursionGuard::new(10, 2);
        assert_eq!(guard.enter(&1), RecursionResult::Entered);
        guard.leave(&1);
        assert_eq!(guard.enter(&1), RecursionResult::Entered);
        guard.leave(&1);
        assert_eq!(guard.enter(&1), RecursionResult::IterationExceeded);
    }
}
