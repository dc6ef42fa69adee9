//! Monotonic bound sets.
//!
//! A node's bounds are split by kind. A bound added as both lower and upper
//! becomes common. A bound that has been superseded by normalization is
//! obviated: it is removed and can never be added again under that kind,
//! which keeps normalized sets from oscillating.

use indexmap::IndexSet;
use std::hash::Hash;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoundKind {
    /// The node is a subtype of the bound.
    Upper,
    /// The bound is a subtype of the node.
    Lower,
    /// The node is exactly the bound.
    Common,
}

impl BoundKind {
    #[must_use]
    pub const fn reverse(self) -> BoundKind {
        match self {
            BoundKind::Upper => BoundKind::Lower,
            BoundKind::Lower => BoundKind::Upper,
            BoundKind::Common => BoundKind::Common,
        }
    }
}

/// Bounds of one node, in insertion order within each kind.
#[derive(Clone, Debug)]
pub struct BoundSet<B: Clone + Eq + Hash> {
    lower: IndexSet<B>,
    upper: IndexSet<B>,
    common: IndexSet<B>,
    obviated: IndexSet<(B, BoundKind)>,
    last_changed_stamp: u64,
}

impl<B: Clone + Eq + Hash> Default for BoundSet<B> {
    fn default() -> Self {
        Self {
            lower: IndexSet::new(),
            upper: IndexSet::new(),
            common: IndexSet::new(),
            obviated: IndexSet::new(),
            last_changed_stamp: 0,
        }
    }
}

impl<B: Clone + Eq + Hash> BoundSet<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lower.len() + self.upper.len() + self.common.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lower(&self) -> &IndexSet<B> {
        &self.lower
    }

    pub fn upper(&self) -> &IndexSet<B> {
        &self.upper
    }

    pub fn common(&self) -> &IndexSet<B> {
        &self.common
    }

    pub fn last_changed_stamp(&self) -> u64 {
        self.last_changed_stamp
    }

    pub(crate) fn touch(&mut self, stamp: u64) {
        self.last_changed_stamp = stamp;
    }

    /// Returns whether the set changed.
    pub fn add(&mut self, b: B, kind: BoundKind) -> bool {
        if self.common.contains(&b) || self.obviated.contains(&(b.clone(), kind)) {
            return false;
        }
        match kind {
            BoundKind::Upper => {
                if self.upper.contains(&b) {
                    return false;
                }
                if self.lower.shift_remove(&b) {
                    self.common.insert(b);
                } else {
                    self.upper.insert(b);
                }
            }
            BoundKind::Lower => {
                if self.lower.contains(&b) {
                    return false;
                }
                if self.upper.shift_remove(&b) {
                    self.common.insert(b);
                } else {
                    self.lower.insert(b);
                }
            }
            BoundKind::Common => {
                self.lower.shift_remove(&b);
                self.upper.shift_remove(&b);
                self.common.insert(b);
            }
        }
        true
    }

    /// Remove `b` as a `kind` bound and refuse to re-add it.
    pub fn obviate(&mut self, b: &B, kind: BoundKind) {
        match kind {
            BoundKind::Lower => self.lower.shift_remove(b),
            BoundKind::Upper => self.upper.shift_remove(b),
            BoundKind::Common => self.common.shift_remove(b),
        };
        self.obviated.insert((b.clone(), kind));
    }

    /// Whether `b` bounds the node at least as tightly as `kind` says.
    pub fn contains(&self, b: &B, kind: BoundKind) -> bool {
        let in_kind = match kind {
            BoundKind::Upper => self.upper.contains(b),
            BoundKind::Lower => self.lower.contains(b),
            BoundKind::Common => false,
        };
        in_kind || self.common.contains(b)
    }

    /// The kind `b` is held under, checking common first.
    pub fn kind_of(&self, b: &B) -> Option<BoundKind> {
        if self.common.contains(b) {
            Some(BoundKind::Common)
        } else if self.lower.contains(b) {
            Some(BoundKind::Lower)
        } else if self.upper.contains(b) {
            Some(BoundKind::Upper)
        } else {
            None
        }
    }

    /// Upper, then common, then lower bounds.
    pub fn iter(&self) -> impl Iterator<Item = (&B, BoundKind)> + '_ {
        self.upper
            .iter()
            .map(|b| (b, BoundKind::Upper))
            .chain(self.common.iter().map(|b| (b, BoundKind::Common)))
            .chain(self.lower.iter().map(|b| (b, BoundKind::Lower)))
    }

    /// An owned copy of `iter`, for callers that add bounds while walking.
    pub fn to_vec(&self) -> Vec<(B, BoundKind)> {
        self.iter().map(|(b, k)| (b.clone(), k)).collect()
    }
}

#[cfg(test)]
#[path = "../tests/bounds_tests.rs"]
mod tests;
