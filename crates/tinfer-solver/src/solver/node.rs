//! Solver graph nodes.

use crate::bounds::{BoundKind, BoundSet};
use crate::def::DefinitionStore;
use crate::types::{PartialType, Render, Solution, Solvable, Type, TypeBoundary, TypeLike, TypeVar};
use indexmap::IndexSet;
use std::fmt::Write as _;
use std::hash::Hash;

pub(super) type NodeId = usize;
pub(super) type ConstraintId = usize;

/// One `Solvable` and what is known about it.
///
/// Simple-variable nodes only ever use `choice`; the bound fields stay
/// empty for them.
#[derive(Debug)]
pub(super) struct Node {
    pub key: Solvable,
    pub choice: Option<Solution>,
    /// The change stamp at which `choice` was set; 0 while unchosen.
    pub solved_at_stamp: u64,
    /// Constraints mentioning this node. Cleared once the node is chosen.
    pub adjacent: IndexSet<ConstraintId>,
    /// Variables whose solutions can complete this node's boundary.
    pub type_vars_used: IndexSet<TypeVar>,
    pub last_check_stamp: u64,
    pub full: BoundSet<Type>,
    pub partial: BoundSet<PartialType>,
    /// The boundary itself has been unpacked into bounds.
    pub bound_checked: bool,
}

impl Node {
    pub fn new(key: Solvable) -> Self {
        let mut choice = None;
        let type_vars_used = match &key {
            Solvable::Boundary(TypeBoundary::Like(TypeLike::Type(t))) => {
                choice = Some(Solution::Type(t.clone()));
                IndexSet::new()
            }
            Solvable::Boundary(TypeBoundary::Like(t)) => t.type_vars_used(),
            _ => IndexSet::new(),
        };
        Self {
            key,
            choice,
            solved_at_stamp: 0,
            adjacent: IndexSet::new(),
            type_vars_used,
            last_check_stamp: 0,
            full: BoundSet::new(),
            partial: BoundSet::new(),
            bound_checked: false,
        }
    }

    pub fn is_type_node(&self) -> bool {
        matches!(self.key, Solvable::Boundary(_))
    }

    pub fn boundary(&self) -> Option<&TypeBoundary> {
        match &self.key {
            Solvable::Boundary(b) => Some(b),
            Solvable::Simple(_) => None,
        }
    }

    pub fn is_chosen(&self) -> bool {
        self.choice.is_some()
    }

    /// The chosen type, if the choice is a type.
    pub fn type_choice(&self) -> Option<&Type> {
        self.choice.as_ref().and_then(Solution::as_type)
    }

    /// Lower bounds, partial ones first.
    pub fn lowers(&self) -> Vec<TypeLike> {
        joined(self.partial.lower(), self.full.lower())
    }

    pub fn uppers(&self) -> Vec<TypeLike> {
        joined(self.partial.upper(), self.full.upper())
    }

    pub fn commons(&self) -> Vec<TypeLike> {
        joined(self.partial.common(), self.full.common())
    }

    /// Full bounds then partial ones, each in `BoundSet::iter` order.
    pub fn bounds_vec(&self) -> Vec<(TypeLike, BoundKind)> {
        let full = self.full.iter().map(|(b, k)| (TypeLike::Type(b.clone()), k));
        let partial = self.partial.iter().map(|(b, k)| (TypeLike::Partial(b.clone()), k));
        full.chain(partial).collect()
    }

    /// Full bounds then partial ones, each as common, lower, upper.
    pub fn bounds_by_kind(&self) -> Vec<(TypeLike, BoundKind)> {
        fn by_kind<B: Clone + Eq + Hash>(
            set: &BoundSet<B>,
            wrap: fn(B) -> TypeLike,
            out: &mut Vec<(TypeLike, BoundKind)>,
        ) {
            out.extend(set.common().iter().map(|b| (wrap(b.clone()), BoundKind::Common)));
            out.extend(set.lower().iter().map(|b| (wrap(b.clone()), BoundKind::Lower)));
            out.extend(set.upper().iter().map(|b| (wrap(b.clone()), BoundKind::Upper)));
        }
        let mut out = Vec::with_capacity(self.full.len() + self.partial.len());
        by_kind(&self.full, TypeLike::Type, &mut out);
        by_kind(&self.partial, TypeLike::Partial, &mut out);
        out
    }

    pub fn kind_of(&self, b: &TypeLike) -> Option<BoundKind> {
        match b {
            TypeLike::Type(t) => self.full.kind_of(t),
            TypeLike::Partial(p) => self.partial.kind_of(p),
            TypeLike::Var(_) => None,
        }
    }

    pub fn obviate(&mut self, b: &TypeLike, kind: BoundKind) {
        match b {
            TypeLike::Type(t) => self.full.obviate(t, kind),
            TypeLike::Partial(p) => self.partial.obviate(p, kind),
            TypeLike::Var(_) => {}
        }
    }

    /// One line for round dumps.
    pub fn describe(&self, store: &DefinitionStore) -> String {
        let mut out = self.key.display(store).to_string();
        if let Some(choice) = &self.choice {
            let _ = write!(out, " = {}", choice.display(store));
            return out;
        }
        for (b, k) in self.full.iter() {
            let _ = write!(out, " {k:?}:{}", b.display(store));
        }
        for (b, k) in self.partial.iter() {
            let _ = write!(out, " {k:?}:{}", b.display(store));
        }
        if !self.adjacent.is_empty() {
            let _ = write!(out, " ({} adjacent)", self.adjacent.len());
        }
        out
    }
}

fn joined(partial: &IndexSet<PartialType>, full: &IndexSet<Type>) -> Vec<TypeLike> {
    partial
        .iter()
        .cloned()
        .map(TypeLike::Partial)
        .chain(full.iter().cloned().map(TypeLike::Type))
        .collect()
}
