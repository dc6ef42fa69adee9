//! Transitive supertypes of a type, with bindings filled in.
//!
//! The tree for `List<Int32>` holds one entry per definition reached:
//! `List -> [List<Int32>]`, `Listed -> [Listed<Int32>]`,
//! `AnyValue -> [AnyValue]`. A definition can map to several
//! instantiations when a type inherits from it along different paths.
//!
//! A formal's supertypes are its upper bounds.

use crate::def::{DefId, DefinitionStore};
use crate::mapper::{FormalFn, map_type, map_type_with};
use crate::types::{Type, TypeLike};
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::collections::VecDeque;
use std::hash::Hash;
use tinfer_common::limits::MAX_SUPERTYPE_TREE_SIZE;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// A node type for supertype trees: full types, or partial types when
/// reconciling bounds that mention solver variables.
pub trait SuperTypeNode: Clone + Eq + Hash {
    fn node_definition(&self) -> Option<DefId>;
    fn direct_super_types(&self, store: &DefinitionStore) -> Vec<Self>;
}

impl SuperTypeNode for Type {
    fn node_definition(&self) -> Option<DefId> {
        Some(self.definition())
    }

    fn direct_super_types(&self, store: &DefinitionStore) -> Vec<Type> {
        if self.is_param() {
            return store.upper_bounds(self.definition());
        }
        let formals = store.formals(self.definition());
        let map: FxHashMap<DefId, Type> = formals
            .into_iter()
            .zip(self.bindings().iter().cloned())
            .collect();
        store
            .super_types(self.definition())
            .iter()
            .map(|st| map_type(st, &map))
            .collect()
    }
}

impl SuperTypeNode for TypeLike {
    fn node_definition(&self) -> Option<DefId> {
        self.definition()
    }

    fn direct_super_types(&self, store: &DefinitionStore) -> Vec<TypeLike> {
        let Some(definition) = self.definition() else {
            return Vec::new();
        };
        if self.is_param() {
            return store
                .upper_bounds(definition)
                .into_iter()
                .map(TypeLike::Type)
                .collect();
        }
        let formals = store.formals(definition);
        let map: FxHashMap<DefId, TypeLike> =
            formals.into_iter().zip(self.bindings()).collect();
        let mut lookup = FormalFn(|f: DefId| map.get(&f).cloned());
        store
            .super_types(definition)
            .iter()
            .map(|st| map_type_with(st, &mut lookup))
            .collect()
    }
}

/// The supertypes of `root`, including `root` itself.
#[derive(Clone, Debug)]
pub struct SuperTypeTree<T: SuperTypeNode> {
    pub root: T,
    by_definition: FxIndexMap<DefId, Vec<T>>,
    direct_supers: FxIndexMap<T, Vec<T>>,
}

impl<T: SuperTypeNode> SuperTypeTree<T> {
    pub fn of(store: &DefinitionStore, root: T) -> Self {
        let mut by_definition: FxIndexMap<DefId, Vec<T>> = FxIndexMap::default();
        let mut direct_supers: FxIndexMap<T, Vec<T>> = FxIndexMap::default();
        // Depth first, so that entries for a definition appear in the order
        // the declarations first reach it.
        let mut stack = vec![root.clone()];
        while let Some(t) = stack.pop() {
            if direct_supers.contains_key(&t) || direct_supers.len() >= MAX_SUPERTYPE_TREE_SIZE {
                continue;
            }
            let supers = t.direct_super_types(store);
            if let Some(d) = t.node_definition() {
                let entry = by_definition.entry(d).or_default();
                if !entry.contains(&t) {
                    entry.push(t.clone());
                }
            }
            stack.extend(supers.iter().rev().cloned());
            direct_supers.insert(t, supers);
        }
        Self {
            root,
            by_definition,
            direct_supers,
        }
    }

    /// Instantiations of `definition` among the supertypes.
    pub fn get(&self, definition: DefId) -> &[T] {
        self.by_definition
            .get(&definition)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains_definition(&self, definition: DefId) -> bool {
        self.by_definition.contains_key(&definition)
    }

    pub fn definitions(&self) -> impl Iterator<Item = DefId> + '_ {
        self.by_definition.keys().copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = (DefId, &[T])> + '_ {
        self.by_definition.iter().map(|(d, ts)| (*d, ts.as_slice()))
    }

    /// Visit strict supertypes breadth first. `body` returns whether to
    /// continue past the visited type to its own supertypes.
    pub fn for_each_super_type(&self, mut body: impl FnMut(&T) -> bool) {
        let mut queue = VecDeque::from([&self.root]);
        let mut visited: Vec<&T> = Vec::new();
        while let Some(t) = queue.pop_front() {
            let Some(supers) = self.direct_supers.get(t) else {
                continue;
            };
            for st in supers {
                if visited.contains(&st) {
                    continue;
                }
                visited.push(st);
                if body(st) {
                    queue.push_back(st);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/supertype_tree_tests.rs"]
mod tests;
