//! Lattice queries over concrete and partial types.
//!
//! `TypeContext` answers subtype, least-upper-bound and greatest-lower-bound
//! questions against a `DefinitionStore`, and caches the answers. Definitions
//! are immutable once inference starts, so the caches stay valid across
//! sessions and the context can be shared between threads behind an `Arc`.
//!
//! ## Bounds over a small lattice
//!
//! ```text
//!              I
//!             / \
//!            J   L
//!           /|\ / \
//!          A K D   C
//!            |
//!            B
//! ```
//!
//! | Query | Result |
//! |-------|--------|
//! | `lub(A, D)` | `[J]` |
//! | `lub(B, C)` | `[I]` |
//! | `lub(C, D)` | `[L]` |
//! | `glb(I, A)` | `A` |
//! | `glb(A, C)` | none |
//!
//! `Never<X>` sits below `X`; nullity is stripped and reapplied around every
//! query so the lattice code only sees non-null types.

use crate::def::{DefId, DefinitionStore, Variance};
use crate::category::sig_for_fun_interface_type;
use crate::mapper::{MapLookup, map_type_like};
use crate::recursion::{RecursionGuard, RecursionResult};
use crate::signature::Signature;
use crate::supertype_tree::{SuperTypeNode, SuperTypeTree};
use crate::types::{Nullity, PartialType, Type, TypeLike, TypeVar, VAR_PREFIX_CHAR};
use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tinfer_common::limits::{MAX_SUBTYPE_DEPTH, MAX_SUBTYPE_ITERATIONS};
use tracing::{trace, warn};

/// How partial subtype checks treat solver variables they cannot see into.
///
/// With `Optimistic`, a comparison involving a variable reference succeeds,
/// so distinct unresolved variables count as comparable. With `Pessimistic`
/// it fails. Overload specificity is always pessimistic; worst-case
/// unification uses `SolverConfig::worst_case_optimism`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Optimism {
    Optimistic,
    #[default]
    Pessimistic,
}

impl Optimism {
    const fn answer(self) -> bool {
        matches!(self, Optimism::Optimistic)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// One signature is more specific than another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Specificity {
    pub more_specific: Side,
    /// Input positions whose types differ between the two signatures.
    pub distinguishing_argument_indices: Vec<usize>,
}

type SubtypeGuard = RecursionGuard<(TypeLike, TypeLike)>;

pub struct TypeContext {
    store: Arc<DefinitionStore>,
    max_subtype_depth: u32,
    super_trees: DashMap<Type, Arc<SuperTypeTree<Type>>>,
    partial_super_trees: DashMap<TypeLike, Arc<SuperTypeTree<TypeLike>>>,
    lub_memo: DashMap<(Type, Type), Vec<Type>>,
    extends_paths: DashMap<(DefId, DefId), Option<Vec<DefId>>>,
    specificity_memo: DashMap<(Signature, Signature), Option<Specificity>>,
    specificity_var_counter: AtomicU64,
}

impl TypeContext {
    pub fn new(store: Arc<DefinitionStore>) -> Self {
        Self {
            store,
            max_subtype_depth: MAX_SUBTYPE_DEPTH,
            super_trees: DashMap::new(),
            partial_super_trees: DashMap::new(),
            lub_memo: DashMap::new(),
            extends_paths: DashMap::new(),
            specificity_memo: DashMap::new(),
            specificity_var_counter: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn with_max_subtype_depth(mut self, depth: u32) -> Self {
        self.max_subtype_depth = depth;
        self
    }

    pub fn store(&self) -> &DefinitionStore {
        &self.store
    }

    pub fn store_arc(&self) -> Arc<DefinitionStore> {
        Arc::clone(&self.store)
    }

    fn guard(&self) -> SubtypeGuard {
        RecursionGuard::new(self.max_subtype_depth, MAX_SUBTYPE_ITERATIONS)
    }

    // =========================================================================
    // Supertype trees
    // =========================================================================

    pub fn super_type_tree(&self, t: &Type) -> Arc<SuperTypeTree<Type>> {
        if let Some(tree) = self.super_trees.get(t) {
            return Arc::clone(tree.value());
        }
        let tree = Arc::new(SuperTypeTree::of(&self.store, t.clone()));
        self.super_trees.insert(t.clone(), Arc::clone(&tree));
        tree
    }

    pub fn partial_super_type_tree(&self, t: &TypeLike) -> Arc<SuperTypeTree<TypeLike>> {
        if let Some(tree) = self.partial_super_trees.get(t) {
            return Arc::clone(tree.value());
        }
        let tree = Arc::new(SuperTypeTree::of(&self.store, t.clone()));
        self.partial_super_trees.insert(t.clone(), Arc::clone(&tree));
        tree
    }

    // =========================================================================
    // Subtyping
    // =========================================================================

    /// `t <: u`.
    pub fn is_sub_type(&self, t: &Type, u: &Type) -> bool {
        let mut guard = self.guard();
        self.sub(t, u, &mut guard)
    }

    fn sub(&self, t: &Type, u: &Type, guard: &mut SubtypeGuard) -> bool {
        if t == u {
            return true;
        }
        // A? <: B is false; A? <: B? iff A <: B.
        if t.is_nullable() {
            return u.is_nullable() && self.sub(&t.non_null(), &u.non_null(), guard);
        }
        if u.is_nullable() {
            return self.sub(t, &u.non_null(), guard);
        }
        // Never<X> <: X, but not the other way around.
        if t.definition() != u.definition() && t.is_never() && t.bindings().len() == 1 {
            if self.sub_binding(&t.bindings()[0], u, Variance::Covariant, guard) {
                return true;
            }
        }

        let key = (TypeLike::Type(t.clone()), TypeLike::Type(u.clone()));
        match guard.enter(&key) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                trace!(?t, ?u, "re-entrant subtype check holds");
                return true;
            }
            exceeded => {
                warn!(?exceeded, ?t, ?u, "subtype check limit reached");
                return false;
            }
        }
        let result = self.sub_entered(t, u, guard);
        guard.leave(&key);
        result
    }

    fn sub_entered(&self, t: &Type, u: &Type, guard: &mut SubtypeGuard) -> bool {
        let definition = t.definition();
        if definition == u.definition() {
            let arity = t.bindings().len();
            let formals = self.store.formals(definition);
            if arity == u.bindings().len() && arity == formals.len() {
                let all = (0..arity).all(|i| {
                    let variance = self.store.variance(formals[i]);
                    self.sub_binding(&t.bindings()[i], &u.bindings()[i], variance, guard)
                });
                if all {
                    return true;
                }
            }
        } else {
            let tree = self.super_type_tree(t);
            if tree
                .get(u.definition())
                .iter()
                .any(|st| self.sub(st, u, guard))
            {
                return true;
            }
        }

        // Functional interfaces with the same derived signature are equivalent.
        if !t.is_param()
            && !u.is_param()
            && self.store.is_functional_interface(definition)
            && self.store.is_functional_interface(u.definition())
        {
            let sig_t = sig_for_fun_interface_type(&self.store, t);
            let sig_u = sig_for_fun_interface_type(&self.store, u);
            if sig_t.is_some() && sig_t == sig_u {
                return true;
            }
        }
        false
    }

    fn sub_binding(&self, b: &Type, c: &Type, variance: Variance, guard: &mut SubtypeGuard) -> bool {
        if b == c {
            return true;
        }
        match variance {
            Variance::Invariant => false,
            Variance::Covariant => self.sub(b, c, guard),
            Variance::Contravariant => self.sub(c, b, guard),
        }
    }

    /// `t <: u` where either side may mention solver variables.
    ///
    /// Comparisons that reach a variable reference answer according to
    /// `optimism`.
    pub fn is_sub_type_partial(&self, t: &TypeLike, u: &TypeLike, optimism: Optimism) -> bool {
        let mut guard = self.guard();
        self.sub_partial(t, u, optimism, &mut guard)
    }

    /// `is_sub_type_partial` with `Optimism::Optimistic`.
    pub fn is_sub_type_optimistic(&self, t: &TypeLike, u: &TypeLike) -> bool {
        self.is_sub_type_partial(t, u, Optimism::Optimistic)
    }

    fn sub_partial(
        &self,
        t: &TypeLike,
        u: &TypeLike,
        optimism: Optimism,
        guard: &mut SubtypeGuard,
    ) -> bool {
        if t == u {
            return true;
        }
        let (Some(td), Some(ud)) = (t.definition(), u.definition()) else {
            return optimism.answer();
        };
        if t.nullity().is_nullable() {
            return u.nullity().is_nullable()
                && self.sub_partial(&t.non_null(), &u.non_null(), optimism, guard);
        }
        if u.nullity().is_nullable() {
            return self.sub_partial(t, &u.non_null(), optimism, guard);
        }
        if td != ud && td == DefId::NEVER && t.binding_count() == 1 {
            if let Some(inner) = t.binding(0) {
                if self.sub_binding_partial(&inner, u, Variance::Covariant, optimism, guard) {
                    return true;
                }
            }
        }

        let key = (t.clone(), u.clone());
        match guard.enter(&key) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => return true,
            exceeded => {
                warn!(?exceeded, ?t, ?u, "partial subtype check limit reached");
                return false;
            }
        }
        let result = self.sub_partial_entered(t, td, u, ud, optimism, guard);
        guard.leave(&key);
        result
    }

    fn sub_partial_entered(
        &self,
        t: &TypeLike,
        td: DefId,
        u: &TypeLike,
        ud: DefId,
        optimism: Optimism,
        guard: &mut SubtypeGuard,
    ) -> bool {
        if td == ud {
            let arity = t.binding_count();
            let formals = self.store.formals(td);
            if arity == u.binding_count() && arity == formals.len() {
                let tb = t.bindings();
                let ub = u.bindings();
                return (0..arity).all(|i| {
                    let variance = self.store.variance(formals[i]);
                    self.sub_binding_partial(&tb[i], &ub[i], variance, optimism, guard)
                });
            }
            false
        } else {
            let tree = self.partial_super_type_tree(t);
            tree.get(ud)
                .iter()
                .any(|st| self.sub_partial(st, u, optimism, guard))
        }
    }

    fn sub_binding_partial(
        &self,
        b: &TypeLike,
        c: &TypeLike,
        variance: Variance,
        optimism: Optimism,
        guard: &mut SubtypeGuard,
    ) -> bool {
        if b == c {
            return true;
        }
        if !b.is_type_or_partial() || !c.is_type_or_partial() {
            return optimism.answer();
        }
        match variance {
            Variance::Invariant => false,
            Variance::Covariant => self.sub_partial(b, c, optimism, guard),
            Variance::Contravariant => self.sub_partial(c, b, optimism, guard),
        }
    }

    // =========================================================================
    // Least upper / greatest lower bounds
    // =========================================================================

    /// The least upper bounds of `t` and `u`. More than one when the lattice
    /// has several incomparable nearest common supertypes.
    pub fn lub(&self, t: &Type, u: &Type) -> Vec<Type> {
        if t == u {
            return vec![t.clone()];
        }
        if t.is_nullable() || u.is_nullable() {
            return self
                .lub(&t.non_null(), &u.non_null())
                .into_iter()
                .map(|x| x.or_null())
                .collect();
        }
        if t.definition() != u.definition() {
            if t.is_never() && t.bindings().len() == 1 {
                return self.lub(&t.bindings()[0], u);
            }
            if u.is_never() && u.bindings().len() == 1 {
                return self.lub(&u.bindings()[0], t);
            }
        }

        let key = (t.clone(), u.clone());
        if let Some(hit) = self.lub_memo.get(&key) {
            return hit.clone();
        }
        let result = if t.is_param() || u.is_param() {
            self.lub_with_params(t, u)
        } else {
            self.least_common_super_types(&[t.clone(), u.clone()])
                .into_iter()
                .collect()
        };
        self.lub_memo.insert(key, result.clone());
        result
    }

    fn lub_with_params(&self, t: &Type, u: &Type) -> Vec<Type> {
        // <T, U extends T> and transitive variants.
        if t.is_param() && u.is_param() {
            if self.is_sub_type(t, u) {
                return vec![u.clone()];
            }
            if self.is_sub_type(u, t) {
                return vec![t.clone()];
            }
        }
        let bounds_of = |x: &Type| {
            if x.is_param() {
                self.store.upper_bounds(x.definition())
            } else {
                vec![x.clone()]
            }
        };
        let t_bounds = bounds_of(t);
        let u_bounds = bounds_of(u);
        let mut out: IndexSet<Type> = IndexSet::new();
        for tb in &t_bounds {
            for ub in &u_bounds {
                out.extend(self.lub(tb, ub));
            }
        }
        out.into_iter().collect()
    }

    pub fn least_common_super_types(&self, types: &[Type]) -> IndexSet<Type> {
        least_common_supers(
            types,
            |t| self.super_type_tree(t),
            |a, b| self.is_sub_type(a, b),
        )
    }

    pub fn least_common_super_partial_types(
        &self,
        types: &[TypeLike],
        optimism: Optimism,
    ) -> IndexSet<TypeLike> {
        least_common_supers(
            types,
            |t| self.partial_super_type_tree(t),
            |a, b| self.is_sub_type_partial(a, b, optimism),
        )
    }

    /// The greatest lower bound, if the two are comparable.
    pub fn glb(&self, t: &Type, u: &Type) -> Option<Type> {
        if t == u {
            return Some(t.clone());
        }
        if t.is_nullable() || u.is_nullable() {
            let g = self.glb(&t.non_null(), &u.non_null());
            return if t.is_nullable() && u.is_nullable() {
                g.map(|x| x.or_null())
            } else {
                g
            };
        }
        if t.definition() != u.definition() {
            if t.is_never() && t.bindings().len() == 1 {
                return self.glb(&t.bindings()[0], u).map(Type::never_of);
            }
            if u.is_never() && u.bindings().len() == 1 {
                return self.glb(&u.bindings()[0], t).map(Type::never_of);
            }
        }
        if self.is_sub_type(t, u) {
            Some(t.clone())
        } else if self.is_sub_type(u, t) {
            Some(u.clone())
        } else {
            None
        }
    }

    /// `glb` over partial types; variable references only meet themselves.
    pub fn glb_partial(&self, t: &TypeLike, u: &TypeLike) -> Option<TypeLike> {
        if t == u {
            return Some(t.clone());
        }
        let (Some(td), Some(ud)) = (t.definition(), u.definition()) else {
            return None;
        };
        if t.nullity().is_nullable() || u.nullity().is_nullable() {
            let g = self.glb_partial(&t.non_null(), &u.non_null());
            return if t.nullity().is_nullable() && u.nullity().is_nullable() {
                g.map(|x| x.with_nullity(Nullity::OrNull))
            } else {
                g
            };
        }
        if td != ud {
            let wrap = |g: TypeLike| PartialType::from(DefId::NEVER, vec![g], Nullity::NonNull);
            if td == DefId::NEVER && t.binding_count() == 1 {
                let inner = t.binding(0)?;
                return self.glb_partial(&inner, u).map(wrap);
            }
            if ud == DefId::NEVER && u.binding_count() == 1 {
                let inner = u.binding(0)?;
                return self.glb_partial(&inner, t).map(wrap);
            }
        }
        if self.is_sub_type_partial(t, u, Optimism::Pessimistic) {
            Some(t.clone())
        } else if self.is_sub_type_partial(u, t, Optimism::Pessimistic) {
            Some(u.clone())
        } else {
            None
        }
    }

    // =========================================================================
    // Inheritance paths
    // =========================================================================

    /// The shortest chain `s, ..., t` where each definition directly extends
    /// the next, or `None` if `s` does not inherit from `t`.
    ///
    /// Ties go to the supertype declared first.
    pub fn extends_path(&self, s: DefId, t: DefId) -> Option<Vec<DefId>> {
        if s == t {
            return Some(vec![s]);
        }
        if let Some(hit) = self.extends_paths.get(&(s, t)) {
            return hit.clone();
        }
        let path = self.search_extends_path(s, t);
        self.extends_paths.insert((s, t), path.clone());
        path
    }

    fn search_extends_path(&self, s: DefId, t: DefId) -> Option<Vec<DefId>> {
        let mut chains: std::collections::VecDeque<Vec<DefId>> = [vec![s]].into();
        let mut seen: IndexSet<DefId> = IndexSet::new();
        while let Some(chain) = chains.pop_front() {
            let Some(&head) = chain.last() else { continue };
            // Inheritance cycles.
            if !seen.insert(head) {
                continue;
            }
            let supers = if self.store.is_formal(head) {
                self.store.upper_bounds(head)
            } else {
                self.store.super_types(head)
            };
            for st in supers {
                let d = st.definition();
                if d == t {
                    let mut full = chain;
                    full.push(d);
                    return Some(full);
                }
                if !chain.contains(&d) {
                    let mut longer = chain.clone();
                    longer.push(d);
                    chains.push_back(longer);
                }
            }
        }
        None
    }

    pub fn admits_null(&self, t: &TypeLike) -> bool {
        t.nullity().is_nullable()
    }

    /// Like `admits_null`, but `None` for formal references, whose bounds
    /// do not say.
    pub fn admits_null_fuzzing_type_param_ref(&self, t: &TypeLike) -> Option<bool> {
        if t.is_param() {
            None
        } else {
            Some(self.admits_null(t))
        }
    }

    // =========================================================================
    // Overload specificity
    // =========================================================================

    /// Whether one signature's inputs are uniformly narrower than the other's.
    ///
    /// The signatures' own type formals are matched up positionally and
    /// replaced by shared placeholder variables before comparing. Every input
    /// position that differs must point the same way; otherwise the two are
    /// incomparable. A bare placeholder on one side is wider than a concrete
    /// type on the other when that type fits all of the placeholder formal's
    /// upper bounds.
    pub fn overload_specificity(&self, a: &Signature, b: &Signature) -> Option<Specificity> {
        let key = (a.clone(), b.clone());
        if let Some(hit) = self.specificity_memo.get(&key) {
            return hit.clone();
        }
        let result = self.compute_specificity(a, b);
        self.specificity_memo.insert(key, result.clone());
        result
    }

    fn compute_specificity(&self, a: &Signature, b: &Signature) -> Option<Specificity> {
        let inputs = |s: &Signature| s.required.len() + s.optional.len() + usize::from(s.rest.is_some());
        let n = inputs(a).max(inputs(b));
        let max_type_arity = a.type_formals.len().max(b.type_formals.len());
        let placeholders: Vec<TypeVar> = (0..max_type_arity)
            .map(|_| {
                let n = self.specificity_var_counter.fetch_add(1, Ordering::Relaxed);
                TypeVar::new(&format!("{VAR_PREFIX_CHAR}Q{n}"))
            })
            .collect();
        let binding_map = |s: &Signature| -> FxHashMap<DefId, TypeLike> {
            s.type_formals
                .iter()
                .zip(&placeholders)
                .map(|(f, v)| (*f, TypeLike::Var(v.to_ref())))
                .collect()
        };
        let a_map = binding_map(a);
        let b_map = binding_map(b);
        let no_vars = FxHashMap::default();

        let mut more_specific: Option<Side> = None;
        let mut distinguishing = Vec::new();
        for i in 0..n {
            let a_formal = a.value_formal_for_actual(i)?;
            let b_formal = b.value_formal_for_actual(i)?;
            let act = map_type_like(
                &TypeLike::Type(a_formal.ty),
                &mut MapLookup {
                    vars: &no_vars,
                    formals: &a_map,
                },
            );
            let bct = map_type_like(
                &TypeLike::Type(b_formal.ty),
                &mut MapLookup {
                    vars: &no_vars,
                    formals: &b_map,
                },
            );
            if act == bct {
                continue;
            }
            let direction = if self.is_sub_type_partial(&act, &bct, Optimism::Pessimistic) {
                Side::Left
            } else if self.is_sub_type_partial(&bct, &act, Optimism::Pessimistic) {
                Side::Right
            } else if self.placeholder_admits(&act, a, &bct, &placeholders) {
                Side::Right
            } else if self.placeholder_admits(&bct, b, &act, &placeholders) {
                Side::Left
            } else {
                return None;
            };
            if more_specific.is_some_and(|m| m != direction) {
                return None;
            }
            more_specific = Some(direction);
            distinguishing.push(i);
        }
        let more_specific = more_specific?;
        (!distinguishing.is_empty()).then_some(Specificity {
            more_specific,
            distinguishing_argument_indices: distinguishing,
        })
    }

    /// `wide` is a bare placeholder standing for one of `sig`'s type formals
    /// and `narrow` is a type within all of that formal's upper bounds.
    fn placeholder_admits(
        &self,
        wide: &TypeLike,
        sig: &Signature,
        narrow: &TypeLike,
        placeholders: &[TypeVar],
    ) -> bool {
        let (Some(var_ref), Some(narrow)) = (wide.as_var(), narrow.as_type()) else {
            return false;
        };
        // `T` does not admit `C?`; `T?` admits both `C` and `C?`.
        if narrow.is_nullable() && !var_ref.nullity.is_nullable() {
            return false;
        }
        let Some(index) = placeholders.iter().position(|p| *p == var_ref.var) else {
            return false;
        };
        let Some(formal) = sig.type_formals.get(index) else {
            return false;
        };
        let narrow = narrow.non_null();
        self.store
            .upper_bounds(*formal)
            .iter()
            .all(|ub| self.is_sub_type(&narrow, ub))
    }
}

/// Nearest common supertypes shared by every input.
fn least_common_supers<T, TreeOf, IsSub>(types: &[T], tree_of: TreeOf, mut is_sub: IsSub) -> IndexSet<T>
where
    T: SuperTypeNode,
    TreeOf: Fn(&T) -> Arc<SuperTypeTree<T>>,
    IsSub: FnMut(&T, &T) -> bool,
{
    let trees: Vec<Arc<SuperTypeTree<T>>> = types.iter().map(&tree_of).collect();
    let Some(first) = trees.first() else {
        return IndexSet::new();
    };
    // Definitions every input inherits from.
    let commons: Vec<DefId> = first
        .definitions()
        .filter(|d| trees[1..].iter().all(|tree| tree.contains_definition(*d)))
        .collect();

    // Instantiations of those that every input is a subtype of.
    let mut valids: IndexMap<DefId, IndexSet<T>> = IndexMap::new();
    for d in commons {
        let candidates: IndexSet<T> = trees
            .iter()
            .flat_map(|tree| tree.get(d).iter().cloned())
            .filter(|candidate| types.iter().all(|t| is_sub(t, candidate)))
            .collect();
        if !candidates.is_empty() {
            valids.insert(d, candidates);
        }
    }

    // Drop definitions that are supertypes of other valid instantiations.
    let mut leasts: IndexSet<DefId> = valids.keys().copied().collect();
    for candidate in valids.values().flatten() {
        let own = candidate.node_definition();
        for super_def in tree_of(candidate).definitions() {
            if Some(super_def) != own {
                leasts.shift_remove(&super_def);
            }
        }
    }

    valids
        .into_iter()
        .filter(|(d, _)| leasts.contains(d))
        .flat_map(|(_, ts)| ts)
        .collect()
}

#[cfg(test)]
#[path = "../tests/context_tests.rs"]
mod tests;
