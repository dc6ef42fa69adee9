//! Deriving bounds on nested variables from a node's bound sets.
//!
//! Two partial bounds on one node, `Map<a, Int32>` and `Map<String, b>`,
//! say more together than apart: `a` is bounded by `String`, `b` by
//! `Int32`, and the node by `Map<String, Int32>`. Reconciliation compares
//! bounds pairwise across the node's lower, common and upper sets and
//! reports what each comparison says about the variables inside them.
//!
//! The direction of a derived bound comes from the directions of the two
//! bounds compared and the variance of the formal whose bindings are lined
//! up, through `kind_for`.

use crate::bounds::BoundKind;
use crate::context::TypeContext;
use crate::def::{Abstractness, DefId, DefinitionStore, Variance};
use crate::types::{Nullity, PartialType, Render, TypeLike, TypeVar, TypeVarRef};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashSet;
use std::fmt;

/// A bound derived for a variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reconciliation {
    /// `var` has `bound`, a type or partial type, as a `kind` bound.
    Partial {
        var: TypeVar,
        bound: TypeLike,
        kind: BoundKind,
    },
    /// `bounded` has `bound` as a `kind` bound.
    Var {
        bounded: TypeVarRef,
        bound: TypeVarRef,
        kind: BoundKind,
    },
}

impl Render for Reconciliation {
    fn render(&self, store: &DefinitionStore, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (bounded, bound, kind) = match self {
            Reconciliation::Partial { var, bound, kind } => (TypeLike::Var(var.to_ref()), bound.clone(), *kind),
            Reconciliation::Var { bounded, bound, kind } => (
                TypeLike::Var(bounded.clone()),
                TypeLike::Var(bound.clone()),
                *kind,
            ),
        };
        let (left, op, right) = match kind {
            BoundKind::Upper => (&bounded, " <: ", &bound),
            BoundKind::Lower => (&bound, " <: ", &bounded),
            BoundKind::Common => (&bounded, " == ", &bound),
        };
        left.render(store, f)?;
        f.write_str(op)?;
        right.render(store, f)
    }
}

/// The kind of bound that binding `a` (from an `a_kind` bound) places on
/// binding `b` (from a `b_kind` bound) when both sit in a formal with
/// variance `v`. `None` when the comparison says nothing.
pub fn kind_for(a_kind: BoundKind, b_kind: BoundKind, v: Variance) -> Option<BoundKind> {
    use BoundKind::{Common, Lower, Upper};
    match (a_kind, b_kind, v) {
        // Two lower or two upper bounds do not say which way `<:` goes.
        (Lower, Lower, Variance::Invariant) | (Upper, Upper, Variance::Invariant) => Some(Common),
        (Lower, Lower, _) | (Upper, Upper, _) => None,
        (Common, Common, _) => Some(Common),
        (_, _, Variance::Covariant) => Some(Upper),
        (_, _, Variance::Invariant) => Some(Common),
        (_, _, Variance::Contravariant) => Some(Lower),
    }
}

type ByShape = IndexMap<DefId, IndexSet<TypeLike>>;

/// Reconcile the bounds of one node.
pub fn reconcile_partial_types(
    lowers: &[TypeLike],
    common: &[TypeLike],
    uppers: &[TypeLike],
    ctx: &TypeContext,
) -> IndexSet<Reconciliation> {
    let mut out = Reconciler {
        ctx,
        out: IndexSet::new(),
    };
    out.run(lowers, common, uppers);
    out.out
}

struct Reconciler<'a> {
    ctx: &'a TypeContext,
    out: IndexSet<Reconciliation>,
}

fn split_vars(ts: &[TypeLike]) -> (Vec<TypeVarRef>, Vec<TypeLike>) {
    let mut vars = Vec::new();
    let mut others = Vec::new();
    for t in ts {
        match t {
            TypeLike::Var(r) => vars.push(r.clone()),
            _ => others.push(t.clone()),
        }
    }
    (vars, others)
}

fn first_full(ts: &[TypeLike]) -> Option<&TypeLike> {
    ts.iter().find(|t| matches!(t, TypeLike::Type(_)))
}

impl Reconciler<'_> {
    fn store(&self) -> &DefinitionStore {
        self.ctx.store()
    }

    fn run(&mut self, lowers: &[TypeLike], common: &[TypeLike], uppers: &[TypeLike]) {
        // Separate variables from everything else.
        let (u_vars_hi, u_other_hi) = split_vars(uppers);
        let (c_vars_hi, c_other_hi) = split_vars(common);
        let (l_vars_hi, l_other_hi) = split_vars(lowers);

        // Group by shape, then expose what sits inside `Never<...>`.
        let u_by_def_hi = self.grouped_by_shape(&u_other_hi);
        let c_by_def_hi = self.grouped_by_shape(&c_other_hi);
        let l_by_def_hi = self.grouped_by_shape(&l_other_hi);
        let (u_by_def_lo, _, _) = self.grouped_by_shape_lo(&u_by_def_hi, &u_vars_hi);
        let (c_by_def_lo, c_vars_lo, c_unwrapped) = self.grouped_by_shape_lo(&c_by_def_hi, &c_vars_hi);
        let (l_by_def_lo, l_vars_lo, l_unwrapped) = self.grouped_by_shape_lo(&l_by_def_hi, &l_vars_hi);

        // Across sets: lower against common and upper, common against upper.
        let across = [
            (&l_by_def_lo, BoundKind::Lower, &c_by_def_hi, BoundKind::Common),
            (&l_by_def_lo, BoundKind::Lower, &u_by_def_hi, BoundKind::Upper),
            (&c_by_def_lo, BoundKind::Common, &u_by_def_hi, BoundKind::Upper),
        ];
        for (group, kind, higher, higher_kind) in across {
            for (&def, ts) in group {
                for t in ts {
                    let mut projections = None;
                    for (&h_def, hts) in higher {
                        if def == h_def {
                            for ht in hts {
                                self.reconcile_bindings(def, &t.bindings(), kind, &ht.bindings(), higher_kind);
                            }
                        } else {
                            let tree = projections.get_or_insert_with(|| self.ctx.partial_super_type_tree(t));
                            for lt in tree.get(h_def) {
                                for ht in hts {
                                    self.reconcile_bindings(
                                        h_def,
                                        &lt.bindings(),
                                        kind,
                                        &ht.bindings(),
                                        higher_kind,
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }

        // Within sets; only invariant positions yield anything.
        let within = [
            (flatten(&u_by_def_lo), BoundKind::Upper),
            (flatten(&c_by_def_lo), BoundKind::Common),
            (flatten(&l_by_def_lo), BoundKind::Lower),
        ];
        for (list, kind) in &within {
            for (i, a) in list.iter().enumerate() {
                let Some(a_def) = a.definition() else { continue };
                for b in &list[i + 1..] {
                    let Some(b_def) = b.definition() else { continue };
                    if a_def == b_def {
                        self.reconcile_bindings(a_def, &a.bindings(), *kind, &b.bindings(), *kind);
                        continue;
                    }
                    // Project the deeper one up to the shallower one's shape.
                    let (def, a_ts, b_ts) =
                        if inheritance_depth(self.store(), a_def) > inheritance_depth(self.store(), b_def) {
                            let a_ts = self.ctx.partial_super_type_tree(a).get(b_def).to_vec();
                            (b_def, a_ts, vec![b.clone()])
                        } else {
                            let b_ts = self.ctx.partial_super_type_tree(b).get(a_def).to_vec();
                            (a_def, vec![a.clone()], b_ts)
                        };
                    for at in &a_ts {
                        for bt in &b_ts {
                            self.reconcile_bindings(def, &at.bindings(), *kind, &bt.bindings(), *kind);
                        }
                    }
                }
            }
        }

        // Common variables against a common bound.
        let full_c_bound = first_full(&c_other_hi).cloned();
        match &full_c_bound {
            Some(full) => {
                for v in &c_vars_hi {
                    self.add_reconciliation(v, full, BoundKind::Common);
                }
            }
            None => {
                for v in &c_vars_hi {
                    for bound in &c_other_hi {
                        self.add_reconciliation(v, bound, BoundKind::Common);
                    }
                }
            }
        }

        // Variables in one set against bounds in the sets that surround it.
        let short_c_list = full_c_bound.map(|t| vec![t]);
        let l_other_lo = if l_unwrapped { flatten(&l_by_def_lo) } else { l_other_hi };
        let c_other_lo = if c_unwrapped { flatten(&c_by_def_lo) } else { c_other_hi.clone() };
        let mut surrounded: Vec<(Vec<TypeLike>, &[TypeVarRef], Vec<TypeLike>)> = vec![
            (
                Vec::new(),
                u_vars_hi.as_slice(),
                short_c_list
                    .clone()
                    .unwrap_or_else(|| [l_other_lo.clone(), c_other_lo].concat()),
            ),
            (
                short_c_list
                    .clone()
                    .unwrap_or_else(|| [u_other_hi.clone(), c_other_hi].concat()),
                l_vars_lo.as_slice(),
                Vec::new(),
            ),
        ];
        if short_c_list.is_none() {
            surrounded.push((u_other_hi, c_vars_lo.as_slice(), Vec::new()));
            surrounded.push((Vec::new(), c_vars_hi.as_slice(), l_other_lo));
        }
        for (above, vars, below) in surrounded {
            self.relate_all(vars, &above, BoundKind::Upper);
            self.relate_all(vars, &below, BoundKind::Lower);
        }
    }

    /// Relate each variable to the first complete bound, or failing that to
    /// every partial one.
    fn relate_all(&mut self, vars: &[TypeVarRef], bounds: &[TypeLike], kind: BoundKind) {
        if let Some(full) = first_full(bounds) {
            for v in vars {
                self.add_reconciliation(v, full, kind);
            }
        } else {
            for v in vars {
                for t in bounds {
                    self.add_reconciliation(v, t, kind);
                }
            }
        }
    }

    /// Group by definition; a formal reference contributes its upper bounds.
    fn grouped_by_shape(&self, ts: &[TypeLike]) -> ByShape {
        let mut out = ByShape::new();
        let mut exploded = FxHashSet::default();
        let mut stack: Vec<TypeLike> = ts.iter().rev().cloned().collect();
        while let Some(t) = stack.pop() {
            let Some(def) = t.definition() else { continue };
            if t.is_param() {
                if exploded.insert(def) {
                    let bounds = self.store().upper_bounds(def);
                    stack.extend(bounds.into_iter().rev().map(TypeLike::Type));
                }
            } else {
                out.entry(def).or_default().insert(t);
            }
        }
        out
    }

    /// Adds what sits inside any `Never<X>` entries. The flag says whether
    /// anything was unwrapped.
    fn grouped_by_shape_lo(
        &self,
        by_def: &ByShape,
        vars: &[TypeVarRef],
    ) -> (ByShape, Vec<TypeVarRef>, bool) {
        let Some(nevers) = by_def.get(&DefId::NEVER) else {
            return (by_def.clone(), vars.to_vec(), false);
        };
        let mut vars_lo: IndexSet<TypeVarRef> = vars.iter().cloned().collect();
        let mut inner = Vec::new();
        for t in nevers {
            if t.binding_count() != 1 {
                continue;
            }
            match t.binding(0) {
                Some(TypeLike::Var(r)) => {
                    vars_lo.insert(r);
                }
                Some(b) => inner.push(b),
                None => {}
            }
        }
        let mut by_def_lo = by_def.clone();
        for (def, ts) in self.grouped_by_shape(&inner) {
            by_def_lo.entry(def).or_default().extend(ts);
        }
        (by_def_lo, vars_lo.into_iter().collect(), true)
    }

    fn reconcile_bindings(
        &mut self,
        def: DefId,
        a: &[TypeLike],
        a_kind: BoundKind,
        b: &[TypeLike],
        b_kind: BoundKind,
    ) {
        let formals = self.store().formals(def);
        let arity = formals.len().min(a.len()).min(b.len());
        for i in 0..arity {
            let v = self.store().variance(formals[i]);
            self.reconcile_binding(&a[i], a_kind, &b[i], b_kind, v);
        }
    }

    fn reconcile_binding(
        &mut self,
        a: &TypeLike,
        a_kind: BoundKind,
        b: &TypeLike,
        b_kind: BoundKind,
        v: Variance,
    ) {
        match (a, b) {
            (TypeLike::Var(ar), TypeLike::Var(br)) => {
                if ar != br {
                    if let Some(kind) = kind_for(a_kind, b_kind, v) {
                        self.out.insert(Reconciliation::Var {
                            bounded: ar.clone(),
                            bound: br.clone(),
                            kind,
                        });
                    }
                }
            }
            (TypeLike::Var(ar), _) => {
                if let Some(kind) = kind_for(a_kind, b_kind, v) {
                    self.add_reconciliation(ar, b, kind);
                }
            }
            (_, TypeLike::Var(br)) => {
                if let Some(kind) = kind_for(b_kind, a_kind, v) {
                    self.add_reconciliation(br, a, kind.reverse());
                }
            }
            _ => {
                let (Some(a_def), Some(b_def)) = (a.definition(), b.definition()) else {
                    return;
                };
                if a_def == b_def {
                    self.reconcile_bindings(a_def, &a.bindings(), a_kind, &b.bindings(), b_kind);
                } else if a_def == DefId::NEVER || b_def == DefId::NEVER {
                    // `Foo<X>` against `Never<Foo<X>>`.
                    let (never, never_kind, other, other_kind) = if a_def == DefId::NEVER {
                        (a, a_kind, b, b_kind)
                    } else {
                        (b, b_kind, a, a_kind)
                    };
                    if let (1, Some(inner)) = (never.binding_count(), never.binding(0)) {
                        let nv = self.store().variance(DefId::NEVER_T);
                        self.reconcile_binding(&inner, never_kind, other, other_kind, nv);
                    }
                }
            }
        }
    }

    fn add_reconciliation(&mut self, var_ref: &TypeVarRef, bound: &TypeLike, kind: BoundKind) {
        let var = &var_ref.var;
        if !var_ref.nullity.is_nullable() {
            self.add_var_reconciliation(var, bound.clone(), kind);
            return;
        }
        let bound_non_null = bound.with_nullity(Nullity::NonNull);
        match kind {
            // V? <: B implies V <: B.
            BoundKind::Upper => self.add_var_reconciliation(var, bound.clone(), kind),
            // B <: V? says B <: V when B excludes null.
            BoundKind::Lower => {
                if !self.ctx.admits_null(&bound_non_null) {
                    self.add_var_reconciliation(var, bound_non_null, BoundKind::Lower);
                }
            }
            // V? == B gives B <: V <: B?.
            BoundKind::Common => {
                if !self.ctx.admits_null(&bound_non_null) {
                    self.add_var_reconciliation(var, bound_non_null, BoundKind::Lower);
                }
                self.add_var_reconciliation(var, bound.with_nullity(Nullity::OrNull), BoundKind::Upper);
            }
        }
    }

    fn add_var_reconciliation(&mut self, var: &TypeVar, bound: TypeLike, kind: BoundKind) {
        if kind == BoundKind::Upper {
            if let Some(def) = bound.definition() {
                let store = self.store();
                let concrete_invariant = def != DefId::NEVER
                    && !bound.is_param()
                    && store.abstractness(def) == Abstractness::Concrete
                    && store
                        .formals(def)
                        .iter()
                        .all(|f| store.variance(*f) == Variance::Invariant);
                if concrete_invariant {
                    // Only `Never<C>` sits below a concrete, invariant `C`.
                    let never_bound = PartialType::from(DefId::NEVER, vec![bound.clone()], Nullity::NonNull);
                    self.out.insert(Reconciliation::Partial {
                        var: var.clone(),
                        bound: never_bound,
                        kind: BoundKind::Lower,
                    });
                }
            }
        }
        self.out.insert(Reconciliation::Partial {
            var: var.clone(),
            bound,
            kind,
        });
    }
}

fn flatten(by_def: &ByShape) -> Vec<TypeLike> {
    by_def.values().flatten().cloned().collect()
}

/// Length of the longest declared supertype chain from `def` to a root.
fn inheritance_depth(store: &DefinitionStore, def: DefId) -> usize {
    fn walk(store: &DefinitionStore, def: DefId, on_path: &mut FxHashSet<DefId>) -> usize {
        if !on_path.insert(def) {
            return 0;
        }
        let depth = store
            .super_types(def)
            .iter()
            .map(|st| 1 + walk(store, st.definition(), on_path))
            .max()
            .unwrap_or(0);
        on_path.remove(&def);
        depth
    }
    walk(store, def, &mut FxHashSet::default())
}

#[cfg(test)]
#[path = "../tests/reconcile_tests.rs"]
mod tests;
