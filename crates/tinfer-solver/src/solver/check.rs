//! Per-node checks: unpacking the node's own boundary, narrowing its bound
//! sets, and reconciling its partial bounds into bounds on variables.

use super::node::NodeId;
use super::{TypeSolver, type_constraint_for};
use crate::bounds::BoundKind;
use crate::category::TypeCategory;
use crate::constraint::Constraint;
use crate::def::DefId;
use crate::reconcile::{Reconciliation, reconcile_partial_types};
use crate::types::{
    Nullity, PartialType, Solution, Solvable, Type, TypeBoundary, TypeLike, Value, ValueBound,
};
use indexmap::IndexSet;
use std::sync::Arc;
use tracing::trace;

impl TypeSolver {
    /// Re-examine a node if anything it depends on changed since last time.
    pub(super) fn check_node(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        if node.is_chosen() {
            return;
        }
        let last = node.last_check_stamp;
        let stale = !node.bound_checked
            || node.full.last_changed_stamp() > last
            || node.partial.last_changed_stamp() > last
            || node.type_vars_used.iter().any(|v| {
                self.lookup(&Solvable::from(v.clone()))
                    .is_some_and(|vid| self.nodes[vid].solved_at_stamp > last)
            });
        if !stale {
            return;
        }
        let stamp = self.next_stamp();
        self.nodes[id].last_check_stamp = stamp;

        if !self.nodes[id].bound_checked {
            self.nodes[id].bound_checked = true;
            self.unpack_boundary(id);
        }
        if self.nodes[id].is_chosen() {
            return;
        }

        self.normalize_bounds(id);

        let node = &self.nodes[id];
        if node.partial.len() + node.full.len() >= 2 {
            self.reconcile_node(id);
        }

        if let Some(common) = self.nodes[id].full.common().first().cloned() {
            self.choose(id, Solution::Type(common));
        }
    }

    fn unpack_boundary(&mut self, id: NodeId) {
        match self.nodes[id].boundary().cloned() {
            Some(TypeBoundary::Like(TypeLike::Type(t))) => self.choose(id, Solution::Type(t)),
            Some(TypeBoundary::Like(TypeLike::Partial(p))) => {
                self.add_partial_bound(p, id, BoundKind::Common);
            }
            Some(TypeBoundary::Value(v)) => self.unpack_value(id, &v),
            _ => {}
        }
    }

    /// Type a literal from its value.
    fn unpack_value(&mut self, id: NodeId, bound: &ValueBound) {
        let scalar = match bound.value() {
            Value::Boolean(_) => Some(DefId::BOOLEAN),
            Value::Float64(_) => Some(DefId::FLOAT64),
            Value::Int(_) => Some(DefId::INT32),
            Value::Int64(_) => Some(DefId::INT64),
            Value::String(_) => Some(DefId::STRING),
            Value::Void => Some(DefId::VOID),
            _ => None,
        };
        if let Some(d) = scalar {
            self.choose(id, Solution::Type(Type::simple(d)));
            return;
        }

        let (partial, kind) = match bound.value() {
            Value::Class(shape) => {
                let category = TypeCategory::of_definition(self.ctx.store(), *shape);
                if matches!(category, TypeCategory::Never | TypeCategory::Result) {
                    return;
                }
                let partial = self.partial_bound_for(*shape, Nullity::NonNull, &[]);
                self.add_constraint(Constraint::sub_type(
                    TypeBoundary::Value(bound.clone()),
                    TypeBoundary::Like(partial.clone()),
                ));
                (partial, BoundKind::Common)
            }
            Value::List(elements) | Value::ListBuilder(elements) => {
                let shape = if matches!(bound.value(), Value::List(_)) {
                    DefId::LIST
                } else {
                    DefId::LIST_BUILDER
                };
                let partial = self.partial_bound_for(shape, Nullity::NonNull, &[]);
                if let Some(element_type) = partial.binding(0) {
                    for e in elements {
                        let element = self.namer.value_bound(e.clone());
                        self.assignable(TypeBoundary::Like(element_type.clone()), TypeBoundary::Value(element));
                    }
                }
                (partial, BoundKind::Common)
            }
            Value::Map(entries) | Value::MapBuilder(entries) => {
                let shape = if matches!(bound.value(), Value::Map(_)) {
                    DefId::MAP
                } else {
                    DefId::MAP_BUILDER
                };
                let partial = self.partial_bound_for(shape, Nullity::NonNull, &[]);
                if let (Some(key_type), Some(value_type)) = (partial.binding(0), partial.binding(1)) {
                    for (k, v) in entries {
                        let key = self.namer.value_bound(k.clone());
                        let value = self.namer.value_bound(v.clone());
                        self.assignable(TypeBoundary::Like(key_type.clone()), TypeBoundary::Value(key));
                        self.assignable(TypeBoundary::Like(value_type.clone()), TypeBoundary::Value(value));
                    }
                }
                (partial, BoundKind::Common)
            }
            Value::Null => (
                self.partial_bound_for(DefId::NEVER, Nullity::OrNull, &["nullLiteral"]),
                BoundKind::Lower,
            ),
            _ => return,
        };
        if let TypeLike::Partial(p) = &partial {
            self.nodes[id].type_vars_used = p.type_vars_used();
        }
        self.add_bound(partial, id, kind);
    }

    /// `Shape<ʼShape_F0, ...>` with a fresh variable per formal.
    pub(super) fn partial_bound_for(&mut self, shape: DefId, nullity: Nullity, prefixes: &[&str]) -> TypeLike {
        let ctx = Arc::clone(&self.ctx);
        let store = ctx.store();
        let shape_name = store.name(shape);
        let mut bindings = Vec::new();
        for (i, formal) in store.formals(shape).into_iter().enumerate() {
            let hint = match prefixes.get(i) {
                Some(p) => (*p).to_owned(),
                None => format!("{shape_name}_{}", store.name(formal)),
            };
            bindings.push(TypeLike::Var(self.namer.unused_type_var(&hint).to_ref()));
        }
        PartialType::from(shape, bindings, nullity)
    }

    /// Strictly narrowing rewrites of a node's bounds:
    ///
    /// - with any nullable lower or common bound, non-null lower bounds become
    ///   nullable;
    /// - with any lower or common bound outside `Never`, `Never<T>` lower
    ///   bounds become `T`;
    /// - with any non-null upper or common bound, nullable upper bounds become
    ///   non-null.
    ///
    /// Each replaced bound is obviated so it cannot come back.
    fn normalize_bounds(&mut self, id: NodeId) {
        let ctx = Arc::clone(&self.ctx);
        let node = &self.nodes[id];
        let lowers = node.lowers();
        let uppers = node.uppers();
        let commons = node.commons();

        let mut nullable_lower_or_common = false;
        let mut non_null_lower = false;
        let mut never_lower = false;
        let mut non_never_lower_or_common = false;
        let mut non_null_upper_or_common = false;
        let mut nullable_upper = false;

        for b in &lowers {
            match ctx.admits_null_fuzzing_type_param_ref(b) {
                Some(true) => nullable_lower_or_common = true,
                Some(false) => non_null_lower = true,
                None => {}
            }
            if !is_never(b) {
                non_never_lower_or_common = true;
            } else if b.binding_count() == 1 && b.binding(0).is_some_and(|x| x.is_type_or_partial()) {
                never_lower = true;
            }
        }
        for b in &uppers {
            match ctx.admits_null_fuzzing_type_param_ref(b) {
                Some(true) => nullable_upper = true,
                Some(false) => non_null_upper_or_common = true,
                None => {}
            }
        }
        if !nullable_lower_or_common || !non_null_upper_or_common || !non_never_lower_or_common {
            for b in &commons {
                match ctx.admits_null_fuzzing_type_param_ref(b) {
                    Some(true) => nullable_lower_or_common = true,
                    Some(false) => non_null_upper_or_common = true,
                    None => {}
                }
                if !is_never(b) {
                    non_never_lower_or_common = true;
                }
            }
        }

        if nullable_lower_or_common && non_null_lower {
            for b in &lowers {
                if ctx.admits_null_fuzzing_type_param_ref(b) == Some(false) {
                    let nullable = b.with_nullity(Nullity::OrNull);
                    if &nullable != b {
                        self.replace_bound(id, b, nullable, BoundKind::Lower);
                    }
                }
            }
        }
        if non_never_lower_or_common && never_lower {
            for b in &lowers {
                if !is_never(b) || b.binding_count() != 1 {
                    continue;
                }
                let Some(mut inner) = b.binding(0) else { continue };
                if b.nullity().is_nullable() {
                    inner = inner.with_nullity(Nullity::OrNull);
                }
                if inner.is_type_or_partial() {
                    self.replace_bound(id, b, inner, BoundKind::Lower);
                }
            }
        }
        if non_null_upper_or_common && nullable_upper {
            for b in &uppers {
                if ctx.admits_null_fuzzing_type_param_ref(b) == Some(true) {
                    let non_null = b.non_null();
                    if &non_null != b {
                        self.replace_bound(id, b, non_null, BoundKind::Upper);
                    }
                }
            }
        }
    }

    fn replace_bound(&mut self, id: NodeId, old: &TypeLike, new: TypeLike, kind: BoundKind) {
        trace!(node = id, kind = ?kind, "narrowing bound");
        if self.add_bound(new, id, kind) {
            self.nodes[id].obviate(old, kind);
        }
    }

    /// Relate the variables inside a node's partial bounds to each other and
    /// to its full bounds.
    fn reconcile_node(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let lowers = self.reconcile_list(node.full.lower(), node.partial.lower());
        let common = self.reconcile_list(node.full.common(), node.partial.common());
        let uppers = self.reconcile_list(node.full.upper(), node.partial.upper());
        let reconciliations = reconcile_partial_types(&lowers, &common, &uppers, &self.ctx);
        for r in reconciliations {
            match r {
                Reconciliation::Partial { var, bound, kind } => {
                    let var_id = self.type_node(&TypeBoundary::Var(var));
                    self.add_bound(bound, var_id, kind);
                }
                Reconciliation::Var { bounded, bound, kind } => {
                    let (a, b) = if !bounded.nullity.is_nullable() && !bound.nullity.is_nullable() {
                        (TypeBoundary::Var(bounded.var), TypeBoundary::Var(bound.var))
                    } else {
                        (TypeBoundary::from(bounded), TypeBoundary::from(bound))
                    };
                    self.add_constraint(type_constraint_for(a, b, kind));
                }
            }
        }
    }

    /// Full bounds, then partial bounds with any solved ones replaced by
    /// their solution.
    fn reconcile_list(&self, full: &IndexSet<Type>, partial: &IndexSet<PartialType>) -> Vec<TypeLike> {
        let solved = |p: &PartialType| {
            let key = Solvable::from(TypeLike::Partial(p.clone()));
            self.lookup(&key)
                .and_then(|pid| self.nodes[pid].type_choice().cloned())
        };
        full.iter()
            .cloned()
            .map(TypeLike::Type)
            .chain(partial.iter().map(|p| match solved(p) {
                Some(t) => TypeLike::Type(t),
                None => TypeLike::Partial(p.clone()),
            }))
            .collect()
    }
}

fn is_never(b: &TypeLike) -> bool {
    !b.is_param() && b.definition() == Some(DefId::NEVER)
}
