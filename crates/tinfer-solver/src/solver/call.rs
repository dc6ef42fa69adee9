//! Overload narrowing for call constraints.
//!
//! Until one callee is left, each pass over a call tries to rule candidates
//! out by (in order) arity and explicit type argument count, argument
//! nullity and erased shape, a void or non-void calling context, overload
//! specificity, and callee priority. Between those, a worst-case pass unifies
//! the remaining signatures and propagates whatever bounds every candidate
//! agrees on. Once a callee is chosen, its signature is instantiated with
//! per-call type parameter variables and tied to the arguments and results.

use super::TypeSolver;
use crate::application_order::{ActualArg, application_order_for_actuals, corresponding_formal};
use crate::bounds::BoundKind;
use crate::constraint::{CallConstraint, Constraint};
use crate::def::{DefId, DefinitionStore};
use crate::mapper::{FormalFn, MapLookup, map_type_like, map_type_with};
use crate::signature::{CalleePriority, Signature};
use crate::context::Side;
use crate::types::{
    Solution, Solvable, SolverVarNamer, Type, TypeBoundary, TypeLike, TypeVar, TypeVarRef,
};
use fixedbitset::FixedBitSet;
use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{debug, trace};

type ApplicationOrder = Vec<Option<usize>>;

/// What the solver remembers about one call between rounds.
#[derive(Debug)]
pub(super) struct CallState {
    n_callees: usize,
    rejected: FixedBitSet,
    /// Per callee; `None` when the actuals cannot be paired with its formals.
    application_orders: Option<Vec<Option<ApplicationOrder>>>,
    callee_constraints_added: bool,
    /// Rejection count at the last worst-case pass.
    last_worst_case_rejected: Option<usize>,
    /// Per-call variables standing in for the chosen callee's type formals.
    type_parameter_vars: Vec<TypeVar>,
}

impl CallState {
    fn new(call: &CallConstraint) -> Self {
        Self {
            n_callees: call.callees.len(),
            rejected: FixedBitSet::with_capacity(call.callees.len()),
            application_orders: None,
            callee_constraints_added: false,
            last_worst_case_rejected: None,
            type_parameter_vars: call.type_arg_vars.clone().unwrap_or_default(),
        }
    }

    fn n_possible(&self) -> usize {
        self.n_callees - self.rejected.count_ones(..)
    }

    fn is_possible(&self, i: usize) -> bool {
        !self.rejected.contains(i)
    }

    fn possible(&self) -> Vec<usize> {
        (0..self.n_callees).filter(|&i| self.is_possible(i)).collect()
    }

    fn reject(&mut self, i: usize) {
        self.rejected.insert(i);
    }

    fn order(&self, callee: usize) -> Option<&ApplicationOrder> {
        self.application_orders
            .as_ref()
            .and_then(|orders| orders.get(callee))
            .and_then(Option::as_ref)
    }

    fn ensure_type_parameter_vars(&mut self, arity: usize, namer: &mut SolverVarNamer) {
        while self.type_parameter_vars.len() < arity {
            self.type_parameter_vars.push(namer.unused_type_var("P"));
        }
    }
}

/// Shapes an argument or formal could be, erasing type arguments.
#[derive(Default)]
struct ErasedShapes {
    shapes: IndexSet<DefId>,
    can_be_null: bool,
    visited: FxHashSet<DefId>,
}

impl ErasedShapes {
    fn unpack(&mut self, store: &DefinitionStore, definition: DefId) {
        if !store.is_formal(definition) {
            self.shapes.insert(definition);
            return;
        }
        if self.visited.insert(definition) {
            for b in store.upper_bounds(definition) {
                self.unpack(store, b.definition());
            }
        }
    }
}

/// A candidate left for worst-case analysis, with its type formals mapped to
/// shared variables where they line up across candidates.
struct PossibleCallee {
    index: usize,
    sig: Arc<Signature>,
    bindings: FxHashMap<DefId, Option<TypeVarRef>>,
}

impl TypeSolver {
    pub(super) fn process_call(&mut self, id: usize, call: &CallConstraint) {
        let mut state = self
            .call_states
            .remove(&id)
            .unwrap_or_else(|| CallState::new(call));
        let choice_id = self.node_id(&Solvable::Simple(call.callee_choice.clone()));
        if !self.nodes[choice_id].is_chosen() {
            self.narrow_callees(call, &mut state);
            match state.possible().as_slice() {
                [] => self.choose(choice_id, Solution::Unsolvable),
                [only] => self.choose(choice_id, Solution::Int(*only)),
                _ => {}
            }
        }
        if !state.callee_constraints_added {
            if let Some(choice) = self.nodes[choice_id].choice.clone() {
                state.callee_constraints_added = true;
                self.apply_chosen_callee(call, &mut state, &choice);
            }
        }
        self.call_states.insert(id, state);
    }

    fn narrow_callees(&mut self, call: &CallConstraint, state: &mut CallState) {
        let ctx = Arc::clone(&self.ctx);
        let store = ctx.store();
        let n_callees = call.callees.len();
        let n_args = call.args.len();
        let n_explicit = call.explicit_type_args.as_ref().map_or(0, Vec::len);

        if state.application_orders.is_none() {
            let actuals: Vec<ActualArg> = (0..n_args)
                .map(|i| {
                    if call.has_trailing_block && i + 1 == n_args {
                        ActualArg::TrailingBlock
                    } else {
                        ActualArg::Positional
                    }
                })
                .collect();
            state.application_orders = Some(
                call.callees
                    .iter()
                    .map(|c| application_order_for_actuals(&actuals, &c.sig, store).ok())
                    .collect(),
            );
        }

        for i in (0..n_callees).rev() {
            if state.is_possible(i)
                && (state.order(i).is_none() || n_explicit > call.callees[i].sig.type_formals.len())
            {
                state.reject(i);
            }
        }

        if state.n_possible() > 1 {
            self.reject_by_argument_shapes(call, state);
        }
        if state.n_possible() > 1 {
            self.reject_by_void_context(call, state);
        }
        if state.n_possible() > 1 {
            self.reject_less_specific(call, state);
        }
        let rejected = state.rejected.count_ones(..);
        if state.n_possible() > 1 && state.last_worst_case_rejected.is_none_or(|last| rejected > last) {
            state.last_worst_case_rejected = Some(rejected);
            self.worst_case_analysis(call, state);
        }
        if state.n_possible() > 1 && call.args.iter().all(|a| self.is_var_chosen(a)) {
            let possible = state.possible();
            let priorities = possible.iter().map(|&i| call.callees[i].priority);
            let highest = priorities.clone().max().unwrap_or(CalleePriority::Default);
            let lowest = priorities.min().unwrap_or(CalleePriority::Default);
            if highest != lowest {
                for i in possible {
                    if call.callees[i].priority < highest {
                        state.reject(i);
                    }
                }
            }
        }
        debug!(
            callees = n_callees,
            possible = state.n_possible(),
            "narrowed overloads"
        );
    }

    fn is_var_chosen(&self, v: &TypeVar) -> bool {
        self.lookup(&Solvable::from(v.clone()))
            .is_some_and(|id| self.nodes[id].is_chosen())
    }

    /// A nullable argument rules out non-null formals, and an argument whose
    /// shapes cannot reach a formal's shapes rules out that callee.
    ///
    /// Only lower and common bounds count: an upper bound may sit above or
    /// below the formal's declared type.
    fn reject_by_argument_shapes(&mut self, call: &CallConstraint, state: &mut CallState) {
        let ctx = Arc::clone(&self.ctx);
        let store = ctx.store();
        'args: for (i, arg) in call.args.iter().enumerate() {
            let arg_id = self.type_node(&TypeBoundary::Var(arg.clone()));
            let node = &self.nodes[arg_id];
            if matches!(node.choice, Some(Solution::Unsolvable)) {
                continue;
            }
            let mut actual = ErasedShapes::default();
            if let Some(t) = node.type_choice() {
                actual.unpack(store, t.definition());
                actual.can_be_null = t.is_nullable();
            } else {
                let bounds = node
                    .full
                    .common()
                    .iter()
                    .chain(node.full.lower())
                    .map(|t| (t.definition(), t.is_nullable()))
                    .chain(
                        node.partial
                            .common()
                            .iter()
                            .chain(node.partial.lower())
                            .map(|p| (p.definition(), p.nullity().is_nullable())),
                    );
                for (d, nullable) in bounds {
                    actual.can_be_null |= nullable;
                    actual.unpack(store, d);
                }
            }
            actual.shapes.shift_remove(&DefId::INVALID);

            for callee_index in (0..call.callees.len()).rev() {
                if !state.is_possible(callee_index) {
                    continue;
                }
                let sig = &call.callees[callee_index].sig;
                let Some(formal) = state
                    .order(callee_index)
                    .and_then(|order| corresponding_formal(i, order))
                    .and_then(|fi| sig.value_formal_for_actual(fi))
                else {
                    continue;
                };
                let mut possible = !actual.can_be_null || ctx.admits_null(&TypeLike::Type(formal.ty.clone()));
                if possible {
                    let mut declared = ErasedShapes::default();
                    declared.unpack(store, formal.ty.definition());
                    possible = actual.shapes.iter().all(|&a| {
                        declared
                            .shapes
                            .iter()
                            .all(|&f| ctx.extends_path(a, f).is_some())
                    });
                }
                if !possible {
                    trace!(callee = callee_index, arg = i, "argument does not fit");
                    state.reject(callee_index);
                    if state.n_possible() <= 1 {
                        break 'args;
                    }
                }
            }
        }
    }

    /// Where the call's result is known to be used as `Void` or as a value,
    /// callees returning the other kind are out.
    fn reject_by_void_context(&mut self, call: &CallConstraint, state: &mut CallState) {
        let pass_id = self.type_node(&TypeBoundary::Var(call.call_pass.clone()));
        let node = &self.nodes[pass_id];
        let candidates = node
            .type_choice()
            .map(|t| TypeLike::Type(t.clone()))
            .into_iter()
            .chain(node.bounds_vec().into_iter().map(|(b, _)| b));
        let mut pass_is_void = None;
        for b in candidates {
            if let Some(t) = voidness(&b) {
                pass_is_void = Some(t);
                break;
            }
        }
        let Some(pass_is_void) = pass_is_void else {
            return;
        };
        for i in (0..call.callees.len()).rev() {
            if !state.is_possible(i) {
                continue;
            }
            let returned = TypeLike::Type(call.callees[i].sig.return_type.clone());
            if voidness(&returned).is_some_and(|v| v != pass_is_void) {
                state.reject(i);
            }
        }
    }

    /// Drop a callee when another is more specific and every argument that
    /// tells them apart already has a type, so any later finding that rules
    /// out the specific one would rule out both.
    fn reject_less_specific(&mut self, call: &CallConstraint, state: &mut CallState) {
        let n = call.callees.len();
        'outer: for i in 0..n {
            if !state.is_possible(i) {
                continue;
            }
            for j in i + 1..n {
                if !state.is_possible(j) {
                    continue;
                }
                let Some(specificity) = self
                    .ctx
                    .overload_specificity(&call.callees[i].sig, &call.callees[j].sig)
                else {
                    continue;
                };
                let decided = specificity
                    .distinguishing_argument_indices
                    .iter()
                    .all(|&k| call.args.get(k).is_some_and(|a| self.is_var_chosen(a)));
                if !decided {
                    continue;
                }
                match specificity.more_specific {
                    Side::Left => state.reject(j),
                    Side::Right => {
                        state.reject(i);
                        continue 'outer;
                    }
                }
            }
        }
    }

    /// Propagate bounds shared by every remaining candidate.
    ///
    /// Type formals are matched up positionally while their variances agree
    /// and replaced by shared per-call variables. Inputs then get the least
    /// common supertype of the candidates' formals as an upper bound, and the
    /// result gets the greatest common subtype of their pass types as a lower
    /// bound. Types mentioning formals that could not be shared are skipped.
    fn worst_case_analysis(&mut self, call: &CallConstraint, state: &mut CallState) {
        let ctx = Arc::clone(&self.ctx);
        let store = ctx.store();
        let possible = state.possible();
        let Some(&first) = possible.first() else {
            return;
        };
        let sig0 = Arc::clone(&call.callees[first].sig);
        let mut min_arity = sig0.type_formals.len();
        let mut max_arity = min_arity;
        for &i in &possible {
            let formals = &call.callees[i].sig.type_formals;
            min_arity = min_arity.min(formals.len());
            max_arity = max_arity.max(formals.len());
            while min_arity > 0 {
                let last = min_arity - 1;
                if store.variance(formals[last]) == store.variance(sig0.type_formals[last]) {
                    break;
                }
                min_arity -= 1;
            }
        }

        state.ensure_type_parameter_vars(min_arity, &mut self.namer);
        let vars = state.type_parameter_vars.clone();
        for (v, t) in vars.iter().zip(call.explicit_type_args.iter().flatten()) {
            self.same_as(TypeBoundary::from(v.to_ref()), TypeBoundary::from(t.clone()));
        }

        let candidates: Vec<PossibleCallee> = possible
            .iter()
            .map(|&index| {
                let sig = Arc::clone(&call.callees[index].sig);
                let bindings = sig
                    .type_formals
                    .iter()
                    .enumerate()
                    .map(|(i, &f)| (f, (i < min_arity).then(|| vars[i].to_ref())))
                    .collect();
                PossibleCallee { index, sig, bindings }
            })
            .collect();

        'inputs: for (actual_index, arg) in call.args.iter().enumerate() {
            let mut uppers: IndexSet<TypeLike> = IndexSet::new();
            for c in &candidates {
                let Some(formal) = state
                    .order(c.index)
                    .and_then(|order| corresponding_formal(actual_index, order))
                    .and_then(|fi| c.sig.value_formal_for_actual(fi))
                else {
                    continue 'inputs;
                };
                let Some(t) = contextualize_worst_case(&formal.ty, &c.bindings) else {
                    continue 'inputs;
                };
                uppers.insert(t);
            }
            let optimism = self.config.worst_case_optimism;
            let common = reduce_bounds(uppers, |ts| {
                let supers = ctx.least_common_super_partial_types(&ts, optimism);
                if supers.len() == 1 { supers.into_iter().next() } else { None }
            });
            match common {
                Some(TypeLike::Var(r)) => {
                    self.assignable(TypeBoundary::from(r), TypeBoundary::Var(arg.clone()));
                }
                Some(TypeLike::Type(t)) if t == Type::simple(DefId::ANY_VALUE) => {}
                Some(t) => {
                    let arg_id = self.type_node(&TypeBoundary::Var(arg.clone()));
                    self.add_bound(t, arg_id, BoundKind::Upper);
                }
                None => {}
            }
        }

        let pass_lowers = candidates
            .iter()
            .map(|c| {
                let returned = &c.sig.return_type;
                let pass = if !returned.is_param() && returned.definition() == DefId::RESULT {
                    returned.bindings().first()?
                } else {
                    returned
                };
                contextualize_worst_case(pass, &c.bindings)
            })
            .collect::<Option<IndexSet<TypeLike>>>();
        if let Some(pass_lowers) = pass_lowers {
            let common = reduce_bounds(pass_lowers, |ts| {
                let mut it = ts.into_iter();
                let mut glb = it.next();
                for t in it {
                    glb = glb.and_then(|g| ctx.glb_partial(&g, &t));
                    if glb.is_none() {
                        break;
                    }
                }
                glb
            });
            match common {
                Some(TypeLike::Var(r)) => {
                    self.assignable(TypeBoundary::Var(call.call_pass.clone()), TypeBoundary::from(r));
                }
                Some(t) => {
                    let pass_id = self.type_node(&TypeBoundary::Var(call.call_pass.clone()));
                    self.add_bound(t, pass_id, BoundKind::Lower);
                }
                None => {}
            }
        }

        if let Some(fail) = &call.call_fail {
            let fail_id = self.node_id(&Solvable::Simple(fail.clone()));
            let none_fail = candidates.iter().all(|c| {
                c.sig.return_type.is_param() || c.sig.return_type.definition() != DefId::RESULT
            });
            if none_fail && !self.nodes[fail_id].is_chosen() {
                self.choose(fail_id, Solution::TypeList(Vec::new()));
            }
        }
        if let Some(actuals) = &call.type_actuals {
            if min_arity == max_arity {
                let actuals_id = self.node_id(&Solvable::Simple(actuals.clone()));
                if max_arity == 0 {
                    self.choose(actuals_id, Solution::TypeList(Vec::new()));
                } else {
                    let parts = vars[..max_arity]
                        .iter()
                        .map(|v| TypeBoundary::from(v.to_ref()))
                        .collect();
                    self.add_constraint(Constraint::put(actuals.clone(), parts));
                }
            }
        }
    }

    /// Tie the chosen callee's signature to the call:
    ///
    /// 1. each type parameter variable is below its formal's bounds, and the
    ///    type actuals are the list of those variables;
    /// 2. explicit type arguments fix their variables;
    /// 3. each argument is its formal's type;
    /// 4. the pass result is the return type, or the first binding of a
    ///    `Result` return with the rest as failure modes.
    fn apply_chosen_callee(&mut self, call: &CallConstraint, state: &mut CallState, choice: &Solution) {
        let Solution::Int(chosen) = *choice else {
            for s in [
                Some(Solvable::from(call.call_pass.clone())),
                call.call_fail.clone().map(Solvable::Simple),
                call.type_actuals.clone().map(Solvable::Simple),
            ]
            .into_iter()
            .flatten()
            {
                let id = self.node_id(&s);
                self.choose(id, Solution::Unsolvable);
            }
            return;
        };
        let sig = Arc::clone(&call.callees[chosen].sig);
        let store = self.ctx.store_arc();
        state.ensure_type_parameter_vars(sig.type_formals.len(), &mut self.namer);
        let vars = state.type_parameter_vars.clone();
        let formal_refs: FxHashMap<DefId, TypeLike> = sig
            .type_formals
            .iter()
            .zip(&vars)
            .map(|(&f, v)| (f, TypeLike::Var(v.to_ref())))
            .collect();
        let no_vars = FxHashMap::default();
        let contextualize = |t: &TypeLike| -> TypeLike {
            if formal_refs.is_empty() {
                return t.clone();
            }
            map_type_like(
                t,
                &mut MapLookup {
                    vars: &no_vars,
                    formals: &formal_refs,
                },
            )
        };
        trace!(callee = chosen, type_parameters = vars.len(), "instantiating callee");

        for (&f, v) in sig.type_formals.iter().zip(&vars) {
            for bound in store.upper_bounds(f) {
                let bound = contextualize(&TypeLike::Type(bound));
                self.add_constraint(Constraint::sub_type(v.to_ref(), TypeBoundary::Like(bound)));
            }
        }
        if let Some(actuals) = &call.type_actuals {
            let n = sig.type_formals.len();
            if n == 0 {
                let id = self.node_id(&Solvable::Simple(actuals.clone()));
                self.choose(id, Solution::TypeList(Vec::new()));
            } else {
                let parts = vars[..n].iter().map(|v| TypeBoundary::from(v.to_ref())).collect();
                self.add_constraint(Constraint::put(actuals.clone(), parts));
            }
        }

        for (v, t) in vars.iter().zip(call.explicit_type_args.iter().flatten()) {
            self.same_as(TypeBoundary::from(v.to_ref()), TypeBoundary::from(t.clone()));
        }

        if let Some(order) = state.order(chosen) {
            for (arg_index, arg) in call.args.iter().enumerate() {
                let Some(formal) =
                    corresponding_formal(arg_index, order).and_then(|fi| sig.value_formal_for_actual(fi))
                else {
                    break;
                };
                let formal_type = contextualize(&TypeLike::Type(formal.ty));
                self.add_constraint(Constraint::same_type(arg.to_ref(), TypeBoundary::Like(formal_type)));
            }
        }

        let returned = contextualize(&TypeLike::Type(sig.return_type.clone()));
        let pass_ref = TypeBoundary::from(call.call_pass.to_ref());
        if !returned.is_param() && returned.definition() == Some(DefId::RESULT) {
            let bindings = returned.bindings();
            if let Some((pass, fails)) = bindings.split_first() {
                self.add_constraint(Constraint::same_type(pass_ref, TypeBoundary::Like(pass.clone())));
                if let Some(fail) = &call.call_fail {
                    let parts = fails.iter().cloned().map(TypeBoundary::Like).collect();
                    self.add_constraint(Constraint::put(fail.clone(), parts));
                }
            } else {
                let pass_id = self.type_node(&TypeBoundary::Var(call.call_pass.clone()));
                self.choose(pass_id, Solution::Unsolvable);
                if let Some(fail) = &call.call_fail {
                    let id = self.node_id(&Solvable::Simple(fail.clone()));
                    self.choose(id, Solution::Unsolvable);
                }
            }
        } else {
            self.add_constraint(Constraint::same_type(pass_ref, TypeBoundary::Like(returned)));
            if let Some(fail) = &call.call_fail {
                let id = self.node_id(&Solvable::Simple(fail.clone()));
                self.choose(id, Solution::TypeList(Vec::new()));
            }
        }
    }
}

/// `Some(true)` for `Void`, `Some(false)` for any other shape, looking
/// through a `Result` pass type and a `Never` wrapper; `None` when unknown.
fn voidness(t: &TypeLike) -> Option<bool> {
    let unwrap = |t: TypeLike, d: DefId| {
        if !t.is_param() && t.definition() == Some(d) {
            t.binding(0)
        } else {
            Some(t)
        }
    };
    let t = unwrap(t.clone(), DefId::RESULT)?;
    let t = unwrap(t, DefId::NEVER)?;
    t.is_type_or_partial()
        .then(|| !t.is_param() && t.definition() == Some(DefId::VOID))
}

/// Substitute shared variables for a candidate's formals; `None` if `ty`
/// mentions a formal that has no shared variable.
fn contextualize_worst_case(ty: &Type, bindings: &FxHashMap<DefId, Option<TypeVarRef>>) -> Option<TypeLike> {
    if bindings.is_empty() {
        return Some(TypeLike::Type(ty.clone()));
    }
    let mut unmapped = false;
    let mapped = map_type_with(
        ty,
        &mut FormalFn(|f: DefId| match bindings.get(&f) {
            Some(Some(r)) => Some(TypeLike::Var(r.clone())),
            Some(None) => {
                unmapped = true;
                None
            }
            None => None,
        }),
    );
    (!unmapped).then_some(mapped)
}

/// A sole bound as is; otherwise `reduce` over them unless one is a variable.
fn reduce_bounds(
    bounds: IndexSet<TypeLike>,
    reduce: impl FnOnce(Vec<TypeLike>) -> Option<TypeLike>,
) -> Option<TypeLike> {
    if bounds.len() == 1 {
        return bounds.into_iter().next();
    }
    if bounds.iter().any(|b| !b.is_type_or_partial()) {
        return None;
    }
    reduce(bounds.into_iter().collect())
}
