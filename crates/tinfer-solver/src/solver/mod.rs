//! The constraint solver.
//!
//! Nodes are `Solvable`s; constraints are edges between them. Each round
//! re-processes the dirty constraints, which move bound information between
//! their nodes, and each node is re-checked before and after. A node whose
//! bounds pin it down is chosen. When a round makes no progress but some
//! nodes have enough full bounds to pick from, the solver forces a choice
//! among them, preferring common bounds, then lower, then upper. Whatever is
//! still open when nothing moves is marked unsolvable.
//!
//! ```text
//! let mut solver = TypeSolver::new(ctx, SolverConfig::default());
//! let x = solver.unused_type_var("x");
//! solver.assignable(x.clone().into(), Type::simple(DefId::STRING).into());
//! solver.solve()?;
//! assert_eq!(solver.type_solution(&x), Some(TypeSolution::Type(string)));
//! ```

mod call;
mod check;
mod force;
mod node;

use crate::bounds::BoundKind;
use crate::config::SolverConfig;
use crate::constraint::{CallConstraint, Constraint};
use crate::context::TypeContext;
use crate::def::DefId;
use crate::mapper::{MapLookup, map_type_like};
use crate::types::{
    Nullity, PartialType, Render, SimpleVar, Solution, Solvable, SolverVar, SolverVarNamer, Type,
    TypeBoundary, TypeLike, TypeSolution, TypeVar, TypeVarRef, Value, ValueBound,
};
use call::CallState;
use indexmap::{IndexMap, IndexSet};
use node::{ConstraintId, Node, NodeId};
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, debug_span, info_span, trace, warn};

/// A failure that leaves the solver's state meaningless.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolverError {
    /// A partial-type node was about to be chosen as a type of a different
    /// definition.
    InconsistentChoice { node: String, choice: String },
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverError::InconsistentChoice { node, choice } => {
                write!(f, "cannot choose {choice} for {node}")
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// One inference session.
pub struct TypeSolver {
    ctx: Arc<TypeContext>,
    config: SolverConfig,
    namer: SolverVarNamer,
    nodes: IndexMap<Solvable, Node, FxBuildHasher>,
    constraints: IndexSet<Arc<Constraint>, FxBuildHasher>,
    dirty: IndexSet<ConstraintId, FxBuildHasher>,
    /// Bounds added this round; constraints adjacent to nodes keyed by them
    /// are re-checked next round.
    bounds_changed: IndexSet<TypeBoundary, FxBuildHasher>,
    /// Nodes with full bounds that could be chosen if nothing better comes.
    satisfied: IndexSet<NodeId, FxBuildHasher>,
    call_states: FxHashMap<ConstraintId, CallState>,
    bivariants_solved: FxHashSet<ConstraintId>,
    progress: bool,
    stamp: u64,
    fatal: Option<SolverError>,
}

impl TypeSolver {
    pub fn new(ctx: Arc<TypeContext>, config: SolverConfig) -> Self {
        Self {
            ctx,
            config,
            namer: SolverVarNamer::new(),
            nodes: IndexMap::default(),
            constraints: IndexSet::default(),
            dirty: IndexSet::default(),
            bounds_changed: IndexSet::default(),
            satisfied: IndexSet::default(),
            call_states: FxHashMap::default(),
            bivariants_solved: FxHashSet::default(),
            progress: false,
            stamp: 0,
            fatal: None,
        }
    }

    /// Continue naming variables where `namer` left off.
    #[must_use]
    pub fn with_namer(mut self, namer: SolverVarNamer) -> Self {
        self.namer = namer;
        self
    }

    pub fn context(&self) -> &Arc<TypeContext> {
        &self.ctx
    }

    // =========================================================================
    // Setting up constraints
    // =========================================================================

    /// A value of type `right` may be stored where `left` is expected.
    pub fn assignable(&mut self, left: TypeBoundary, right: TypeBoundary) {
        self.add_constraint(Constraint::SubType { sub: right, sup: left });
    }

    pub fn same_as(&mut self, a: TypeBoundary, b: TypeBoundary) {
        self.add_constraint(Constraint::SameType { a, b });
    }

    /// One of `a` and `b` is a subtype of the other.
    pub fn relates_to(&mut self, a: TypeBoundary, b: TypeBoundary) {
        self.add_constraint(Constraint::Bivariant { a, b });
    }

    pub fn called(&mut self, call: CallConstraint) {
        self.add_constraint(Constraint::Call(Box::new(call)));
    }

    /// Adding a constraint twice, or a uses constraint with no variables, has
    /// no effect.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        if self.constraints.contains(&constraint) {
            return;
        }
        if let Constraint::Uses { type_vars, .. } = &constraint {
            if type_vars.is_empty() {
                return;
            }
        }
        trace!(constraint = %constraint.display(self.ctx.store()), "adding constraint");
        let bounds = constraint.bounds();
        let (id, _) = self.constraints.insert_full(Arc::new(constraint));
        self.dirty.insert(id);
        for bound in bounds {
            let node_id = self.node_id(&bound);
            let node = &mut self.nodes[node_id];
            if !node.is_chosen() {
                node.adjacent.insert(id);
            }
            if let Solvable::Boundary(TypeBoundary::Like(t)) = bound {
                self.add_constraint(Constraint::uses(t));
            }
        }
    }

    pub fn unused_type_var(&mut self, hint: &str) -> TypeVar {
        self.namer.unused_type_var(hint)
    }

    pub fn unused_simple_var(&mut self, hint: &str) -> SimpleVar {
        self.namer.unused_simple_var(hint)
    }

    pub fn value_bound(&mut self, value: Value) -> ValueBound {
        self.namer.value_bound(value)
    }

    // =========================================================================
    // Reading solutions
    // =========================================================================

    pub fn get(&self, key: &Solvable) -> Option<&Solution> {
        self.nodes.get(key).and_then(|n| n.choice.as_ref())
    }

    pub fn type_solution(&self, v: &TypeVar) -> Option<TypeSolution> {
        self.get(&Solvable::from(v.clone()))
            .and_then(Solution::as_type_solution)
    }

    pub fn simple_solution(&self, v: &SimpleVar) -> Option<&Solution> {
        self.get(&Solvable::Simple(v.clone()))
    }

    /// Every solved variable, for debugging.
    pub fn all_solutions(&self) -> IndexMap<SolverVar, Solution> {
        self.nodes
            .iter()
            .filter_map(|(k, n)| {
                let var = match k {
                    Solvable::Boundary(TypeBoundary::Var(v)) => SolverVar::Type(v.clone()),
                    Solvable::Simple(v) => SolverVar::Simple(v.clone()),
                    Solvable::Boundary(_) => return None,
                };
                n.choice.clone().map(|c| (var, c))
            })
            .collect()
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.constraints.iter().map(|c| &**c)
    }

    // =========================================================================
    // Solving
    // =========================================================================

    pub fn solve(&mut self) -> Result<(), SolverError> {
        let _span = info_span!(
            "solve",
            constraints = self.constraints.len(),
            nodes = self.nodes.len()
        )
        .entered();

        let mut round = 0;
        loop {
            if round >= self.config.max_rounds {
                warn!(round, "round limit reached, giving up on open nodes");
                break;
            }
            round += 1;
            self.progress = false;
            self.run_round(round);
            if !self.progress && !self.satisfied.is_empty() {
                self.force_choice();
            }
            if let Some(err) = self.fatal.take() {
                return Err(err);
            }
            if !self.progress {
                break;
            }
            let changed = std::mem::take(&mut self.bounds_changed);
            for bound in changed {
                if let Some(id) = self.lookup(&Solvable::Boundary(bound)) {
                    let node = &self.nodes[id];
                    self.dirty.extend(node.adjacent.iter().copied());
                }
            }
        }

        for id in 0..self.nodes.len() {
            if !self.nodes[id].is_chosen() {
                trace!(node = %self.nodes[id].key.display(self.ctx.store()), "unsolvable");
                self.choose(id, Solution::Unsolvable);
            }
        }
        if self.config.dump_rounds {
            self.dump();
        }
        debug!(rounds = round, nodes = self.nodes.len(), "solved");
        Ok(())
    }

    fn run_round(&mut self, round: u32) {
        let _span = debug_span!("round", round, dirty = self.dirty.len()).entered();
        if self.config.dump_rounds {
            self.dump();
        }
        let dirty: Vec<ConstraintId> = std::mem::take(&mut self.dirty).into_iter().collect();
        for id in dirty {
            if self.fatal.is_some() {
                return;
            }
            let constraint = Arc::clone(&self.constraints[id]);
            trace!(constraint = %constraint.display(self.ctx.store()), "processing");
            let bounds = constraint.bounds();
            self.check_bounds(&bounds);
            match &*constraint {
                Constraint::SubType { sub, sup } => self.process_type_constraint(sub, sup, false),
                Constraint::SameType { a, b } => self.process_type_constraint(a, b, true),
                Constraint::Bivariant { a, b } => self.process_bivariant(id, a, b),
                Constraint::Uses {
                    type_like,
                    type_vars,
                } => self.process_uses(type_like, type_vars),
                Constraint::Call(call) => self.process_call(id, call),
                Constraint::Put { receiver, parts } => self.process_put(receiver, parts),
            }
            self.check_bounds(&bounds);
        }
        trace!(progress = self.progress, "round done");
    }

    fn check_bounds(&mut self, bounds: &[Solvable]) {
        for b in bounds {
            if matches!(b, Solvable::Boundary(_)) {
                let id = self.node_id(b);
                self.check_node(id);
            }
        }
    }

    fn dump(&self) {
        let store = self.ctx.store();
        for node in self.nodes.values() {
            trace!(target: "tinfer_solver::dump", "{}", node.describe(store));
        }
        for (i, c) in self.constraints.iter().enumerate() {
            let mark = if self.dirty.contains(&i) { "*" } else { "" };
            trace!(target: "tinfer_solver::dump", "{mark}{}", c.display(store));
        }
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    fn node_id(&mut self, key: &Solvable) -> NodeId {
        if let Some(id) = self.nodes.get_index_of(key) {
            return id;
        }
        let (id, _) = self.nodes.insert_full(key.clone(), Node::new(key.clone()));
        id
    }

    fn type_node(&mut self, b: &TypeBoundary) -> NodeId {
        self.node_id(&Solvable::Boundary(b.clone()))
    }

    fn lookup(&self, key: &Solvable) -> Option<NodeId> {
        self.nodes.get_index_of(key)
    }

    fn next_stamp(&mut self) -> u64 {
        self.stamp += 1;
        self.stamp
    }

    /// Commit a node. Choosing an already chosen node does nothing.
    fn choose(&mut self, id: NodeId, choice: Solution) {
        let node = &self.nodes[id];
        if node.is_chosen() {
            return;
        }
        let promoted = match (node.boundary(), &choice) {
            (Some(TypeBoundary::Like(TypeLike::Partial(p))), Solution::Type(t)) => {
                if p.definition() != t.definition() {
                    let store = self.ctx.store();
                    self.fatal = Some(SolverError::InconsistentChoice {
                        node: node.key.display(store).to_string(),
                        choice: choice.display(store).to_string(),
                    });
                    return;
                }
                Some((p.clone(), t.clone()))
            }
            _ => None,
        };
        trace!(
            node = %node.key.display(self.ctx.store()),
            choice = %choice.display(self.ctx.store()),
            "choosing"
        );
        self.nodes[id].choice = Some(choice);
        if let Some((partial, full)) = promoted {
            self.promote_partial(id, &partial, &full);
        }
        let stamp = self.next_stamp();
        let node = &mut self.nodes[id];
        node.solved_at_stamp = stamp;
        let adjacent = std::mem::take(&mut node.adjacent);
        self.dirty.extend(adjacent);
        self.satisfied.shift_remove(&id);
        self.progress = true;
    }

    /// Nodes next to a newly solved partial type that hold it as a bound get
    /// the full type instead.
    fn promote_partial(&mut self, id: NodeId, partial: &PartialType, full: &Type) {
        let mut targets: IndexSet<NodeId> = IndexSet::new();
        for &c in &self.nodes[id].adjacent {
            for b in self.constraints[c].bounds() {
                if let Some(bid) = self.lookup(&b) {
                    let n = &self.nodes[bid];
                    if n.is_type_node() && !n.is_chosen() {
                        targets.insert(bid);
                    }
                }
            }
        }
        for target in targets {
            if let Some(kind) = self.nodes[target].partial.kind_of(partial) {
                self.add_full_bound(full.clone(), target, kind);
                self.nodes[target].partial.obviate(partial, kind);
                trace!(kind = ?kind, "promoted partial bound");
            }
        }
    }

    // =========================================================================
    // Bounds
    // =========================================================================

    /// Variable references are never stored as bounds.
    fn add_bound(&mut self, bound: TypeLike, to: NodeId, kind: BoundKind) -> bool {
        match bound {
            TypeLike::Type(t) => self.add_full_bound(t, to, kind),
            TypeLike::Partial(p) => self.add_partial_bound(p, to, kind),
            TypeLike::Var(_) => false,
        }
    }

    fn add_full_bound(&mut self, bound: Type, to: NodeId, kind: BoundKind) -> bool {
        if bound.definition() == DefId::INVALID {
            return false;
        }
        if !self.nodes[to].full.add(bound.clone(), kind) {
            return false;
        }
        self.bound_added(to, TypeBoundary::from(bound), false, kind);
        self.satisfied.insert(to);
        true
    }

    fn add_partial_bound(&mut self, bound: PartialType, to: NodeId, kind: BoundKind) -> bool {
        if !self.nodes[to].partial.add(bound.clone(), kind) {
            return false;
        }
        let as_boundary = TypeBoundary::Like(TypeLike::Partial(bound.clone()));
        self.bound_added(to, as_boundary.clone(), true, kind);
        let node = &self.nodes[to];
        let Some(key) = node.boundary().cloned() else {
            return true;
        };
        if key != as_boundary {
            // Completing the partial bound must re-check this node.
            let link = match node.partial.kind_of(&bound) {
                Some(BoundKind::Common) => Some(Constraint::same_type(key, as_boundary)),
                Some(BoundKind::Lower) => Some(Constraint::sub_type(as_boundary, key)),
                Some(BoundKind::Upper) => Some(Constraint::sub_type(key, as_boundary)),
                None => None,
            };
            if let Some(c) = link {
                self.add_constraint(c);
            }
        }
        true
    }

    fn bound_added(&mut self, to: NodeId, bound: TypeBoundary, partial: bool, kind: BoundKind) {
        trace!(
            node = %self.nodes[to].key.display(self.ctx.store()),
            bound = %bound.display(self.ctx.store()),
            kind = ?kind,
            "added bound"
        );
        self.progress = true;
        self.bounds_changed.insert(bound);
        let stamp = self.next_stamp();
        let node = &mut self.nodes[to];
        if partial {
            node.partial.touch(stamp);
        } else {
            node.full.touch(stamp);
        }
        self.dirty.extend(node.adjacent.iter().copied());
    }

    /// Copy every bound of `from` to `to` under the same kind.
    fn copy_bounds(&mut self, from: NodeId, to: NodeId) {
        for (b, k) in self.nodes[from].bounds_by_kind() {
            self.add_bound(b, to, k);
        }
    }

    /// Copy `from`'s bounds, except those of kind `skip`, to `to` as `to_kind`.
    fn copy_bounds_as(&mut self, from: NodeId, to: NodeId, to_kind: BoundKind, skip: BoundKind) {
        for (b, k) in self.nodes[from].bounds_vec() {
            if k != skip {
                self.add_bound(b, to, to_kind);
            }
        }
    }

    // =========================================================================
    // Constraint processing
    // =========================================================================

    /// `sub <: sup`, or `sub == sup` when `bidirectional`.
    fn process_type_constraint(&mut self, sub: &TypeBoundary, sup: &TypeBoundary, bidirectional: bool) {
        let sub_id = self.type_node(sub);
        let sup_id = self.type_node(sup);
        if self.nodes[sub_id].is_chosen() && self.nodes[sup_id].is_chosen() {
            return;
        }
        let sub_choice = self.nodes[sub_id].type_choice().cloned();
        let sup_choice = self.nodes[sup_id].type_choice().cloned();

        if sup_choice.is_none() {
            if let Some(t) = &sub_choice {
                let kind = if bidirectional { BoundKind::Common } else { BoundKind::Lower };
                self.add_full_bound(t.clone(), sup_id, kind);
            } else if bidirectional {
                self.copy_bounds(sub_id, sup_id);
            } else {
                self.copy_bounds_as(sub_id, sup_id, BoundKind::Lower, BoundKind::Upper);
            }
        }
        if sub_choice.is_none() {
            if let Some(t) = &sup_choice {
                let kind = if bidirectional { BoundKind::Common } else { BoundKind::Upper };
                self.add_full_bound(t.clone(), sub_id, kind);
            } else if bidirectional {
                self.copy_bounds(sup_id, sub_id);
            } else {
                self.copy_bounds_as(sup_id, sub_id, BoundKind::Upper, BoundKind::Lower);
            }
        }
    }

    /// Turn `a ~: b` into a subtype constraint once the shapes bounding the two
    /// sides show which way the relationship runs.
    fn process_bivariant(&mut self, id: ConstraintId, a: &TypeBoundary, b: &TypeBoundary) {
        if self.bivariants_solved.contains(&id) {
            return;
        }
        let a_id = self.type_node(a);
        let b_id = self.type_node(b);
        if self.nodes[a_id].is_chosen() && self.nodes[b_id].is_chosen() {
            return;
        }
        let (a_lo, a_hi) = self.bounding_shapes(a_id);
        let (b_lo, b_hi) = self.bounding_shapes(b_id);
        let reaches = |lo: &IndexSet<DefId>, hi: &IndexSet<DefId>| {
            lo.iter()
                .any(|&d| hi.iter().any(|&c| self.ctx.extends_path(d, c).is_some()))
        };
        let a_sub_b = reaches(&a_lo, &b_hi);
        let b_sub_a = reaches(&b_lo, &a_hi);
        let resolved = match (a_sub_b, b_sub_a) {
            (true, true) => Constraint::same_type(a.clone(), b.clone()),
            (true, false) => Constraint::sub_type(a.clone(), b.clone()),
            (false, true) => Constraint::sub_type(b.clone(), a.clone()),
            (false, false) => return,
        };
        self.add_constraint(resolved);
        self.bivariants_solved.insert(id);
    }

    /// Shapes at or below a node, and shapes at or above it.
    fn bounding_shapes(&self, id: NodeId) -> (IndexSet<DefId>, IndexSet<DefId>) {
        let store = self.ctx.store();
        let mut lower_and_common = IndexSet::new();
        let mut common_and_upper = IndexSet::new();
        let node = &self.nodes[id];
        if let Some(choice) = node.type_choice() {
            if choice.is_param() {
                shapes_above_formal(store, choice.definition(), &mut common_and_upper, &mut FxHashSet::default());
            } else {
                lower_and_common.insert(choice.definition());
                common_and_upper.insert(choice.definition());
            }
            return (lower_and_common, common_and_upper);
        }
        let partials = node.partial.iter().map(|(p, k)| (p.definition(), false, k));
        let fulls = node.full.iter().map(|(t, k)| (t.definition(), t.is_param(), k));
        for (d, is_formal, kind) in partials.chain(fulls) {
            if is_formal {
                if kind != BoundKind::Lower {
                    shapes_above_formal(store, d, &mut common_and_upper, &mut FxHashSet::default());
                }
                continue;
            }
            if kind != BoundKind::Lower {
                common_and_upper.insert(d);
            }
            if kind != BoundKind::Upper {
                lower_and_common.insert(d);
            }
        }
        (lower_and_common, common_and_upper)
    }

    /// Solve a type-like once every variable it mentions is solved.
    fn process_uses(&mut self, type_like: &TypeLike, type_vars: &[TypeVar]) {
        if let TypeLike::Var(r) = type_like {
            self.process_var_ref(r);
            return;
        }
        let id = self.type_node(&TypeBoundary::Like(type_like.clone()));
        if self.nodes[id].is_chosen() {
            return;
        }
        let mut bindings: FxHashMap<TypeVar, TypeLike> = FxHashMap::default();
        for v in type_vars {
            let var_id = self.type_node(&TypeBoundary::Var(v.clone()));
            let Some(t) = self.nodes[var_id].type_choice() else {
                return;
            };
            bindings.insert(v.clone(), TypeLike::Type(t.clone()));
        }
        if bindings.is_empty() {
            return;
        }
        let no_formals = FxHashMap::default();
        let mut lookup = MapLookup {
            vars: &bindings,
            formals: &no_formals,
        };
        match map_type_like(type_like, &mut lookup) {
            TypeLike::Type(t) => self.choose(id, Solution::Type(t)),
            TypeLike::Partial(p) => {
                self.add_partial_bound(p, id, BoundKind::Common);
            }
            TypeLike::Var(_) => {}
        }
    }

    /// Keep `v` and `v?` (or `v!`) in step.
    fn process_var_ref(&mut self, r: &TypeVarRef) {
        let var_id = self.type_node(&TypeBoundary::Var(r.var.clone()));
        let ref_id = self.type_node(&TypeBoundary::Like(TypeLike::Var(r.clone())));
        let var_choice = self.nodes[var_id].choice.clone();
        let ref_choice = self.nodes[ref_id].choice.clone();
        match (var_choice, ref_choice) {
            (Some(_), Some(_)) => {}
            (Some(var_choice), None) => {
                let choice = match var_choice {
                    Solution::Type(t) if r.nullity.is_nullable() => Solution::Type(t.or_null()),
                    Solution::Type(t) => Solution::Type(t),
                    _ => Solution::Unsolvable,
                };
                self.choose(ref_id, choice);
            }
            (None, Some(ref_choice)) => match (r.nullity, ref_choice) {
                (Nullity::NonNull, choice) => self.choose(var_id, choice),
                (Nullity::OrNull, Solution::Type(t)) => {
                    // v! <: v <: v?
                    self.add_full_bound(t.clone(), var_id, BoundKind::Upper);
                    let non_null = t.non_null();
                    if !self.ctx.admits_null(&TypeLike::Type(non_null.clone())) {
                        self.add_full_bound(non_null, var_id, BoundKind::Lower);
                    }
                }
                (Nullity::OrNull, _) => self.choose(var_id, Solution::Unsolvable),
            },
            (None, None) => match r.nullity {
                Nullity::NonNull => {
                    self.copy_bounds(var_id, ref_id);
                    self.copy_bounds(ref_id, var_id);
                }
                Nullity::OrNull => {
                    for (b, k) in self.nodes[var_id].bounds_vec() {
                        self.add_bound(b.with_nullity(Nullity::OrNull), ref_id, k);
                    }
                    let held = &self.nodes[var_id];
                    let incoming: Vec<(TypeLike, BoundKind)> = self.nodes[ref_id]
                        .bounds_vec()
                        .into_iter()
                        .filter(|(b, k)| held.kind_of(b) != Some(*k))
                        .collect();
                    for (b, k) in incoming {
                        if k != BoundKind::Lower {
                            self.add_bound(b.with_nullity(Nullity::OrNull), var_id, BoundKind::Upper);
                        }
                        if k != BoundKind::Upper {
                            self.add_bound(b.non_null(), var_id, BoundKind::Lower);
                        }
                    }
                }
            },
        }
    }

    fn process_put(&mut self, receiver: &SimpleVar, parts: &[TypeBoundary]) {
        let out = self.node_id(&Solvable::Simple(receiver.clone()));
        if self.nodes[out].is_chosen() {
            return;
        }
        let mut solutions = Vec::with_capacity(parts.len());
        for part in parts {
            let id = self.type_node(part);
            match self.nodes[id].choice.as_ref().and_then(Solution::as_type_solution) {
                Some(s) => solutions.push(s),
                None => return,
            }
        }
        self.choose(out, Solution::TypeList(solutions));
    }
}

/// Shapes among the transitive upper bounds of a formal.
fn shapes_above_formal(
    store: &crate::def::DefinitionStore,
    formal: DefId,
    out: &mut IndexSet<DefId>,
    visited: &mut FxHashSet<DefId>,
) {
    if !visited.insert(formal) {
        return;
    }
    for b in store.upper_bounds(formal) {
        if b.is_param() {
            shapes_above_formal(store, b.definition(), out, visited);
        } else {
            out.insert(b.definition());
        }
    }
}

/// `a <: b` for `Upper`, `b <: a` for `Lower`, `a == b` for `Common`.
fn type_constraint_for(a: TypeBoundary, b: TypeBoundary, kind: BoundKind) -> Constraint {
    match kind {
        BoundKind::Upper => Constraint::sub_type(a, b),
        BoundKind::Lower => Constraint::sub_type(b, a),
        BoundKind::Common => Constraint::same_type(a, b),
    }
}

#[cfg(test)]
#[path = "../../tests/solver_tests.rs"]
mod tests;
