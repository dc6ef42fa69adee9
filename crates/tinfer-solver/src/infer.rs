//! Batch inference over call sites.
//!
//! [`infer_bounds`] turns every [`CallDescriptor`] into solver variables and
//! constraints, solves them all in one session, and writes the outcome back
//! into the descriptors:
//!
//! | Output | Meaning |
//! |--------|---------|
//! | `chosen_callee` | index into `callees`, or `None` on any problem |
//! | `result_type` | the pass type, as `Result<Pass, Bubble>` for a `Result` return |
//! | `bindings` | the chosen callee's type formals and their actuals |
//! | `application_order` | how the inputs pair with the chosen callee's formals |
//! | `explanations` | diagnostics, also sent to the log sink |
//!
//! Calls feed each other through shared pass variables: give the inner call a
//! `pass_var` and use `InputBound::CallPass` with the same variable in the
//! outer call.

use crate::application_order::{ActualArg, application_order_for_actuals, corresponding_formal};
use crate::config::SolverConfig;
use crate::constraint::{CallConstraint, Constraint};
use crate::context::TypeContext;
use crate::def::DefId;
use crate::mapper::{map_signature, map_type};
use crate::signature::{Callee, Signature};
use crate::solver::{SolverError, TypeSolver};
use crate::types::{
    Nullity, PartialType, Render, SimpleVar, Solution, SolverVarNamer, Type, TypeBoundary, TypeLike,
    TypeSolution, TypeVar, Value,
};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tinfer_common::{Diagnostic, DiagnosticArg, LogSink, MessageTemplate, Position};
use tracing::{debug, info_span};

/// What is known about one input before solving.
#[derive(Clone, Debug)]
pub enum InputBound {
    /// Already typed.
    Pretyped(Type),
    /// Nothing is known; the input counts as `Invalid` in diagnostics.
    Typeless,
    /// The pass variable of another call in the same batch.
    CallPass(TypeVar),
    /// A literal whose type is derived from the value. `type_var` is equated
    /// with the value's type.
    Value { value: Value, type_var: TypeVar },
    /// A type operand of `as` or `is` that may omit some generic arguments,
    /// as in `x as List`.
    IncompleteReification {
        reified: Type,
        /// Which of the callee's type formals the operand stands for.
        type_arg_index: usize,
        type_arg_var: TypeVar,
        /// The input whose value the operand describes, for the `x` in
        /// `x as List`.
        described_value_argument_index: Option<usize>,
    },
}

/// One input of a call.
#[derive(Clone, Debug)]
pub struct CallInput {
    pub bound: InputBound,
    pub position: Position,
    /// How the input is written; used to pair inputs with formals.
    pub actual: ActualArg,
    /// For value inputs, the type the value solved to.
    pub value_solved_type: Option<Type>,
}

impl CallInput {
    pub fn new(bound: InputBound, position: Position) -> Self {
        Self {
            bound,
            position,
            actual: ActualArg::Positional,
            value_solved_type: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.actual = ActualArg::Named(Arc::from(name));
        self
    }

    #[must_use]
    pub fn trailing_block(mut self) -> Self {
        self.actual = ActualArg::TrailingBlock;
        self
    }
}

/// A call site to type, and the results of typing it.
#[derive(Clone, Debug)]
pub struct CallDescriptor {
    pub position: Position,
    pub callees: Vec<Callee>,
    /// Written type arguments and where they were written.
    pub explicit_type_args: Option<Vec<(Type, Position)>>,
    pub inputs: Vec<CallInput>,
    /// A type the result must be assignable to.
    pub context_type: Option<Type>,
    /// A variable for the result, shared with an enclosing call.
    pub pass_var: Option<TypeVar>,

    pub chosen_callee: Option<usize>,
    pub result_type: Option<Type>,
    pub bindings: IndexMap<DefId, Type>,
    pub application_order: Option<Vec<Option<usize>>>,
    pub explanations: Vec<Diagnostic>,
    /// A reified type completed with inferred generic arguments.
    pub reified_solution: Option<Type>,
}

impl CallDescriptor {
    pub fn new(position: Position, callees: Vec<Callee>) -> Self {
        Self {
            position,
            callees,
            explicit_type_args: None,
            inputs: Vec::new(),
            context_type: None,
            pass_var: None,
            chosen_callee: None,
            result_type: None,
            bindings: IndexMap::new(),
            application_order: None,
            explanations: Vec::new(),
            reified_solution: None,
        }
    }

    #[must_use]
    pub fn with_input(mut self, input: CallInput) -> Self {
        self.inputs.push(input);
        self
    }

    #[must_use]
    pub fn with_explicit_type_args(mut self, args: Vec<(Type, Position)>) -> Self {
        self.explicit_type_args = Some(args);
        self
    }

    #[must_use]
    pub fn with_context_type(mut self, t: Type) -> Self {
        self.context_type = Some(t);
        self
    }

    #[must_use]
    pub fn with_pass_var(mut self, v: TypeVar) -> Self {
        self.pass_var = Some(v);
        self
    }

    pub fn has_trailing_block(&self) -> bool {
        self.inputs
            .last()
            .is_some_and(|i| i.actual == ActualArg::TrailingBlock)
    }

    fn actuals(&self) -> Vec<ActualArg> {
        self.inputs.iter().map(|i| i.actual.clone()).collect()
    }
}

/// Solver variables allocated for one call.
struct CallVars {
    callee_choice: SimpleVar,
    type_actuals: SimpleVar,
    call_pass: TypeVar,
}

/// Type every call in `calls` in one solver session.
///
/// `namer` should be the one that made any pass variables the descriptors
/// share, so fresh names do not collide with them. Diagnostics are stored in
/// each descriptor's `explanations` and logged to `sink`.
pub fn infer_bounds(
    calls: &mut [CallDescriptor],
    ctx: &Arc<TypeContext>,
    config: &SolverConfig,
    namer: SolverVarNamer,
    sink: &dyn LogSink,
) -> Result<(), SolverError> {
    let _span = info_span!("infer_bounds", calls = calls.len()).entered();
    let mut solver = TypeSolver::new(Arc::clone(ctx), config.clone()).with_namer(namer);

    let vars: Vec<CallVars> = calls.iter().map(|call| add_call(&mut solver, call)).collect();

    solver.solve()?;

    for (call, vars) in calls.iter_mut().zip(&vars) {
        write_back(&solver, call, vars);
        for d in &call.explanations {
            sink.log(d);
        }
        debug!(
            chosen = ?call.chosen_callee,
            problems = call.explanations.len(),
            "typed call"
        );
    }
    Ok(())
}

fn add_call(solver: &mut TypeSolver, call: &CallDescriptor) -> CallVars {
    let callee_choice = solver.unused_simple_var("callee");

    let mut type_arg_vars: Vec<TypeVar> = Vec::new();
    let mut boundaries: Vec<Option<TypeBoundary>> = Vec::with_capacity(call.inputs.len());
    let mut args = Vec::with_capacity(call.inputs.len());
    for input in &call.inputs {
        let (bound, equated) = match &input.bound {
            InputBound::Pretyped(t) => (Some(TypeBoundary::from(t.clone())), None),
            InputBound::Typeless => (None, None),
            InputBound::CallPass(v) => (Some(TypeBoundary::Var(v.clone())), None),
            InputBound::Value { value, type_var } => (
                Some(TypeBoundary::Value(solver.value_bound(value.clone()))),
                Some(type_var.clone()),
            ),
            InputBound::IncompleteReification {
                reified,
                type_arg_index,
                type_arg_var,
                described_value_argument_index,
            } => {
                while type_arg_vars.len() < *type_arg_index {
                    type_arg_vars.push(solver.unused_type_var("T"));
                }
                match type_arg_vars.get(*type_arg_index) {
                    Some(existing) => {
                        let existing = existing.clone();
                        solver.same_as(TypeBoundary::Var(type_arg_var.clone()), TypeBoundary::Var(existing));
                    }
                    None => type_arg_vars.push(type_arg_var.clone()),
                }

                let completed = complete_reified(solver, reified);
                solver.same_as(TypeBoundary::Like(completed.clone()), TypeBoundary::Var(type_arg_var.clone()));
                let described = described_value_argument_index.and_then(|i| boundaries.get(i).cloned().flatten());
                if let Some(boundary) = described {
                    solver.relates_to(TypeBoundary::Like(completed), boundary);
                }
                (Some(TypeBoundary::from(Type::simple(DefId::TYPE))), None)
            }
        };
        let arg = solver.unused_type_var("a");
        if let Some(bound) = &bound {
            solver.assignable(TypeBoundary::Var(arg.clone()), bound.clone());
            if let Some(v) = equated {
                solver.same_as(bound.clone(), TypeBoundary::Var(v));
            }
        }
        args.push(arg);
        boundaries.push(bound);
    }

    let type_actuals = solver.unused_simple_var("Ts");
    let call_pass = match &call.pass_var {
        Some(v) => v.clone(),
        None => solver.unused_type_var("pass"),
    };
    let constraint = CallConstraint {
        callees: call.callees.clone(),
        callee_choice: callee_choice.clone(),
        explicit_type_args: call
            .explicit_type_args
            .as_ref()
            .map(|ts| ts.iter().map(|(t, _)| t.clone()).collect()),
        type_arg_vars: (!type_arg_vars.is_empty()).then_some(type_arg_vars),
        args,
        has_trailing_block: call.has_trailing_block(),
        type_actuals: Some(type_actuals.clone()),
        call_pass: call_pass.clone(),
        call_fail: None,
    };
    let call_fail = constraint
        .any_returns_result()
        .then(|| solver.unused_simple_var("fail"));
    if let Some(context_type) = &call.context_type {
        solver.assignable(TypeBoundary::from(context_type.clone()), TypeBoundary::Var(call_pass.clone()));
    }
    solver.add_constraint(Constraint::Call(Box::new(CallConstraint {
        call_fail,
        ..constraint
    })));
    debug!(
        callees = call.callees.len(),
        inputs = call.inputs.len(),
        "added call {}",
        callee_choice.name()
    );
    CallVars {
        callee_choice,
        type_actuals,
        call_pass,
    }
}

/// `reified` with a fresh variable for each generic argument it leaves out.
fn complete_reified(solver: &mut TypeSolver, reified: &Type) -> TypeLike {
    if reified.is_param() {
        return TypeLike::Type(reified.clone());
    }
    let ctx = Arc::clone(solver.context());
    let store = ctx.store();
    let formals = store.formals(reified.definition());
    let written = reified.bindings().len();
    if written >= formals.len() {
        return TypeLike::Type(reified.clone());
    }
    let shape_name = store.name(reified.definition());
    let mut bindings: Vec<TypeLike> = reified.bindings().iter().cloned().map(TypeLike::Type).collect();
    for formal in &formals[written..] {
        let hint = format!("{shape_name}{}", store.name(*formal));
        bindings.push(TypeLike::Var(solver.unused_type_var(&hint).to_ref()));
    }
    PartialType::from(reified.definition(), bindings, reified.nullity())
}

/// The type an input contributes, for diagnostics.
fn solved_type(solver: &TypeSolver, input: &CallInput) -> Type {
    let solution = |v: &TypeVar| match solver.type_solution(v) {
        Some(TypeSolution::Type(t)) => t,
        _ => Type::simple(DefId::INVALID),
    };
    match &input.bound {
        InputBound::Pretyped(t) => t.clone(),
        InputBound::Typeless => Type::simple(DefId::INVALID),
        InputBound::CallPass(v) => solution(v),
        InputBound::Value { type_var, .. } => solution(type_var),
        InputBound::IncompleteReification { .. } => Type::simple(DefId::TYPE),
    }
}

fn write_back(solver: &TypeSolver, call: &mut CallDescriptor, vars: &CallVars) {
    let ctx = Arc::clone(solver.context());
    let store = ctx.store();
    let render = |t: &Type| DiagnosticArg::from(t.display(store).to_string());
    let render_sig = |s: &Signature| DiagnosticArg::from(s.display(store).to_string());
    let input_types: Vec<Type> = call.inputs.iter().map(|i| solved_type(solver, i)).collect();

    let mut explanations = Vec::new();
    let chosen = match solver.simple_solution(&vars.callee_choice) {
        Some(Solution::Int(i)) if *i < call.callees.len() => Some(*i),
        _ => None,
    };
    if chosen.is_none() {
        explanations.push(Diagnostic::error(
            MessageTemplate::NoCalleeMatching,
            call.position.clone(),
            vec![
                DiagnosticArg::list(input_types.iter().map(render)),
                DiagnosticArg::list(call.callees.iter().map(|c| render_sig(&c.sig))),
            ],
        ));
    }
    let callee = chosen.map(|i| Arc::clone(&call.callees[i].sig));
    let returns_result = callee
        .as_ref()
        .is_some_and(|sig| !sig.return_type.is_param() && sig.return_type.definition() == DefId::RESULT);

    call.result_type = match solver.type_solution(&vars.call_pass) {
        Some(TypeSolution::Type(pass)) if returns_result => Some(Type::new(
            DefId::RESULT,
            vec![pass, Type::simple(DefId::BUBBLE)],
            Nullity::NonNull,
        )),
        Some(TypeSolution::Type(pass)) => Some(pass),
        _ => None,
    };

    call.chosen_callee = chosen;
    if let Some(sig) = callee {
        let mut has_problems = false;
        match solver.simple_solution(&vars.type_actuals) {
            Some(Solution::TypeList(actuals)) => {
                let mut binding_map: FxHashMap<DefId, Type> = FxHashMap::default();
                for (f, t) in sig.type_formals.iter().zip(actuals) {
                    if let TypeSolution::Type(t) = t {
                        binding_map.insert(*f, t.clone());
                    }
                }

                call.bindings.clear();
                for (i, (&formal, actual)) in sig.type_formals.iter().zip(actuals).enumerate() {
                    let actual = match actual {
                        TypeSolution::Type(t) => t.clone(),
                        TypeSolution::Unsolvable => Type::simple(DefId::INVALID),
                    };
                    let out_of_bounds: Vec<Type> = store
                        .upper_bounds(formal)
                        .iter()
                        .map(|ub| map_type(ub, &binding_map))
                        .filter(|ub| !ctx.is_sub_type(&actual, ub))
                        .collect();
                    if !out_of_bounds.is_empty() {
                        let position = call
                            .explicit_type_args
                            .as_ref()
                            .and_then(|ts| ts.get(i))
                            .map_or_else(|| call.position.clone(), |(_, p)| p.clone());
                        explanations.push(Diagnostic::error(
                            MessageTemplate::ActualNotInBounds,
                            position,
                            vec![
                                DiagnosticArg::from(store.name(formal).as_ref()),
                                render(&actual),
                                DiagnosticArg::list(out_of_bounds.iter().map(render)),
                            ],
                        ));
                        has_problems = true;
                    }
                    call.bindings.insert(formal, actual);
                }

                let sig_in_context = map_signature(&sig, &binding_map);
                let order = match application_order_for_actuals(&call.actuals(), &sig, store) {
                    Ok(order) => {
                        call.application_order = Some(order.clone());
                        order
                    }
                    Err(problem) => {
                        explanations.push(problem.to_diagnostic(call.position.clone()));
                        has_problems = true;
                        Vec::new()
                    }
                };
                let mut bad_inputs = Vec::new();
                for (formal_index, input_index) in order.iter().enumerate() {
                    let Some(input_index) = *input_index else {
                        // Defaults fit their formal.
                        continue;
                    };
                    let input = &call.inputs[input_index];
                    let Some(formal) = sig_in_context.value_formal_for_actual(formal_index) else {
                        explanations.push(Diagnostic::error(
                            MessageTemplate::ArityMismatch,
                            input.position.clone(),
                            vec![
                                DiagnosticArg::from(call.inputs.len()),
                                DiagnosticArg::from(sig.arity_range().to_string()),
                            ],
                        ));
                        has_problems = true;
                        bad_inputs.clear();
                        break;
                    };
                    let input_type = &input_types[input_index];
                    // Null literals and earlier failures are reported elsewhere.
                    if !input_type.is_param()
                        && matches!(input_type.definition(), DefId::NULL | DefId::INVALID)
                    {
                        continue;
                    }
                    if !ctx.is_sub_type(input_type, &formal.ty) {
                        bad_inputs.push(input_index);
                    }
                }
                if !bad_inputs.is_empty() {
                    has_problems = true;
                    let position = Position::spanning_all(bad_inputs.iter().map(|&i| &call.inputs[i].position))
                        .unwrap_or_else(|| call.position.clone());
                    let expected = (0..call.inputs.len()).map(|i| {
                        corresponding_formal(i, &order)
                            .and_then(|fi| sig_in_context.value_formal_for_actual(fi))
                            .map_or_else(|| Type::simple(DefId::INVALID), |f| f.ty)
                    });
                    explanations.push(Diagnostic::error(
                        MessageTemplate::SignatureInputMismatch,
                        position,
                        vec![
                            render_sig(&sig),
                            DiagnosticArg::list(expected.map(|t| render(&t))),
                            DiagnosticArg::list(input_types.iter().map(render)),
                        ],
                    ));
                }
            }
            _ => {
                has_problems = true;
                let context = call
                    .context_type
                    .as_ref()
                    .map_or_else(|| DiagnosticArg::from("unknown"), render);
                explanations.push(Diagnostic::error(
                    MessageTemplate::TypeActualsUnavailable,
                    call.position.clone(),
                    vec![
                        render_sig(&sig),
                        DiagnosticArg::list(input_types.iter().map(render)),
                        context,
                    ],
                ));
            }
        }
        if has_problems {
            call.chosen_callee = None;
        }
    }
    call.explanations = explanations;

    for (input, solved) in call.inputs.iter_mut().zip(&input_types) {
        match &input.bound {
            InputBound::Value { .. } => input.value_solved_type = Some(solved.clone()),
            InputBound::IncompleteReification {
                reified,
                type_arg_var,
                ..
            } => {
                if let Some(TypeSolution::Type(solution)) = solver.type_solution(type_arg_var) {
                    // Too many written bindings is an error to leave visible.
                    if reified.bindings().len() < solution.bindings().len() {
                        call.reified_solution = Some(solution);
                    }
                }
            }
            InputBound::Pretyped(_) | InputBound::Typeless | InputBound::CallPass(_) => {}
        }
    }
}

#[cfg(test)]
#[path = "../tests/infer_tests.rs"]
mod tests;
