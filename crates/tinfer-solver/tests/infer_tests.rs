use super::*;
use crate::def::Variance;
use crate::fixture::{Universe, any, float, int, list_of, param, string, void};
use tinfer_common::{CollectingSink, NullSink};

fn pos(l: u32) -> Position {
    Position::new("test.tmp", l, l + 1)
}

fn pretyped(t: Type, l: u32) -> CallInput {
    CallInput::new(InputBound::Pretyped(t), pos(l))
}

fn callee(required: Vec<Type>, returns: Type) -> Callee {
    Callee::new(Signature::new(required, returns))
}

fn infer(u: &Universe, calls: &mut [CallDescriptor]) {
    infer_with(u, calls, SolverVarNamer::new(), &NullSink);
}

fn infer_with(u: &Universe, calls: &mut [CallDescriptor], namer: SolverVarNamer, sink: &dyn LogSink) {
    infer_bounds(calls, &u.ctx, &SolverConfig::default(), namer, sink).unwrap();
}

fn templates(call: &CallDescriptor) -> Vec<MessageTemplate> {
    call.explanations.iter().map(|d| d.template).collect()
}

#[test]
fn test_overload_resolved_by_pretyped_inputs() {
    let u = Universe::new();
    let call = CallDescriptor::new(
        pos(0),
        vec![
            callee(vec![float(), float()], float()),
            callee(vec![int(), int()], int()),
        ],
    )
    .with_input(pretyped(int(), 1))
    .with_input(pretyped(int(), 3));
    let mut calls = [call];
    infer(&u, &mut calls);

    let call = &calls[0];
    assert!(call.explanations.is_empty(), "{:?}", call.explanations);
    assert_eq!(call.chosen_callee, Some(1));
    assert_eq!(call.result_type, Some(int()));
    assert_eq!(call.application_order, Some(vec![Some(0), Some(1)]));
    assert!(call.bindings.is_empty());
}

#[test]
fn test_no_callee_for_wrong_arity() {
    let u = Universe::new();
    let call = CallDescriptor::new(pos(0), vec![callee(vec![int(), int()], int())])
        .with_input(pretyped(int(), 1));
    let mut calls = [call];
    infer(&u, &mut calls);

    assert_eq!(calls[0].chosen_callee, None);
    assert_eq!(calls[0].result_type, None);
    assert_eq!(templates(&calls[0]), vec![MessageTemplate::NoCalleeMatching]);
}

#[test]
fn test_single_callee_with_mismatched_input() {
    let u = Universe::new();
    let call = CallDescriptor::new(pos(0), vec![callee(vec![string()], void())])
        .with_input(pretyped(int(), 4));
    let mut calls = [call];
    infer(&u, &mut calls);

    assert_eq!(calls[0].chosen_callee, None);
    assert_eq!(templates(&calls[0]), vec![MessageTemplate::SignatureInputMismatch]);
    assert_eq!(calls[0].explanations[0].position, pos(4));
}

#[test]
fn test_generic_callee_with_value_input() {
    let u = Universe::new();
    let t = u.ctx.store().declare_formal("T", Variance::Invariant);
    let identity = Signature::new(vec![param(t)], param(t)).with_type_formals(vec![t]);
    let mut namer = SolverVarNamer::new();
    let type_var = namer.unused_type_var("v");
    let input = CallInput::new(
        InputBound::Value {
            value: Value::String("x".into()),
            type_var,
        },
        pos(1),
    );
    let mut calls = [CallDescriptor::new(pos(0), vec![Callee::new(identity)]).with_input(input)];
    infer_with(&u, &mut calls, namer, &NullSink);

    let call = &calls[0];
    assert!(call.explanations.is_empty(), "{:?}", call.explanations);
    assert_eq!(call.chosen_callee, Some(0));
    assert_eq!(call.result_type, Some(string()));
    assert_eq!(call.bindings.get(&t), Some(&string()));
    assert_eq!(call.inputs[0].value_solved_type, Some(string()));
}

#[test]
fn test_explicit_type_argument_out_of_bounds() {
    let u = Universe::new();
    let store = u.ctx.store();
    let t = store.declare_formal("T", Variance::Invariant);
    store.set_upper_bounds(t, vec![Type::simple(DefId::MAP_KEY)]);
    let make = Signature::new(vec![], param(t)).with_type_formals(vec![t]);
    let call = CallDescriptor::new(pos(0), vec![Callee::new(make)])
        .with_explicit_type_args(vec![(Type::simple(DefId::BOOLEAN), pos(2))]);
    let mut calls = [call];
    infer(&u, &mut calls);

    assert_eq!(calls[0].chosen_callee, None);
    assert!(templates(&calls[0]).contains(&MessageTemplate::ActualNotInBounds));
}

#[test]
fn test_result_return_is_reported_with_bubble() {
    let u = Universe::new();
    let result = Type::new(
        DefId::RESULT,
        vec![int(), Type::simple(DefId::BUBBLE)],
        Nullity::NonNull,
    );
    let mut calls = [CallDescriptor::new(pos(0), vec![callee(vec![], result.clone())])];
    infer(&u, &mut calls);

    assert_eq!(calls[0].chosen_callee, Some(0));
    assert_eq!(calls[0].result_type, Some(result));
}

#[test]
fn test_calls_share_pass_variables() {
    let u = Universe::new();
    let mut namer = SolverVarNamer::new();
    let inner_pass = namer.unused_type_var("pass");
    let inner = CallDescriptor::new(pos(1), vec![callee(vec![], int())]).with_pass_var(inner_pass.clone());
    let outer = CallDescriptor::new(pos(0), vec![callee(vec![int()], string())])
        .with_input(CallInput::new(InputBound::CallPass(inner_pass), pos(1)));
    let mut calls = [inner, outer];
    infer_with(&u, &mut calls, namer, &NullSink);

    assert_eq!(calls[0].result_type, Some(int()));
    assert_eq!(calls[1].chosen_callee, Some(0));
    assert_eq!(calls[1].result_type, Some(string()));
}

#[test]
fn test_incomplete_reification_is_completed() {
    let u = Universe::new();
    let t = u.ctx.store().declare_formal("T", Variance::Invariant);
    let cast = Signature::new(vec![any().or_null(), Type::simple(DefId::TYPE)], param(t))
        .with_type_formals(vec![t]);
    let mut namer = SolverVarNamer::new();
    let r = namer.unused_type_var("r");
    let operand = CallInput::new(
        InputBound::IncompleteReification {
            reified: Type::new(DefId::LIST, vec![], Nullity::NonNull),
            type_arg_index: 0,
            type_arg_var: r,
            described_value_argument_index: Some(0),
        },
        pos(2),
    );
    let call = CallDescriptor::new(pos(0), vec![Callee::new(cast)])
        .with_input(pretyped(list_of(string()), 1))
        .with_input(operand);
    let mut calls = [call];
    infer_with(&u, &mut calls, namer, &NullSink);

    let call = &calls[0];
    assert!(call.explanations.is_empty(), "{:?}", call.explanations);
    assert_eq!(call.reified_solution, Some(list_of(string())));
    assert_eq!(call.result_type, Some(list_of(string())));
}

#[test]
fn test_diagnostics_reach_the_sink() {
    let u = Universe::new();
    let sink = CollectingSink::new();
    let call = CallDescriptor::new(pos(0), vec![callee(vec![int(), int()], int())])
        .with_input(pretyped(int(), 1));
    let mut calls = [call];
    infer_with(&u, &mut calls, SolverVarNamer::new(), &sink);

    assert_eq!(sink.len(), 1);
    assert_eq!(sink.entries(), calls[0].explanations);
}

#[test]
fn test_batches_run_in_parallel() {
    use rayon::prelude::*;

    let u = Universe::new();
    let results: Vec<Option<usize>> = (0..8)
        .into_par_iter()
        .map(|_| {
            let call = CallDescriptor::new(
                pos(0),
                vec![callee(vec![string()], void()), callee(vec![int()], int())],
            )
            .with_input(pretyped(int(), 1));
            let mut calls = [call];
            infer_bounds(&mut calls, &u.ctx, &SolverConfig::default(), SolverVarNamer::new(), &NullSink)
                .unwrap();
            calls[0].chosen_callee
        })
        .collect();
    assert!(results.iter().all(|c| *c == Some(1)));
}

fn literal(value: Value, namer: &mut SolverVarNamer, l: u32) -> CallInput {
    let type_var = namer.unused_type_var("v");
    CallInput::new(InputBound::Value { value, type_var }, pos(l))
}

#[test]
fn test_exact_argument_picks_matching_overload() {
    let u = Universe::new();
    let call = CallDescriptor::new(
        pos(0),
        vec![
            callee(vec![int()], Type::simple(u.a)),
            callee(vec![Type::simple(DefId::BOOLEAN)], Type::simple(u.b)),
            callee(vec![string()], Type::simple(u.c)),
        ],
    )
    .with_input(pretyped(int(), 1));
    let mut calls = [call];
    infer(&u, &mut calls);
    assert_eq!(calls[0].chosen_callee, Some(0));
    assert_eq!(calls[0].result_type, Some(Type::simple(u.a)));
}

#[test]
fn test_int_literal_to_single_callee() {
    let u = Universe::new();
    let mut namer = SolverVarNamer::new();
    let input = literal(Value::Int(3), &mut namer, 1);
    let mut calls = [CallDescriptor::new(pos(0), vec![callee(vec![int()], string())]).with_input(input)];
    infer_with(&u, &mut calls, namer, &NullSink);
    assert_eq!(calls[0].chosen_callee, Some(0));
    assert_eq!(calls[0].result_type, Some(string()));
    assert_eq!(calls[0].inputs[0].value_solved_type, Some(int()));
}

#[test]
fn test_non_generic_overload_beats_generic() {
    let u = Universe::new();
    let t = u.ctx.store().declare_formal("T", Variance::Invariant);
    let generic = Signature::new(vec![param(t)], param(t)).with_type_formals(vec![t]);
    let mut namer = SolverVarNamer::new();
    let input = literal(Value::String("x".into()), &mut namer, 1);
    let call = CallDescriptor::new(
        pos(0),
        vec![Callee::new(generic), callee(vec![string()], string())],
    )
    .with_input(input);
    let mut calls = [call];
    infer_with(&u, &mut calls, namer, &NullSink);
    assert_eq!(calls[0].chosen_callee, Some(1));
    assert_eq!(calls[0].result_type, Some(string()));
}

#[test]
fn test_element_type_of_list_literal() {
    let u = Universe::new();
    let t = u.ctx.store().declare_formal("T", Variance::Invariant);
    let first = Signature::new(vec![list_of(param(t))], param(t)).with_type_formals(vec![t]);
    let mut namer = SolverVarNamer::new();
    let input = literal(Value::List(vec![Value::Int(1), Value::Int(2)]), &mut namer, 1);
    let mut calls = [CallDescriptor::new(pos(0), vec![Callee::new(first)]).with_input(input)];
    infer_with(&u, &mut calls, namer, &NullSink);
    assert_eq!(calls[0].chosen_callee, Some(0));
    assert_eq!(calls[0].bindings.get(&t), Some(&int()));
    assert_eq!(calls[0].result_type, Some(int()));
}

#[test]
fn test_no_callees_at_all() {
    let u = Universe::new();
    let mut calls = [CallDescriptor::new(pos(7), vec![])];
    infer(&u, &mut calls);
    assert_eq!(calls[0].chosen_callee, None);
    assert_eq!(calls[0].result_type, None);
    assert_eq!(templates(&calls[0]), vec![MessageTemplate::NoCalleeMatching]);
    assert_eq!(calls[0].explanations[0].position, pos(7));
}
