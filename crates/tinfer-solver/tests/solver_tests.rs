use super::*;
use crate::fixture::{Universe, float, int, list_of, map_of, of, param, simple, string, void};
use crate::def::Variance;
use crate::signature::{Callee, CalleePriority, Signature};
use crate::types::Value;

fn solver(u: &Universe) -> TypeSolver {
    TypeSolver::new(Arc::clone(&u.ctx), SolverConfig::default())
}

fn var(v: &TypeVar) -> TypeBoundary {
    TypeBoundary::Var(v.clone())
}

fn value(s: &mut TypeSolver, v: Value) -> TypeBoundary {
    TypeBoundary::Value(s.value_bound(v))
}

fn solved(t: Type) -> Option<TypeSolution> {
    Some(TypeSolution::Type(t))
}

/// The variables a call constraint ties together.
struct CallVars {
    choice: SimpleVar,
    pass: TypeVar,
    fail: SimpleVar,
    actuals: SimpleVar,
}

fn add_call(s: &mut TypeSolver, callees: Vec<Callee>, args: Vec<TypeVar>) -> CallVars {
    let vars = CallVars {
        choice: s.unused_simple_var("callee"),
        pass: s.unused_type_var("pass"),
        fail: s.unused_simple_var("fail"),
        actuals: s.unused_simple_var("actuals"),
    };
    s.called(CallConstraint {
        callees,
        callee_choice: vars.choice.clone(),
        explicit_type_args: None,
        type_arg_vars: None,
        args,
        has_trailing_block: false,
        type_actuals: Some(vars.actuals.clone()),
        call_pass: vars.pass.clone(),
        call_fail: Some(vars.fail.clone()),
    });
    vars
}

fn callee(required: Vec<Type>, returns: Type) -> Callee {
    Callee::new(Signature::new(required, returns))
}

#[test]
fn test_value_flows_through_a_chain() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    s.assignable(var(&a), var(&b));
    let v = value(&mut s, Value::Int(0));
    s.assignable(var(&b), v);
    assert_eq!(s.solve(), Ok(()));
    assert_eq!(s.type_solution(&a), solved(int()));
    assert_eq!(s.type_solution(&b), solved(int()));
    assert_eq!(
        s.all_solutions().get(&SolverVar::Type(a)),
        Some(&Solution::Type(int()))
    );
}

#[test]
fn test_same_type_is_transitive() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    let c = s.unused_type_var("c");
    s.same_as(var(&a), var(&b));
    s.same_as(var(&b), var(&c));
    let v = value(&mut s, Value::Int(0));
    s.assignable(var(&c), v);
    s.solve().unwrap();
    for v in [&a, &b, &c] {
        assert_eq!(s.type_solution(v), solved(int()));
    }
}

#[test]
fn test_overload_chosen_by_argument_types() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    let c = s.unused_type_var("c");
    s.assignable(var(&a), int().into());
    s.assignable(var(&b), int().into());
    let call = add_call(
        &mut s,
        vec![
            callee(vec![float(), float()], float()),
            callee(vec![int(), int()], int()),
        ],
        vec![a, b],
    );
    s.assignable(var(&c), var(&call.pass));
    s.solve().unwrap();

    assert_eq!(s.simple_solution(&call.choice), Some(&Solution::Int(1)));
    assert_eq!(s.type_solution(&call.pass), solved(int()));
    assert_eq!(s.type_solution(&c), solved(int()));
    assert_eq!(s.simple_solution(&call.fail), Some(&Solution::TypeList(vec![])));
    assert_eq!(s.simple_solution(&call.actuals), Some(&Solution::TypeList(vec![])));
}

#[test]
fn test_result_return_splits_into_pass_and_fail() {
    let u = Universe::new();
    let mut s = solver(&u);
    let bubble = Type::simple(DefId::BUBBLE);
    let returns = Type::new(DefId::RESULT, vec![string(), bubble.clone()], Nullity::NonNull);
    let call = add_call(&mut s, vec![callee(vec![], returns)], vec![]);
    s.solve().unwrap();

    assert_eq!(s.simple_solution(&call.choice), Some(&Solution::Int(0)));
    assert_eq!(s.type_solution(&call.pass), solved(string()));
    assert_eq!(
        s.simple_solution(&call.fail),
        Some(&Solution::TypeList(vec![TypeSolution::Type(bubble)]))
    );
    assert_eq!(s.simple_solution(&call.actuals), Some(&Solution::TypeList(vec![])));
}

#[test]
fn test_invalid_bounds_are_ignored() {
    let u = Universe::new();
    let mut s = solver(&u);
    let x = s.unused_type_var("x");
    s.assignable(var(&x), Type::simple(DefId::INVALID).into());
    let v = value(&mut s, Value::Int(0));
    s.assignable(var(&x), v);
    s.solve().unwrap();
    assert_eq!(s.type_solution(&x), solved(int()));
}

#[test]
fn test_join_of_generic_classes() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    let x = s.unused_type_var("x");
    s.same_as(var(&a), simple(u.str_a).into());
    s.same_as(var(&b), simple(u.str_b).into());
    s.assignable(var(&x), var(&a));
    s.assignable(var(&x), var(&b));
    s.solve().unwrap();
    assert_eq!(s.type_solution(&x), solved(of(u.holder, vec![string()])));
}

#[test]
fn test_partial_types_complete_each_other() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    let c = s.unused_type_var("c");
    let map_b_int = PartialType::from(
        DefId::MAP,
        vec![TypeLike::Var(b.to_ref()), TypeLike::Type(int())],
        Nullity::NonNull,
    );
    let map_string_c = PartialType::from(
        DefId::MAP,
        vec![TypeLike::Type(string()), TypeLike::Var(c.to_ref())],
        Nullity::NonNull,
    );
    s.assignable(var(&a), TypeBoundary::Like(map_b_int));
    s.assignable(TypeBoundary::Like(map_string_c), var(&a));
    s.solve().unwrap();

    assert_eq!(s.type_solution(&a), solved(map_of(string(), int())));
    assert_eq!(s.type_solution(&b), solved(string()));
    assert_eq!(s.type_solution(&c), solved(int()));
}

#[test]
fn test_generic_callee_binds_its_formal() {
    let u = Universe::new();
    let t = u.ctx.store().declare_formal("T", Variance::Invariant);
    let identity = Signature::new(vec![param(t)], param(t)).with_type_formals(vec![t]);
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    let v = value(&mut s, Value::String("hi".into()));
    s.assignable(var(&b), v);
    let call = add_call(&mut s, vec![Callee::new(identity)], vec![b]);
    s.assignable(var(&a), var(&call.pass));
    s.solve().unwrap();

    assert_eq!(s.simple_solution(&call.choice), Some(&Solution::Int(0)));
    assert_eq!(s.type_solution(&a), solved(string()));
    assert_eq!(
        s.simple_solution(&call.actuals),
        Some(&Solution::TypeList(vec![TypeSolution::Type(string())]))
    );
}

#[test]
fn test_null_alone_is_unsolvable() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    let v = value(&mut s, Value::Null);
    s.assignable(var(&a), v);
    let v = value(&mut s, Value::Null);
    s.same_as(var(&b), v);
    s.solve().unwrap();
    assert_eq!(s.type_solution(&a), Some(TypeSolution::Unsolvable));
    assert_eq!(s.type_solution(&b), Some(TypeSolution::Unsolvable));
}

#[test]
fn test_null_joins_with_a_typed_value() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let n = s.unused_type_var("n");
    let null = value(&mut s, Value::Null);
    s.assignable(var(&a), null.clone());
    let v = value(&mut s, Value::Int(0));
    s.assignable(var(&a), v);
    s.same_as(var(&n), null);
    s.solve().unwrap();
    assert_eq!(s.type_solution(&a), solved(int().or_null()));
    assert_eq!(s.type_solution(&n), solved(int().or_null()));
}

#[test]
fn test_more_specific_overload_wins() {
    let u = Universe::new();
    let mut s = solver(&u);
    let arg = s.unused_type_var("arg");
    s.assignable(var(&arg), int().into());
    let call = add_call(
        &mut s,
        vec![
            callee(vec![Type::simple(DefId::MAP_KEY)], string()),
            callee(vec![int()], int()),
        ],
        vec![arg],
    );
    s.solve().unwrap();
    assert_eq!(s.simple_solution(&call.choice), Some(&Solution::Int(1)));
    assert_eq!(s.type_solution(&call.pass), solved(int()));
}

#[test]
fn test_fallback_callee_loses_a_tie() {
    let u = Universe::new();
    let mut s = solver(&u);
    let arg = s.unused_type_var("arg");
    s.assignable(var(&arg), int().into());
    let call = add_call(
        &mut s,
        vec![
            callee(vec![int()], int()).with_priority(CalleePriority::Fallback),
            callee(vec![int()], int()),
        ],
        vec![arg],
    );
    s.solve().unwrap();
    assert_eq!(s.simple_solution(&call.choice), Some(&Solution::Int(1)));
}

#[test]
fn test_void_context_picks_void_callee() {
    let u = Universe::new();
    let mut s = solver(&u);
    let call = add_call(
        &mut s,
        vec![callee(vec![], void()), callee(vec![], int())],
        vec![],
    );
    s.add_constraint(Constraint::sub_type(call.pass.clone(), void()));
    s.solve().unwrap();
    assert_eq!(s.simple_solution(&call.choice), Some(&Solution::Int(0)));
    assert_eq!(s.type_solution(&call.pass), solved(void()));
}

#[test]
fn test_list_literal_value() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let v = value(&mut s, Value::List(vec![Value::Int(0)]));
    s.assignable(var(&a), v);
    s.solve().unwrap();
    assert_eq!(s.type_solution(&a), solved(list_of(int())));
}

#[test]
fn test_unconstrained_vars_are_unsolvable() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    s.assignable(var(&a), var(&b));
    s.solve().unwrap();
    assert_eq!(s.type_solution(&a), Some(TypeSolution::Unsolvable));
    assert_eq!(s.type_solution(&b), Some(TypeSolution::Unsolvable));
}

#[test]
fn test_round_limit_leaves_nodes_unsolvable() {
    let u = Universe::new();
    let config = SolverConfig {
        max_rounds: 0,
        ..SolverConfig::default()
    };
    let mut s = TypeSolver::new(Arc::clone(&u.ctx), config);
    let a = s.unused_type_var("a");
    s.assignable(var(&a), int().into());
    s.solve().unwrap();
    assert_eq!(s.type_solution(&a), Some(TypeSolution::Unsolvable));
}

#[test]
fn test_lookups_before_solving() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let never_mentioned = s.unused_type_var("z");
    s.assignable(var(&a), int().into());
    assert_eq!(s.type_solution(&a), None);
    s.solve().unwrap();
    assert_eq!(s.type_solution(&never_mentioned), None);
}

#[test]
fn test_duplicate_and_empty_constraints_are_dropped() {
    let u = Universe::new();
    let mut s = solver(&u);
    let a = s.unused_type_var("a");
    let b = s.unused_type_var("b");
    s.assignable(var(&a), var(&b));
    s.add_constraint(Constraint::sub_type(b.clone(), a.clone()));
    s.add_constraint(Constraint::uses(TypeLike::Type(int())));
    assert_eq!(s.constraints().count(), 1);
}

#[test]
fn test_namer_continues_numbering() {
    let u = Universe::new();
    let mut namer = SolverVarNamer::new();
    let first = namer.unused_type_var("a");
    let mut s = solver(&u).with_namer(namer);
    let second = s.unused_type_var("a");
    assert_ne!(first, second);
    assert_eq!(second.name(), "ʼa1");
}

#[test]
fn test_solver_error_display() {
    let err = SolverError::InconsistentChoice {
        node: "ʼa0".to_string(),
        choice: "Int32".to_string(),
    };
    assert_eq!(err.to_string(), "cannot choose Int32 for ʼa0");
}

#[test]
fn test_dumping_rounds_does_not_change_solutions() {
    let u = Universe::new();
    let config = SolverConfig {
        dump_rounds: true,
        ..SolverConfig::default()
    };
    let subscriber = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let mut s = TypeSolver::new(Arc::clone(&u.ctx), config);
        let a = s.unused_type_var("a");
        let v = value(&mut s, Value::Int(0));
        s.assignable(var(&a), v);
        s.solve().unwrap();
        assert_eq!(s.type_solution(&a), solved(int()));
    });
}
