use super::*;
use crate::fixture::{int, list_of, map_of, string};

fn var(name: &str) -> TypeLike {
    TypeLike::Var(TypeVar::new(name).to_ref())
}

#[test]
fn test_never_of_never_collapses() {
    let nested = Type::new(DefId::NEVER, vec![Type::never_of(int())], Nullity::NonNull);
    assert_eq!(nested, Type::never_of(int()));
}

#[test]
fn test_never_of_nullable_moves_nullity_outside() {
    let t = Type::never_of(int().or_null());
    assert!(t.is_nullable());
    assert_eq!(t.bindings(), &[int()]);
    assert_eq!(t, Type::new(DefId::NEVER, vec![int()], Nullity::OrNull));
}

#[test]
fn test_never_nullities_are_ored() {
    let inner = Type::new(DefId::NEVER, vec![string()], Nullity::OrNull);
    let outer = Type::new(DefId::NEVER, vec![inner], Nullity::NonNull);
    assert!(outer.is_nullable());
    assert_eq!(outer.bindings(), &[string()]);
}

#[test]
fn test_strip_never() {
    let t = Type::new(DefId::NEVER, vec![int()], Nullity::OrNull);
    assert_eq!(t.strip_never(), int().or_null());
    assert_eq!(Type::never_of(int()).strip_never(), int());
    assert_eq!(string().strip_never(), string());
}

#[test]
fn test_with_nullity_keeps_param_flag() {
    let p = Type::formal(DefId::LIST_T, Nullity::NonNull);
    let q = p.or_null();
    assert!(q.is_param());
    assert!(q.is_nullable());
    assert_eq!(q.non_null(), p);
}

#[test]
fn test_nullity_or() {
    assert_eq!(Nullity::NonNull.or(Nullity::NonNull), Nullity::NonNull);
    assert_eq!(Nullity::NonNull.or(Nullity::OrNull), Nullity::OrNull);
    assert_eq!(Nullity::from_nullable(true), Nullity::OrNull);
    assert_eq!(Nullity::default(), Nullity::NonNull);
}

#[test]
fn test_partial_collapses_when_all_bindings_are_types() {
    let t = PartialType::from(DefId::LIST, vec![TypeLike::Type(int())], Nullity::NonNull);
    assert_eq!(t, TypeLike::Type(list_of(int())));
}

#[test]
fn test_partial_type_vars_used_in_order() {
    let t = PartialType::from(
        DefId::MAP,
        vec![
            var("k"),
            PartialType::from(DefId::LIST, vec![var("v")], Nullity::NonNull),
        ],
        Nullity::NonNull,
    );
    let used: Vec<_> = t.type_vars_used().into_iter().collect();
    assert_eq!(used, vec![TypeVar::new("k"), TypeVar::new("v")]);
    assert_eq!(t.binding_count(), 2);
    assert_eq!(t.definition(), Some(DefId::MAP));
}

#[test]
fn test_partial_never_normalization() {
    let nullable_var = TypeLike::Var(TypeVarRef {
        var: TypeVar::new("x"),
        nullity: Nullity::OrNull,
    });
    let t = PartialType::from(DefId::NEVER, vec![nullable_var], Nullity::NonNull);
    assert!(t.nullity().is_nullable());
    assert_eq!(t.binding(0), Some(var("x")));
}

#[test]
fn test_type_like_var_accessors() {
    let v = var("q");
    assert_eq!(v.definition(), None);
    assert!(!v.is_type_or_partial());
    assert_eq!(v.binding_count(), 0);
    assert_eq!(v.type_vars_used().len(), 1);
    assert!(v.with_nullity(Nullity::OrNull).nullity().is_nullable());
    assert!(TypeLike::Type(int()).type_vars_used().is_empty());
}

#[test]
fn test_value_bounds_compare_by_identity() {
    let mut namer = SolverVarNamer::new();
    let a = namer.value_bound(Value::Int(1));
    let b = namer.value_bound(Value::Int(1));
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert_eq!(a.value(), b.value());
}

#[test]
fn test_value_bound_ids_restart_per_namer() {
    let mut first = SolverVarNamer::new();
    let mut second = SolverVarNamer::new();
    let a = first.value_bound(Value::Int(1));
    let b = second.value_bound(Value::String("x".into()));
    assert_eq!(a, b);
    assert_ne!(a, first.value_bound(Value::Int(1)));
    assert_eq!(first.unused_type_var("a").name(), "ʼa0");
}

#[test]
fn test_namer_counter_is_shared_across_hints() {
    let mut namer = SolverVarNamer::new();
    assert_eq!(namer.unused_type_var("a").name(), "ʼa0");
    assert_eq!(namer.unused_simple_var("callee").name(), "ʼcallee1");
    assert_eq!(namer.unused_name("a"), "ʼa2");
    assert!(namer.unused_name("x").starts_with(VAR_PREFIX_CHAR));
}

#[test]
fn test_solution_narrowing() {
    assert_eq!(
        Solution::Type(int()).as_type_solution(),
        Some(TypeSolution::Type(int()))
    );
    assert_eq!(
        Solution::Unsolvable.as_type_solution(),
        Some(TypeSolution::Unsolvable)
    );
    assert_eq!(Solution::TypeList(vec![]).as_type_solution(), None);
    assert_eq!(Solution::Int(3).as_type(), None);
    assert!(Solution::from(TypeSolution::Unsolvable).is_unsolvable());
}

#[test]
fn test_render_with_store_names() {
    let store = DefinitionStore::new();
    let t = list_of(int().or_null()).or_null();
    assert_eq!(t.display(&store).to_string(), "List<Int32?>?");

    let p = PartialType::from(DefId::MAP, vec![var("ʼk0"), TypeLike::Type(int())], Nullity::NonNull);
    assert_eq!(p.display(&store).to_string(), "Map<ʼk0, Int32>");

    let list = Solution::TypeList(vec![
        TypeSolution::Type(map_of(string(), int())),
        TypeSolution::Unsolvable,
    ]);
    assert_eq!(list.display(&store).to_string(), "[Map<String, Int32>, unsolvable]");
    assert_eq!(Solution::Int(4).display(&store).to_string(), "4");
}
