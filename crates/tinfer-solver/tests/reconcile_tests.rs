use super::*;
use crate::fixture::{Universe, int, list_of, of, string};
use crate::types::Type;

fn var(name: &str) -> TypeVar {
    TypeVar::new(name)
}

fn var_like(name: &str) -> TypeLike {
    TypeLike::Var(var(name).to_ref())
}

fn nullable_var_like(name: &str) -> TypeLike {
    TypeLike::Var(TypeVarRef {
        var: var(name),
        nullity: Nullity::OrNull,
    })
}

fn partial(def: DefId, bindings: Vec<TypeLike>) -> TypeLike {
    PartialType::from(def, bindings, Nullity::NonNull)
}

fn full(t: Type) -> TypeLike {
    TypeLike::Type(t)
}

fn bound(v: &str, t: TypeLike, kind: BoundKind) -> Reconciliation {
    Reconciliation::Partial {
        var: var(v),
        bound: t,
        kind,
    }
}

#[test]
fn test_kind_for_table() {
    use BoundKind::{Common, Lower, Upper};
    assert_eq!(kind_for(Lower, Lower, Variance::Covariant), None);
    assert_eq!(kind_for(Upper, Upper, Variance::Contravariant), None);
    assert_eq!(kind_for(Lower, Lower, Variance::Invariant), Some(Common));
    assert_eq!(kind_for(Common, Common, Variance::Covariant), Some(Common));
    assert_eq!(kind_for(Lower, Upper, Variance::Covariant), Some(Upper));
    assert_eq!(kind_for(Lower, Common, Variance::Invariant), Some(Common));
    assert_eq!(kind_for(Lower, Upper, Variance::Contravariant), Some(Lower));
}

#[test]
fn test_map_bounds_constrain_both_variables() {
    let u = Universe::new();
    // Map<a, Int32> <: node <: Map<String, b>
    let lower = partial(DefId::MAP, vec![var_like("a"), full(int())]);
    let upper = partial(DefId::MAP, vec![full(string()), var_like("b")]);
    let out = reconcile_partial_types(&[lower], &[], &[upper], &u.ctx);
    assert_eq!(out.len(), 2);
    assert!(out.contains(&bound("a", full(string()), BoundKind::Lower)));
    assert!(out.contains(&bound("b", full(int()), BoundKind::Lower)));
}

#[test]
fn test_variables_relate_to_each_other() {
    let u = Universe::new();
    let lower = partial(DefId::LIST, vec![var_like("a")]);
    let upper = partial(DefId::LIST, vec![var_like("b")]);
    let out = reconcile_partial_types(&[lower], &[], &[upper], &u.ctx);
    let expected = Reconciliation::Var {
        bounded: var("a").to_ref(),
        bound: var("b").to_ref(),
        kind: BoundKind::Upper,
    };
    assert_eq!(out.into_iter().collect::<Vec<_>>(), vec![expected]);

    let lower = partial(DefId::LIST_BUILDER, vec![var_like("a")]);
    let upper = partial(DefId::LIST_BUILDER, vec![var_like("b")]);
    let out = reconcile_partial_types(&[lower], &[], &[upper], &u.ctx);
    assert!(out.iter().all(|r| matches!(r, Reconciliation::Var { kind: BoundKind::Common, .. })));
    assert_eq!(out.len(), 1);
}

#[test]
fn test_two_lower_bounds_only_meet_in_invariant_positions() {
    let u = Universe::new();
    let builder = partial(DefId::LIST_BUILDER, vec![var_like("a")]);
    let concrete = full(of(DefId::LIST_BUILDER, vec![int()]));
    let out = reconcile_partial_types(&[builder, concrete], &[], &[], &u.ctx);
    assert_eq!(
        out.into_iter().collect::<Vec<_>>(),
        vec![bound("a", full(int()), BoundKind::Common)]
    );

    let list = partial(DefId::LIST, vec![var_like("a")]);
    let out = reconcile_partial_types(&[list, full(list_of(int()))], &[], &[], &u.ctx);
    assert!(out.is_empty());
}

#[test]
fn test_common_variable_takes_full_common_bound() {
    let u = Universe::new();
    let out = reconcile_partial_types(&[], &[var_like("x"), full(int())], &[], &u.ctx);
    assert_eq!(
        out.into_iter().collect::<Vec<_>>(),
        vec![bound("x", full(int()), BoundKind::Common)]
    );
}

#[test]
fn test_nullable_upper_variable_gets_non_null_lower() {
    let u = Universe::new();
    let out = reconcile_partial_types(&[full(int())], &[], &[nullable_var_like("x")], &u.ctx);
    assert_eq!(
        out.into_iter().collect::<Vec<_>>(),
        vec![bound("x", full(int()), BoundKind::Lower)]
    );
}

#[test]
fn test_concrete_invariant_upper_bound_adds_never_lower() {
    let u = Universe::new();
    let builder = of(DefId::LIST_BUILDER, vec![int()]);
    let out = reconcile_partial_types(&[var_like("x")], &[], &[full(builder.clone())], &u.ctx);
    assert_eq!(
        out.into_iter().collect::<Vec<_>>(),
        vec![
            bound("x", full(Type::never_of(builder.clone())), BoundKind::Lower),
            bound("x", full(builder), BoundKind::Upper),
        ]
    );
}

#[test]
fn test_nullable_common_variable() {
    let u = Universe::new();
    let out = reconcile_partial_types(&[], &[nullable_var_like("x"), full(int().or_null())], &[], &u.ctx);
    assert_eq!(out.len(), 3);
    assert!(out.contains(&bound("x", full(int()), BoundKind::Lower)));
    assert!(out.contains(&bound("x", full(int().or_null()), BoundKind::Upper)));
    assert!(out.contains(&bound(
        "x",
        full(Type::never_of(int()).or_null()),
        BoundKind::Lower
    )));
}

#[test]
fn test_variable_inside_never_lower_bound() {
    let u = Universe::new();
    let never = PartialType::from(DefId::NEVER, vec![var_like("n")], Nullity::OrNull);
    let out = reconcile_partial_types(&[never], &[], &[full(int().or_null())], &u.ctx);
    assert!(out.contains(&bound("n", full(int().or_null()), BoundKind::Upper)));
}

#[test]
fn test_render_reconciliation() {
    let store = DefinitionStore::new();
    let r = bound("a", full(string()), BoundKind::Lower);
    assert_eq!(r.display(&store).to_string(), "String <: a");
    let r = Reconciliation::Var {
        bounded: var("a").to_ref(),
        bound: var("b").to_ref(),
        kind: BoundKind::Common,
    };
    assert_eq!(r.display(&store).to_string(), "a == b");
}
