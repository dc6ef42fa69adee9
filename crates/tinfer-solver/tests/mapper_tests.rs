use super::*;
use crate::fixture::{int, list_of, map_of, param, string};
use crate::types::{Nullity, TypeVarRef};

#[test]
fn test_map_type_replaces_formals() {
    let mut formals = FxHashMap::default();
    formals.insert(DefId::LIST_T, int());
    let t = list_of(param(DefId::LIST_T));
    assert_eq!(map_type(&t, &formals), list_of(int()));
}

#[test]
fn test_nullable_placeholder_ors_nullity() {
    let mut formals = FxHashMap::default();
    formals.insert(DefId::LIST_T, int());
    let t = Type::formal(DefId::LIST_T, Nullity::OrNull);
    assert_eq!(map_type(&t, &formals), int().or_null());
}

#[test]
fn test_substitution_is_one_pass() {
    let t = param(DefId::LIST_T);
    let mut formals = FxHashMap::default();
    formals.insert(DefId::LIST_T, list_of(t.clone()));
    let mapped = map_type(&map_of(t.clone(), t), &formals);
    let expected = map_of(list_of(param(DefId::LIST_T)), list_of(param(DefId::LIST_T)));
    assert_eq!(mapped, expected);
}

#[test]
fn test_unmapped_formals_are_kept() {
    let mut formals = FxHashMap::default();
    formals.insert(DefId::MAP_K, string());
    let t = map_of(param(DefId::MAP_K), param(DefId::MAP_V));
    assert_eq!(map_type(&t, &formals), map_of(string(), param(DefId::MAP_V)));
}

#[test]
fn test_map_type_with_variables() {
    let v = TypeVar::new("ʼv0");
    let var_ref = TypeLike::Var(v.to_ref());
    let mut lookup = FormalFn(|f: DefId| (f == DefId::LIST_T).then(|| var_ref.clone()));
    let mapped = map_type_with(&list_of(param(DefId::LIST_T)), &mut lookup);
    assert_eq!(mapped.type_vars_used().into_iter().collect::<Vec<_>>(), vec![v]);
    assert_eq!(mapped.definition(), Some(DefId::LIST));
}

#[test]
fn test_partial_collapses_after_substitution() {
    let v = TypeVar::new("ʼv0");
    let partial = PartialType::from(
        DefId::LIST,
        vec![TypeLike::Var(TypeVarRef {
            var: v.clone(),
            nullity: Nullity::OrNull,
        })],
        Nullity::NonNull,
    );
    let mut vars = FxHashMap::default();
    vars.insert(v, TypeLike::Type(int()));
    let formals = FxHashMap::default();
    let mut lookup = MapLookup {
        vars: &vars,
        formals: &formals,
    };
    assert_eq!(
        map_type_like(&partial, &mut lookup),
        TypeLike::Type(list_of(int().or_null()))
    );
}

#[test]
fn test_map_signature() {
    let t = param(DefId::LIST_T);
    let sig = Signature::new(vec![t.clone()], list_of(t.clone()))
        .with_rest(t)
        .with_type_formals(vec![DefId::LIST_T]);
    let mut formals = FxHashMap::default();
    formals.insert(DefId::LIST_T, string());
    let mapped = map_signature(&sig, &formals);
    assert_eq!(mapped.required, vec![string()]);
    assert_eq!(mapped.rest, Some(string()));
    assert_eq!(mapped.return_type, list_of(string()));
    assert_eq!(mapped.type_formals, vec![DefId::LIST_T]);
}
