use super::*;
use crate::fixture::{int, string};

#[test]
fn test_builtins_are_registered() {
    let store = DefinitionStore::new();
    assert_eq!(&*store.name(DefId::INT32), "Int32");
    assert_eq!(&*store.name(DefId::MAP_BUILDER), "MapBuilder");
    assert!(store.contains(DefId::RESULT_PASS));
    assert!(DefId::VOID.is_builtin());
    assert!(store.flags(DefId::LIST).contains(ShapeFlags::WELL_KNOWN));
    assert_eq!(store.abstractness(DefId::MAP_KEY), Abstractness::Abstract);
    assert_eq!(store.abstractness(DefId::STRING), Abstractness::Concrete);
}

#[test]
fn test_builtin_formals_and_variance() {
    let store = DefinitionStore::new();
    assert_eq!(store.formals(DefId::LIST), vec![DefId::LIST_T]);
    assert_eq!(store.formals(DefId::MAP), vec![DefId::MAP_K, DefId::MAP_V]);
    assert_eq!(store.variance(DefId::LIST_T), Variance::Covariant);
    assert_eq!(store.variance(DefId::LISTED_T), Variance::Invariant);
    assert_eq!(store.variance(DefId::MAP_K), Variance::Contravariant);
    assert_eq!(store.upper_bounds(DefId::MAP_K), vec![Type::simple(DefId::MAP_KEY)]);
    assert_eq!(store.upper_bounds(DefId::LIST_T), vec![Type::simple(DefId::ANY_VALUE)]);
    assert!(store.is_formal(DefId::NEVER_T));
    assert!(!store.is_formal(DefId::NEVER));
    assert_eq!(store.formal_count(DefId::RESULT), 1);
}

#[test]
fn test_builtin_super_types() {
    let store = DefinitionStore::new();
    assert_eq!(store.super_types(DefId::INT32), vec![Type::simple(DefId::MAP_KEY)]);
    assert_eq!(
        store.super_types(DefId::LIST),
        vec![Type::new(
            DefId::LISTED,
            vec![Type::formal(DefId::LIST_T, Nullity::NonNull)],
            Nullity::NonNull,
        )]
    );
    assert!(store.super_types(DefId::ANY_VALUE).is_empty());
    assert!(store.super_types(DefId::VOID).is_empty());
}

#[test]
fn test_user_declarations() {
    let store = DefinitionStore::new();
    let before = store.len();
    let boxed = store.declare_shape("Box", Abstractness::Concrete);
    assert!(!boxed.is_builtin());
    assert!(boxed.0 >= DefId::FIRST_USER);
    assert_eq!(store.super_types(boxed), vec![Type::simple(DefId::ANY_VALUE)]);

    let t = store.add_formal(boxed, "T", Variance::Covariant);
    assert_eq!(store.formals(boxed), vec![t]);
    assert_eq!(store.get(t).and_then(|i| i.as_formal().and_then(|f| f.owner)), Some(boxed));

    let free = store.declare_formal("U", Variance::Invariant);
    store.set_upper_bounds(free, vec![string()]);
    assert_eq!(store.upper_bounds(free), vec![string()]);
    assert_eq!(store.len(), before + 3);
}

#[test]
fn test_unknown_ids_are_harmless() {
    let store = DefinitionStore::new();
    let missing = DefId(9_999);
    assert!(!store.contains(missing));
    assert!(store.formals(missing).is_empty());
    assert_eq!(&*store.name(missing), "#9999");
    assert_eq!(store.variance(missing), Variance::Invariant);
}

#[test]
fn test_function_interfaces_are_shared_per_key() {
    let store = DefinitionStore::new();
    let a = store.function_interface(1, 0, false, false);
    let b = store.function_interface(1, 0, false, false);
    let bubbly = store.function_interface(1, 0, false, true);
    assert_eq!(a, b);
    assert_ne!(a, bubbly);
    assert!(store.is_functional_interface(a));
    assert!(store.flags(a).contains(ShapeFlags::SYNTHESIZED));
    assert_eq!(store.super_types(a), vec![Type::simple(DefId::FUNCTION)]);

    let formals = store.formals(a);
    assert_eq!(formals.len(), 2);
    assert_eq!(store.variance(formals[0]), Variance::Contravariant);
    assert_eq!(store.variance(formals[1]), Variance::Covariant);
}

#[test]
fn test_function_type_bindings() {
    let store = DefinitionStore::new();
    let t = store.function_type(vec![int()], vec![string()], None, int(), true);
    assert_eq!(t.bindings(), &[int(), string(), int()]);
    let apply = store.apply_signature(t.definition()).expect("apply signature");
    assert_eq!(apply.required.len(), 1);
    assert_eq!(apply.optional.len(), 1);
    assert!(apply.rest.is_none());
    assert_eq!(apply.return_type.definition(), DefId::RESULT);
}
