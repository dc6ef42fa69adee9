use super::*;
use crate::fixture::{boolean, int, list_of, param, string};
use crate::def::Variance;

#[test]
fn test_arity_range_display() {
    let exact = Signature::new(vec![int(), int()], int());
    assert_eq!(exact.arity_range().to_string(), "2");

    let optional = Signature::new(vec![int()], int()).with_optional(vec![string(), string()]);
    assert_eq!(optional.arity_range(), ArityRange { min: 1, max: Some(3) });
    assert_eq!(optional.arity_range().to_string(), "1..3");

    let rest = Signature::new(vec![int()], int()).with_rest(string());
    assert_eq!(rest.arity_range().to_string(), "1..");
}

#[test]
fn test_arity_range_contains() {
    let range = ArityRange { min: 1, max: Some(2) };
    assert!(!range.contains(0));
    assert!(range.contains(2));
    assert!(!range.contains(3));
    assert!(ArityRange { min: 0, max: None }.contains(100));
}

#[test]
fn test_value_formal_for_actual() {
    let sig = Signature::new(vec![int()], void_type())
        .with_optional(vec![string()])
        .with_rest(boolean());
    let kinds: Vec<_> = (0..4)
        .map(|i| sig.value_formal_for_actual(i).map(|f| f.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(ValueFormalKind::Required),
            Some(ValueFormalKind::Optional),
            Some(ValueFormalKind::Rest),
            Some(ValueFormalKind::Rest),
        ]
    );
    assert_eq!(sig.value_formal_for_actual(3).map(|f| f.ty), Some(boolean()));

    let closed = Signature::new(vec![int()], void_type());
    assert_eq!(closed.value_formal_for_actual(1), None);
    assert!(ValueFormalKind::Rest.is_optional());
    assert!(!ValueFormalKind::Required.is_optional());
}

#[test]
fn test_input_names_may_be_short() {
    let sig = Signature::new(vec![int(), int()], int()).with_input_names(vec![Some("x".into())]);
    assert_eq!(sig.input_name(0), Some("x"));
    assert_eq!(sig.input_name(1), None);
}

#[test]
fn test_render_signature() {
    let store = DefinitionStore::new();
    let sig = Signature::new(vec![int()], boolean())
        .with_optional(vec![string()])
        .with_rest(int().or_null());
    assert_eq!(
        sig.display(&store).to_string(),
        "(Int32, String = ..., ...Int32?) -> Boolean"
    );

    let t = store.declare_formal("T", Variance::Invariant);
    let generic = Signature::new(vec![param(t)], list_of(param(t))).with_type_formals(vec![t]);
    assert_eq!(generic.display(&store).to_string(), "<T>(T) -> List<T>");

    let mut method = Signature::new(vec![string()], int());
    method.has_this_formal = true;
    assert_eq!(method.display(&store).to_string(), "(this: String) -> Int32");
}

#[test]
fn test_callee_priority_order() {
    assert!(CalleePriority::Fallback < CalleePriority::Default);
    let callee = Callee::new(Signature::new(vec![], int())).with_priority(CalleePriority::Fallback);
    assert_eq!(callee.priority, CalleePriority::Fallback);
    assert_eq!(Callee::new(Signature::new(vec![], int())).priority, CalleePriority::Default);
}

fn void_type() -> Type {
    Type::simple(DefId::VOID)
}
