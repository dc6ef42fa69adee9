use super::*;

#[test]
fn test_lower_and_upper_become_common() {
    let mut set: BoundSet<&str> = BoundSet::new();
    assert!(set.add("Int32", BoundKind::Lower));
    assert!(!set.add("Int32", BoundKind::Lower));
    assert!(set.add("Int32", BoundKind::Upper));
    assert!(set.lower().is_empty());
    assert!(set.upper().is_empty());
    assert_eq!(set.common().len(), 1);
    assert!(!set.add("Int32", BoundKind::Upper));
    assert_eq!(set.kind_of(&"Int32"), Some(BoundKind::Common));
}

#[test]
fn test_common_absorbs_directional_bounds() {
    let mut set = BoundSet::new();
    set.add("a", BoundKind::Upper);
    set.add("a", BoundKind::Common);
    assert!(set.upper().is_empty());
    assert!(set.contains(&"a", BoundKind::Upper));
    assert!(set.contains(&"a", BoundKind::Lower));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_obviated_bounds_stay_out() {
    let mut set = BoundSet::new();
    set.add("Int32", BoundKind::Lower);
    set.obviate(&"Int32", BoundKind::Lower);
    assert!(set.is_empty());
    assert!(!set.add("Int32", BoundKind::Lower));
    // Only the obviated kind is refused.
    assert!(set.add("Int32", BoundKind::Upper));
    assert_eq!(set.kind_of(&"Int32"), Some(BoundKind::Upper));
}

#[test]
fn test_iteration_order() {
    let mut set = BoundSet::new();
    set.add("lo", BoundKind::Lower);
    set.add("hi", BoundKind::Upper);
    set.add("eq", BoundKind::Common);
    let kinds: Vec<_> = set.iter().map(|(b, k)| (*b, k)).collect();
    assert_eq!(
        kinds,
        vec![
            ("hi", BoundKind::Upper),
            ("eq", BoundKind::Common),
            ("lo", BoundKind::Lower),
        ]
    );
    assert_eq!(set.to_vec().len(), 3);
    assert_eq!(set.kind_of(&"missing"), None);
}

#[test]
fn test_stamp() {
    let mut set: BoundSet<u8> = BoundSet::new();
    assert_eq!(set.last_changed_stamp(), 0);
    set.touch(7);
    assert_eq!(set.last_changed_stamp(), 7);
}

#[test]
fn test_reverse() {
    assert_eq!(BoundKind::Upper.reverse(), BoundKind::Lower);
    assert_eq!(BoundKind::Lower.reverse(), BoundKind::Upper);
    assert_eq!(BoundKind::Common.reverse(), BoundKind::Common);
}
