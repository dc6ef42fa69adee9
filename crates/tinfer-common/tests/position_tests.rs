use super::*;

#[test]
fn test_spanning_same_file() {
    let a = Position::new("main.tm", 4, 9);
    let b = Position::new("main.tm", 12, 20);
    let joined = a.spanning(&b);
    assert_eq!(joined.left, 4);
    assert_eq!(joined.right, 20);
    assert_eq!(joined.len(), 16);
}

#[test]
fn test_spanning_other_file_keeps_self() {
    let a = Position::new("a.tm", 1, 2);
    let b = Position::new("b.tm", 0, 100);
    assert_eq!(a.spanning(&b), a);
}

#[test]
fn test_spanning_all() {
    let ps = [
        Position::new("f", 30, 31),
        Position::new("f", 10, 12),
        Position::new("f", 20, 25),
    ];
    let joined = Position::spanning_all(&ps).expect("non-empty");
    assert_eq!((joined.left, joined.right), (10, 31));
    assert!(Position::spanning_all(std::iter::empty()).is_none());
}

#[test]
fn test_inverted_range_is_clamped() {
    let p = Position::new("f", 8, 3);
    assert!(p.is_empty());
    assert_eq!(p.to_string(), "f:8+0");
}
