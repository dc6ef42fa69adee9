use super::*;

#[test]
fn test_format_message_replaces_placeholders() {
    assert_eq!(format_message("{0} and {1}", &["a", "b"]), "a and b");
    assert_eq!(format_message("{1}{0}{1}", &["x", "y"]), "yxy");
}

#[test]
fn test_diagnostic_message_renders_list_args() {
    let d = Diagnostic::error(
        MessageTemplate::NoCalleeMatching,
        Position::new("t", 0, 5),
        vec![
            DiagnosticArg::list(["Int32", "String"]),
            DiagnosticArg::list(Vec::<String>::new()),
        ],
    );
    assert_eq!(d.level, Level::Error);
    assert_eq!(
        d.message(),
        "No callee matches inputs [Int32, String]; candidates were []"
    );
}

#[test]
fn test_collecting_sink_keeps_order() {
    let sink = CollectingSink::new();
    assert!(sink.is_empty());
    for n in 0..3usize {
        sink.log(&Diagnostic::error(
            MessageTemplate::NoFormalForActual,
            Position::unknown(),
            vec![n.into()],
        ));
    }
    let entries = sink.entries();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[2].args, vec![DiagnosticArg::Int(2)]);
}

#[test]
fn test_diagnostic_json_shape() {
    let d = Diagnostic::error(
        MessageTemplate::DuplicateName,
        Position::new("m", 1, 2),
        vec!["x".into()],
    );
    let json = d.to_json().expect("serializes");
    assert!(json.contains("\"template\":\"DuplicateName\""));
    assert!(json.contains("\"args\":[\"x\"]"));
}
