use super::*;

#[test]
fn test_defaults() {
    let config = SolverConfig::default();
    assert_eq!(config.max_rounds, MAX_SOLVE_ROUNDS);
    assert_eq!(config.max_subtype_depth, MAX_SUBTYPE_DEPTH);
    assert_eq!(config.worst_case_optimism, Optimism::Pessimistic);
    assert!(!config.dump_rounds);
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = SolverConfig::from_json(r#"{ "maxRounds": 5, "worstCaseOptimism": "Optimistic" }"#)
        .expect("valid config");
    assert_eq!(config.max_rounds, 5);
    assert_eq!(config.worst_case_optimism, Optimism::Optimistic);
    assert_eq!(config.max_subtype_depth, MAX_SUBTYPE_DEPTH);
}

#[test]
fn test_json_uses_camel_case() {
    let config = SolverConfig {
        dump_rounds: true,
        ..SolverConfig::default()
    };
    let json = config.to_json().expect("serializes");
    assert!(json.contains("\"dumpRounds\": true"));
    assert_eq!(SolverConfig::from_json(&json).expect("parses"), config);
}

#[test]
fn test_bad_json_is_an_error() {
    assert!(SolverConfig::from_json("{ \"maxRounds\": \"many\" }").is_err());
    assert!(SolverConfig::from_json("not json").is_err());
}
