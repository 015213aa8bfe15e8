// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Rule pipeline specs: YAML files through the resolver, the cache, and the
//! evaluator behave like the documented reference semantics.

use serde_json::json;

use dn_rules::{CompiledRules, RuleResolver};

fn write_rules(dir: &std::path::Path, yaml: &str) {
    let rules = dir.join("rules");
    std::fs::create_dir_all(&rules).unwrap();
    std::fs::write(rules.join("base.yml"), yaml).unwrap();
}

#[test]
fn yaml_to_cache_to_evaluation_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    write_rules(
        dir.path(),
        r#"
- name: user-42
  conditions:
    - key: context.user.id
      type: exact
      value: "42"
  stdout: true
  pipelines: [p1]
- name: errors-anywhere
  conditions:
    - key: level
      type: exact
      value: ERROR
    - key: message
      type: partial
      value: timeout
  any_condition_match: true
  pipelines: [p2]
"#,
    );

    let resolver = RuleResolver::new(dir.path());
    let built = resolver.load();
    // a second load reads the JSON cache and must agree exactly
    let cached = RuleResolver::new(dir.path()).load();
    assert_eq!(built, cached);

    let rules = CompiledRules::compile(&built);

    let payload = json!({
        "message": "db timeout",
        "level": "INFO",
        "context": {"user": {"id": "42"}},
    });
    let (pipelines, stdout) = rules.evaluate(&payload);
    assert_eq!(pipelines, vec!["p1".to_string(), "p2".to_string()]);
    assert!(stdout);

    let payload = json!({"message": "fine", "level": "INFO", "context": {}});
    assert_eq!(rules.evaluate(&payload), (vec![], false));
}

#[test]
fn negated_regex_matches_everything_but_the_prefix() {
    let dir = tempfile::tempdir().unwrap();
    write_rules(
        dir.path(),
        r#"
- conditions:
    - key: message
      type: regex
      negate: true
      value: "^debug-"
  pipelines: [p1]
"#,
    );
    let rules = CompiledRules::compile(&RuleResolver::new(dir.path()).load());

    // prefix match → negated → no action
    assert_eq!(rules.evaluate(&json!({"message": "debug-ping"})), (vec![], false));
    // other values match
    assert_eq!(
        rules.evaluate(&json!({"message": "error-ping"})).0,
        vec!["p1".to_string()]
    );
    // missing key: the None value is false before negation, true after
    assert_eq!(rules.evaluate(&json!({})).0, vec!["p1".to_string()]);
}

#[test]
fn evaluation_is_pure_across_repeated_calls() {
    let dir = tempfile::tempdir().unwrap();
    write_rules(
        dir.path(),
        r#"
- conditions:
    - key: level
      type: exact
      value: ERROR
  stdout: true
  pipelines: [p-z, p-a]
"#,
    );
    let rules = CompiledRules::compile(&RuleResolver::new(dir.path()).load());
    let payload = json!({"message": "x", "level": "ERROR"});

    let first = rules.evaluate(&payload);
    for _ in 0..25 {
        assert_eq!(rules.evaluate(&payload), first);
    }
}
