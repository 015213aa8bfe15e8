// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Evaluation of a compiled rule table against a log payload.
//!
//! Evaluation is pure and infallible: regexes are compiled up front (clauses
//! with unloadable patterns are dropped with a diagnostic), value lookups
//! that miss yield a no-match, and the result for a given table and payload
//! is always the same `(pipelines, stdout)` pair.

use std::borrow::Cow;
use std::collections::BTreeSet;

use regex::Regex;
use serde_json::Value;

use crate::model::{Action, Condition, ConditionType, RuleTable};

/// A rule table with every REGEX pattern pre-compiled, ready to evaluate.
#[derive(Debug, Default)]
pub struct CompiledRules {
    groups: Vec<CompiledGroup>,
}

#[derive(Debug)]
struct CompiledGroup {
    action: Action,
    clauses: Vec<CompiledClause>,
}

#[derive(Debug)]
struct CompiledClause {
    any_match: bool,
    conditions: Vec<CompiledCondition>,
}

#[derive(Debug)]
struct CompiledCondition {
    path: Vec<String>,
    kind: ConditionType,
    negate: bool,
    value: String,
    /// Present iff `kind` is [`ConditionType::Regex`].
    regex: Option<Regex>,
}

impl CompiledRules {
    /// Compile a table. Clauses containing a REGEX condition whose pattern
    /// does not compile are dropped with a warning; groups left with no
    /// clauses are dropped too.
    pub fn compile(table: &RuleTable) -> Self {
        let mut groups = Vec::with_capacity(table.groups.len());
        for group in &table.groups {
            if group.action.is_empty() {
                continue;
            }
            let clauses: Vec<CompiledClause> = group
                .rules
                .iter()
                .filter_map(|clause| {
                    let conditions = clause
                        .conditions
                        .iter()
                        .map(compile_condition)
                        .collect::<Result<Vec<_>, _>>();
                    match conditions {
                        Ok(conditions) => Some(CompiledClause {
                            any_match: clause.any_condition_match,
                            conditions,
                        }),
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping rule clause with invalid regex");
                            None
                        }
                    }
                })
                .collect();
            if !clauses.is_empty() {
                groups.push(CompiledGroup { action: group.action.clone(), clauses });
            }
        }
        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Evaluate a payload: union the pipelines and OR the stdout flag of
    /// every group with at least one matching clause.
    pub fn evaluate(&self, payload: &Value) -> (Vec<String>, bool) {
        let mut pipelines = BTreeSet::new();
        let mut stdout = false;

        for group in &self.groups {
            if group.clauses.iter().any(|clause| clause_matches(clause, payload)) {
                pipelines.extend(group.action.pipelines.iter().cloned());
                stdout = stdout || group.action.stdout;
            }
        }

        (pipelines.into_iter().collect(), stdout)
    }
}

fn compile_condition(cond: &Condition) -> Result<CompiledCondition, regex::Error> {
    let regex = match cond.kind {
        // Anchor at the start: first-match-at-string-start semantics.
        ConditionType::Regex => Some(Regex::new(&format!("^(?:{})", cond.value))?),
        _ => None,
    };
    Ok(CompiledCondition {
        path: cond.key.split('.').map(str::to_string).collect(),
        kind: cond.kind,
        negate: cond.negate,
        value: cond.value.clone(),
        regex,
    })
}

fn clause_matches(clause: &CompiledClause, payload: &Value) -> bool {
    if clause.any_match {
        clause.conditions.iter().any(|c| condition_matches(c, payload))
    } else {
        clause.conditions.iter().all(|c| condition_matches(c, payload))
    }
}

fn condition_matches(cond: &CompiledCondition, payload: &Value) -> bool {
    let matched = match nested_value(payload, &cond.path) {
        None => false,
        Some(value) => match cond.kind {
            ConditionType::Exact => matches!(value, Value::String(s) if *s == cond.value),
            ConditionType::Partial => value_str(value).contains(&cond.value),
            ConditionType::Regex => match &cond.regex {
                Some(regex) => regex.is_match(&value_str(value)),
                None => false,
            },
        },
    };
    if cond.negate {
        !matched
    } else {
        matched
    }
}

/// Walk a dotted path through nested objects. Any missing segment,
/// traversal through a non-object, or explicit null yields `None`.
fn nested_value<'a>(payload: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = payload;
    for segment in path {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// String form of a payload value: strings as-is, everything else rendered
/// as JSON.
fn value_str(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
