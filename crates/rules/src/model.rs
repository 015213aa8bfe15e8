// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Rule data model, in both raw (per-file) and compiled (bucketed) form.
//!
//! The compiled form is what `.rules.resolved.json` stores: a list of
//! [`RuleGroup`]s, each pairing one deduplicated [`Action`] with the clauses
//! that can trigger it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

fn is_false(v: &bool) -> bool {
    !*v
}

/// How a condition value is compared against the payload value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConditionType {
    Exact,
    Partial,
    Regex,
}

/// A single predicate over one dotted key path of the log payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Condition {
    /// Dotted path into the payload, e.g. `context.user.id`.
    pub key: String,
    #[serde(rename = "type")]
    pub kind: ConditionType,
    #[serde(default, skip_serializing_if = "is_false")]
    pub negate: bool,
    pub value: String,
}

/// What happens when a group matches: emit to stdout and/or trigger pipelines.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Action {
    #[serde(default, skip_serializing_if = "is_false")]
    pub stdout: bool,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub pipelines: BTreeSet<String>,
}

impl Action {
    /// An action with neither stdout nor pipelines does nothing and is
    /// discarded at compile time.
    pub fn is_empty(&self) -> bool {
        !self.stdout && self.pipelines.is_empty()
    }
}

/// One clause of a group: an any-match or all-match set of conditions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleClause {
    #[serde(default, skip_serializing_if = "is_false")]
    pub any_condition_match: bool,
    pub conditions: Vec<Condition>,
}

/// An action with every clause that can trigger it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleGroup {
    pub action: Action,
    pub rules: Vec<RuleClause>,
}

/// The compiled rule table, shared-immutable after build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RuleTable {
    pub groups: Vec<RuleGroup>,
}

impl RuleTable {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A rule as written in a `rules/*.yml` file, before validation.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRule {
    #[serde(default)]
    #[allow(dead_code)] // accepted in rule files, unused after validation
    pub name: Option<String>,
    #[serde(default)]
    pub any_condition_match: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub stdout: bool,
    #[serde(default)]
    pub pipelines: Vec<String>,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
