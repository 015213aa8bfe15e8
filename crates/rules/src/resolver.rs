// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Loads raw rule files, normalizes them and produces the compiled table.
//!
//! Raw rules bucket by their [`Action`]: any-match conditions merge into one
//! deduplicated set per action, all-match condition sets collapse literal
//! duplicates. The result is cached as `.rules.resolved.json` and reloaded
//! verbatim on later starts.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use dn_core::paths::{resolved_rules_path, rules_dir};

use crate::model::{Action, Condition, RawRule, RuleClause, RuleGroup, RuleTable};

pub struct RuleResolver {
    datanadhi_dir: PathBuf,
}

#[derive(Default)]
struct Bucket {
    /// Merged conditions of every any-match rule for this action.
    any: BTreeSet<Condition>,
    /// One entry per distinct all-match condition set.
    all: BTreeSet<BTreeSet<Condition>>,
}

impl RuleResolver {
    pub fn new(datanadhi_dir: impl Into<PathBuf>) -> Self {
        Self { datanadhi_dir: datanadhi_dir.into() }
    }

    /// Load the compiled table: the JSON cache when present, otherwise a
    /// fresh build from the rule files (which also writes the cache).
    ///
    /// Never fails: unreadable caches are rebuilt, unparseable files and
    /// invalid rules are skipped with a diagnostic.
    pub fn load(&self) -> RuleTable {
        let cache = resolved_rules_path(&self.datanadhi_dir);
        if cache.exists() {
            match std::fs::read(&cache).map_err(|e| e.to_string()).and_then(|bytes| {
                serde_json::from_slice::<RuleTable>(&bytes).map_err(|e| e.to_string())
            }) {
                Ok(table) => return table,
                Err(e) => {
                    tracing::warn!(path = %cache.display(), error = %e, "rules cache unreadable, rebuilding");
                }
            }
        }
        self.build()
    }

    /// Build the table from `rules/*.{yml,yaml}` and write the cache.
    pub fn build(&self) -> RuleTable {
        let mut buckets: BTreeMap<Action, Bucket> = BTreeMap::new();

        for path in rule_file_paths(&rules_dir(&self.datanadhi_dir)) {
            self.collect_file(&path, &mut buckets);
        }

        let table = to_table(buckets);
        self.write_cache(&table);
        table
    }

    fn collect_file(&self, path: &Path, buckets: &mut BTreeMap<Action, Bucket>) {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable rule file");
                return;
            }
        };
        let docs: Vec<serde_yaml::Value> = match serde_yaml::from_str(&text) {
            Ok(serde_yaml::Value::Sequence(seq)) => seq,
            Ok(_) => {
                tracing::warn!(path = %path.display(), "rule file is not a list, skipping");
                return;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping invalid rule file");
                return;
            }
        };

        for doc in docs {
            match serde_yaml::from_value::<RawRule>(doc) {
                Ok(raw) => {
                    if let Some((action, rule)) = validate(raw) {
                        add_rule(buckets, action, rule);
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping malformed rule");
                }
            }
        }
    }

    fn write_cache(&self, table: &RuleTable) {
        let path = resolved_rules_path(&self.datanadhi_dir);
        let result = serde_json::to_vec(table)
            .map_err(|e| e.to_string())
            .and_then(|bytes| std::fs::write(&path, bytes).map_err(|e| e.to_string()));
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to write rules cache");
        }
    }
}

/// Validate and normalize one raw rule.
///
/// Dropped: rules with no conditions, rules whose action is empty, and rules
/// containing a REGEX condition that does not compile. A single-condition
/// rule is treated as any-match.
fn validate(mut raw: RawRule) -> Option<(Action, RawRule)> {
    if raw.conditions.is_empty() {
        return None;
    }
    let action =
        Action { stdout: raw.stdout, pipelines: raw.pipelines.iter().cloned().collect() };
    if action.is_empty() {
        return None;
    }
    for cond in &raw.conditions {
        if cond.kind == crate::ConditionType::Regex {
            if let Err(e) = regex::Regex::new(&cond.value) {
                tracing::warn!(pattern = %cond.value, error = %e, "dropping rule with invalid regex");
                return None;
            }
        }
    }
    if raw.conditions.len() == 1 {
        raw.any_condition_match = true;
    }
    Some((action, raw))
}

fn add_rule(buckets: &mut BTreeMap<Action, Bucket>, action: Action, rule: RawRule) {
    let bucket = buckets.entry(action).or_default();
    if rule.any_condition_match {
        bucket.any.extend(rule.conditions);
    } else {
        bucket.all.insert(rule.conditions.into_iter().collect());
    }
}

fn to_table(buckets: BTreeMap<Action, Bucket>) -> RuleTable {
    let mut groups = Vec::with_capacity(buckets.len());
    for (action, bucket) in buckets {
        let mut rules = Vec::new();
        if !bucket.any.is_empty() {
            rules.push(RuleClause {
                any_condition_match: true,
                conditions: bucket.any.into_iter().collect(),
            });
        }
        for set in bucket.all {
            rules.push(RuleClause {
                any_condition_match: false,
                conditions: set.into_iter().collect(),
            });
        }
        groups.push(RuleGroup { action, rules });
    }
    RuleTable { groups }
}

/// All rule files under `dir`, sorted for a deterministic build order.
fn rule_file_paths(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml") | Some("yaml")
            )
        })
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
