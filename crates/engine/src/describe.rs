// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical description of a resolved action tree.
//!
//! The rendered form is pretty JSON in a fixed field order, with sorted
//! parameter keys and a trailing newline. It is byte-stable for a given
//! job definition and is compared against stored fixtures to catch
//! unintended changes to the pipeline shape.

use crate::tree::ActionTree;
use ld_core::{Artifact, Level, NamespaceStore, Parameters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Description of one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    pub level: Level,
    pub name: String,
    pub summary: String,
    pub description: String,
    pub namespace: String,
    /// Resolved timeout in whole seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cleanup: bool,
    /// Bound parameters; present only when artifacts are resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    /// Declared inputs and outputs present in the store, keyed by address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<BTreeMap<String, Artifact>>,
}

/// Describe every action in level order.
///
/// With `resolve_artifacts` unset, nothing read from the namespace store is
/// included, so the output is available right after validation.
pub fn describe(
    tree: &ActionTree,
    store: &NamespaceStore,
    resolve_artifacts: bool,
) -> Vec<DescriptionRecord> {
    let mut records: Vec<DescriptionRecord> = tree
        .preorder()
        .into_iter()
        .map(|id| {
            let node = tree.node(id);
            let action = &node.action;
            let (parameters, artifacts) = if resolve_artifacts {
                let mut found = BTreeMap::new();
                for reference in action.inputs().into_iter().chain(action.outputs()) {
                    let key = reference.resolve(&node.namespace);
                    if let Ok(value) = store.get(&key) {
                        found.insert(key.to_string(), value.clone());
                    }
                }
                (Some(action.parameters().clone()), Some(found))
            } else {
                (None, None)
            };
            DescriptionRecord {
                level: node.level.clone(),
                name: action.name().to_string(),
                summary: action.summary().to_string(),
                description: action.description().to_string(),
                namespace: node.namespace.clone(),
                timeout: node.timeout.map(|t| t.as_secs()),
                cleanup: node.cleanup,
                parameters,
                artifacts,
            }
        })
        .collect();
    records.sort_by(|a, b| a.level.cmp(&b.level));
    records
}

/// Render records in the canonical fixture format.
pub fn render(records: &[DescriptionRecord]) -> Result<String, serde_json::Error> {
    let mut out = serde_json::to_string_pretty(records)?;
    out.push('\n');
    Ok(out)
}

/// Parse a fixture written by [`render`].
pub fn parse(text: &str) -> Result<Vec<DescriptionRecord>, serde_json::Error> {
    serde_json::from_str(text)
}

/// First line where `actual` and `expected` differ, as `(line number, expected, actual)`.
pub fn first_difference<'t>(expected: &'t str, actual: &'t str) -> Option<(usize, &'t str, &'t str)> {
    let mut exp = expected.lines();
    let mut act = actual.lines();
    let mut line = 1;
    loop {
        match (exp.next(), act.next()) {
            (None, None) => return None,
            (e, a) if e != a => return Some((line, e.unwrap_or(""), a.unwrap_or(""))),
            _ => line += 1,
        }
    }
}

#[cfg(test)]
#[path = "describe_tests.rs"]
mod tests;
