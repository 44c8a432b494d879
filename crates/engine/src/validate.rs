// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Depth-first validation of an action tree.
//!
//! Every action is validated, even after earlier failures, so one pass
//! reports every structural problem. Errors land on the pipeline that
//! holds the failing action.

use crate::action::Findings;
use crate::tree::ActionTree;
use ld_core::{ArtifactKind, DataKey, ErrorCategory, ErrorRecord, StoreError};
use std::collections::HashMap;

/// Validate every node in pre-order and return all errors found.
///
/// Besides each action's own checks, declared inputs are compared against
/// the outputs declared by earlier actions: an input consuming a different
/// kind than its producer writes is a type mismatch. Inputs with no
/// declared producer are not an error here; they may be seeded by the
/// host and are checked when read during run.
pub fn validate_tree(tree: &mut ActionTree) -> Vec<ErrorRecord> {
    let mut produced: HashMap<DataKey, (ArtifactKind, String)> = HashMap::new();
    let mut found = Vec::new();

    for id in tree.preorder() {
        let node = tree.node(id);
        let mut findings = Findings::new();
        node.action.validate(&mut findings);

        let mut records: Vec<ErrorRecord> = findings
            .into_errors()
            .into_iter()
            .map(|e| ErrorRecord {
                action: node.name().to_string(),
                level: node.level.clone(),
                category: e.validation_category(),
                message: e.to_string(),
            })
            .collect();

        for input in node.action.inputs() {
            let key = input.resolve(&node.namespace);
            if let Some((kind, producer)) = produced.get(&key) {
                if *kind != input.kind {
                    let err = StoreError::TypeMismatch {
                        key: key.clone(),
                        expected: input.kind,
                        found: *kind,
                    };
                    records.push(ErrorRecord {
                        action: node.name().to_string(),
                        level: node.level.clone(),
                        category: ErrorCategory::TypeMismatch,
                        message: format!("{err} (written by {producer})"),
                    });
                }
            }
        }
        for output in node.action.outputs() {
            produced.insert(output.resolve(&node.namespace), (output.kind, node.name().to_string()));
        }

        let pipeline = node.pipeline;
        for record in records {
            tracing::warn!(
                level = %record.level,
                action = %record.action,
                category = %record.category,
                "{}",
                record.message
            );
            found.push(record.clone());
            tree.record_error(pipeline, record);
        }
    }
    found
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
