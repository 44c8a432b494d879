// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy factories: stage parameters in, action subtree out.
//!
//! Factories never fail. Parameters they cannot make sense of are left
//! for the actions to report during validation.

pub mod boot;
pub mod deploy;

use crate::definition::JobDefinition;
use ld_core::{JobError, Parameters, DEFAULT_NAMESPACE};
use serde_json::Value;

/// What a factory sees of the job while building one stage.
pub struct StageContext<'a> {
    pub job: &'a JobDefinition,
    pub index: usize,
    pub parameters: &'a Parameters,
    namespace: String,
}

impl<'a> StageContext<'a> {
    pub fn new(job: &'a JobDefinition, index: usize, parameters: &'a Parameters) -> Result<Self, JobError> {
        let namespace = parameters
            .str("namespace")
            .map_err(|e| JobError::Configuration(format!("stage {}: {e}", index + 1)))?
            .unwrap_or(DEFAULT_NAMESPACE)
            .to_string();
        Ok(Self { job, index, parameters, namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Namespace holding the deploy artifacts a boot stage consumes.
    pub fn deploy_namespace(&self) -> Option<&str> {
        self.parameters.str("deploy_namespace").ok().flatten()
    }

    /// Entries of the `images` table that are tables themselves.
    pub fn images(&self) -> Vec<(String, Parameters)> {
        let Ok(Some(images)) = self.parameters.section("images") else {
            return Vec::new();
        };
        images
            .keys()
            .filter_map(|label| match images.section(label) {
                Ok(Some(params)) => Some((label.to_string(), params)),
                _ => None,
            })
            .collect()
    }

    /// Every test definition in the job, in job order.
    pub fn test_definitions(&self) -> Vec<Value> {
        self.job
            .tests()
            .into_iter()
            .filter_map(|params| match params.get("definitions") {
                Some(Value::Array(items)) => Some(items.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Name for a container started by this stage.
    pub fn container_name(&self) -> String {
        match self.parameters.str("container") {
            Ok(Some(name)) => name.to_string(),
            _ => format!("ld-{}-{}", self.namespace, self.index + 1),
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
