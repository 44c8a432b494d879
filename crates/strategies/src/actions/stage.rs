// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level action owning a stage's sub-pipeline.

use super::artifacts;
use async_trait::async_trait;
use ld_core::{ActionError, ParamError, Parameters};
use ld_engine::{Action, ArtifactRef, Connection, Findings, RunContext};

/// Parent of a deploy or boot sub-pipeline.
///
/// Checks stage-wide parameters and, for deploys, records each image's
/// root partition in the store for the overlay step to pick up.
pub struct StageAction {
    name: &'static str,
    summary: &'static str,
    description: &'static str,
    parameters: Parameters,
    images: Vec<&'static str>,
    needs_images: bool,
    root_partitions: Vec<(String, i64)>,
}

impl StageAction {
    pub fn new(
        name: &'static str,
        summary: &'static str,
        description: &'static str,
        parameters: Parameters,
    ) -> Self {
        Self {
            name,
            summary,
            description,
            parameters,
            images: Vec::new(),
            needs_images: false,
            root_partitions: Vec::new(),
        }
    }

    /// Require an `images` table containing at least these labels.
    pub fn requires_images(mut self, labels: &[&'static str]) -> Self {
        self.needs_images = true;
        self.images.extend_from_slice(labels);
        self
    }

    /// Publish `partition` as the root partition of image `label`.
    pub fn root_partition(mut self, label: &str, partition: i64) -> Self {
        self.root_partitions.push((label.to_string(), partition));
        self
    }

    /// Reference to the root partition this stage records for `label`.
    pub fn root_partition_ref(&self, label: &str) -> ArtifactRef {
        artifacts::root_partition(self.name, label)
    }
}

#[async_trait]
impl Action for StageAction {
    fn name(&self) -> &str {
        self.name
    }

    fn summary(&self) -> &str {
        self.summary
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        self.root_partitions.iter().map(|(label, _)| self.root_partition_ref(label)).collect()
    }

    fn validate(&self, findings: &mut Findings) {
        if !self.needs_images {
            return;
        }
        match findings.check(self.parameters.section("images")) {
            Some(Some(images)) if images.is_empty() => {
                findings.push(ActionError::failed("`images` must name at least one image"));
            }
            Some(Some(images)) => {
                for label in images.keys() {
                    if !matches!(images.get(label), Some(serde_json::Value::Object(_))) {
                        findings.push(ParamError::Invalid {
                            name: format!("images.{label}"),
                            expected: "a table",
                        });
                    }
                }
                for label in &self.images {
                    if !images.contains(label) {
                        findings.push(ParamError::Missing(format!("images.{label}")));
                    }
                }
            }
            Some(None) => findings.push(ParamError::Missing("images".to_string())),
            None => {}
        }
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        for (label, partition) in &self.root_partitions {
            tracing::debug!(image = %label, partition, "recording root partition");
            ctx.publish(&self.root_partition_ref(label), *partition);
        }
        Ok(connection)
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
