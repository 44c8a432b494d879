// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turn a job definition into a resolved job.

use crate::actions::Finalize;
use crate::definition::{JobDefinition, Timeouts};
use crate::registry::StrategyRegistry;
use crate::stages::StageContext;
use ld_core::{JobError, DEFAULT_NAMESPACE};
use ld_engine::{ActionSpec, ActionTree, ArtifactRef, CommandRunner, EngineConfig, Job};
use std::sync::Arc;

/// Build the action tree: one subtree per stage, then `finalize`.
pub fn resolve(definition: &JobDefinition, registry: &StrategyRegistry) -> Result<ActionTree, JobError> {
    registry.check()?;

    let mut specs = Vec::with_capacity(definition.actions.len() + 1);
    for (index, stage) in definition.actions.iter().enumerate() {
        let ctx = StageContext::new(definition, index, stage.parameters())?;
        specs.push(registry.select(stage.kind(), &ctx)?);
    }
    let containers = specs.iter_mut().flat_map(containers).collect();
    specs.push(ActionSpec::new(Finalize::new(containers), DEFAULT_NAMESPACE).cleanup());

    let mut tree = ActionTree::new();
    for mut spec in specs {
        apply_timeouts(&mut spec, &definition.timeouts);
        tree.push(tree.root(), spec)?;
    }
    Ok(tree)
}

/// Resolve `definition` into a job ready for validation.
///
/// A job timeout in the definition applies unless `config` already sets one.
pub fn build_job(
    definition: &JobDefinition,
    registry: &StrategyRegistry,
    commands: Arc<dyn CommandRunner>,
    config: EngineConfig,
) -> Result<Job, JobError> {
    let tree = resolve(definition, registry)?;
    let config = match (config.job_timeout, definition.timeouts.job()) {
        (None, Some(timeout)) => config.job_timeout(timeout),
        _ => config,
    };
    tracing::info!(job = %definition.name, actions = tree.len(), "job resolved");
    Ok(Job::new(definition.name.clone(), definition.job_parameters(), tree, commands, config))
}

fn apply_timeouts(spec: &mut ActionSpec, timeouts: &Timeouts) {
    spec.visit_mut(&mut |spec| {
        let default = spec.timeout.or_else(|| spec.action.default_timeout());
        spec.timeout = timeouts.resolve(spec.name(), default);
    });
}

/// Container ids the subtree may publish, pinned to their namespace.
fn containers(spec: &mut ActionSpec) -> Vec<ArtifactRef> {
    let mut found = Vec::new();
    spec.visit_mut(&mut |spec| {
        for output in spec.action.outputs() {
            if output.label == "container" && output.key == "id" {
                let namespace = output.namespace.clone().unwrap_or_else(|| spec.namespace.clone());
                found.push(output.in_namespace(namespace));
            }
        }
    });
    found
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
