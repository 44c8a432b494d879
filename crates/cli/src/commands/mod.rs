// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod describe;
pub mod run;
pub mod strategies;
pub mod validate;

use anyhow::{Context, Result};
use ld_engine::{CommandRunner, EngineConfig, Job, LocalCommandRunner};
use ld_strategies::{build_job, JobDefinition, StrategyRegistry};
use std::path::Path;
use std::sync::Arc;

/// Load a job definition and resolve it against the builtin strategies.
pub(crate) fn load_job(path: &Path, config: EngineConfig) -> Result<Job> {
    let definition = JobDefinition::load(path)?;
    let registry = StrategyRegistry::builtin();
    let commands: Arc<dyn CommandRunner> = Arc::new(LocalCommandRunner::new());
    build_job(&definition, &registry, commands, config)
        .with_context(|| format!("failed to resolve {}", path.display()))
}
