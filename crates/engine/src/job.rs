// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job: root of the action tree and owner of the two-phase lifecycle.

use crate::capability::CommandRunner;
use crate::describe::{self, DescriptionRecord};
use crate::runner::{ActionRecord, Runner};
use crate::tree::ActionTree;
use crate::validate::validate_tree;
use ld_core::{ErrorRecord, JobError, JobStatus, NamespaceStore, Parameters};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Engine settings that are not part of the job definition.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub work_dir: PathBuf,
    pub job_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { work_dir: std::env::temp_dir().join("ld"), job_timeout: None }
    }
}

impl EngineConfig {
    ld_core::setters! {
        into { work_dir: PathBuf }
        option { job_timeout: Duration }
    }
}

/// A resolved job.
///
/// `validate()` must succeed before `run()` is accepted; each phase runs
/// once and the status only moves forward.
pub struct Job {
    name: String,
    parameters: Parameters,
    tree: ActionTree,
    store: NamespaceStore,
    status: JobStatus,
    config: EngineConfig,
    commands: Arc<dyn CommandRunner>,
    cancel: CancellationToken,
    history: Vec<ActionRecord>,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        parameters: Parameters,
        tree: ActionTree,
        commands: Arc<dyn CommandRunner>,
        config: EngineConfig,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            tree,
            store: NamespaceStore::new(),
            status: JobStatus::NotStarted,
            config,
            commands,
            cancel: CancellationToken::new(),
            history: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved job-level parameter set.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn tree(&self) -> &ActionTree {
        &self.tree
    }

    pub fn store(&self) -> &NamespaceStore {
        &self.store
    }

    /// Mutable store access, for hosts seeding artifacts before `run()`.
    pub fn store_mut(&mut self) -> &mut NamespaceStore {
        &mut self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Per-action records of the last run, in the order actions were reached.
    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }

    /// Every error recorded on the tree's pipelines.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.tree.errors()
    }

    /// Token that cancels the run at the next action boundary.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobError> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::Usage(format!(
                "job `{}` cannot move from {} to {}",
                self.name, self.status, next
            )));
        }
        tracing::info!(job = %self.name, from = %self.status, to = %next, "job status");
        self.status = next;
        Ok(())
    }

    /// Validate the whole tree, collecting every structural error.
    pub fn validate(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Validating)?;
        let errors = validate_tree(&mut self.tree);
        if errors.is_empty() {
            self.transition(JobStatus::Valid)?;
            tracing::info!(job = %self.name, actions = self.tree.len(), "job is valid");
            Ok(())
        } else {
            self.transition(JobStatus::Invalid)?;
            tracing::warn!(job = %self.name, errors = errors.len(), "job is invalid");
            Err(JobError::Invalid(errors))
        }
    }

    /// Run the validated tree.
    ///
    /// Refused with a usage error unless the job is `Valid`. When the job
    /// timeout expires the run stops and the cleanup actions still run.
    pub async fn run(&mut self) -> Result<(), JobError> {
        if self.status != JobStatus::Valid {
            return Err(JobError::Usage(format!(
                "job `{}` is {}; run() requires a valid job",
                self.name, self.status
            )));
        }
        self.transition(JobStatus::Running)?;
        if let Err(source) = tokio::fs::create_dir_all(&self.config.work_dir).await {
            self.transition(JobStatus::Failed)?;
            return Err(JobError::Configuration(format!(
                "cannot create work dir {}: {source}",
                self.config.work_dir.display()
            )));
        }

        let start = Instant::now();
        let root = self.tree.root();
        let mut runner = Runner {
            tree: &self.tree,
            store: &mut self.store,
            commands: self.commands.as_ref(),
            cancel: &self.cancel,
            work_dir: &self.config.work_dir,
            records: &mut self.history,
        };
        let result = match self.config.job_timeout {
            Some(limit) => {
                let bounded = tokio::time::timeout(limit, runner.run_pipeline(root, None, false)).await;
                match bounded {
                    Ok(result) => result.map(|_| ()),
                    Err(_) => {
                        tracing::warn!(job = %self.name, after_s = limit.as_secs(), "job timed out, running cleanup");
                        runner.interrupted(root, 0).await;
                        Err(JobError::JobTimeout { after: limit })
                    }
                }
            }
            None => runner.run_pipeline(root, None, false).await.map(|_| ()),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(()) => {
                self.transition(JobStatus::Complete)?;
                tracing::info!(job = %self.name, elapsed_ms, "job complete");
            }
            Err(e @ JobError::Canceled { .. }) => {
                self.transition(JobStatus::Canceled)?;
                tracing::warn!(job = %self.name, elapsed_ms, error = %e, "job canceled");
            }
            Err(e) => {
                self.transition(JobStatus::Failed)?;
                tracing::error!(job = %self.name, elapsed_ms, error = %e, "job failed");
            }
        }
        result
    }

    /// Describe the resolved tree; see [`describe::describe`].
    pub fn describe(&self, resolve_artifacts: bool) -> Vec<DescriptionRecord> {
        describe::describe(&self.tree, &self.store, resolve_artifacts)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
