// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Depth-first execution of a validated action tree.
//!
//! Actions run strictly in pre-order. A node runs its own step, then its
//! sub-pipeline with the connection its step returned. The first failure
//! in a pipeline aborts the remaining siblings except those marked
//! cleanup, which still run (including cleanup nodes nested under skipped
//! siblings). The first error is what the pipeline reports.
//!
//! A timeout drops the in-flight step. Records it left open are closed as
//! canceled and the cleanup actions it never reached run afterwards.

use crate::action::Connection;
use crate::capability::CommandRunner;
use crate::context::RunContext;
use crate::tree::{ActionTree, NodeId, PipelineId};
use ld_core::{JobError, Level, NamespaceStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Outcome of one action in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum ActionOutcome {
    Running,
    Completed,
    Failed(String),
    Skipped,
    Canceled,
}

ld_core::simple_display! {
    ActionOutcome {
        Running => "running",
        Completed => "completed",
        Failed(..) => "failed",
        Skipped => "skipped",
        Canceled => "canceled",
    }
}

/// Record of one visited action, in the order actions were reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub level: Level,
    pub name: String,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
    pub elapsed_ms: u64,
}

type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<Option<Connection>, JobError>> + 'a>>;

/// Mutable state threaded through one run.
pub(crate) struct Runner<'a> {
    pub(crate) tree: &'a ActionTree,
    pub(crate) store: &'a mut NamespaceStore,
    pub(crate) commands: &'a dyn CommandRunner,
    pub(crate) cancel: &'a CancellationToken,
    pub(crate) work_dir: &'a Path,
    pub(crate) records: &'a mut Vec<ActionRecord>,
}

impl<'a> Runner<'a> {
    /// Run every action of `pipeline`.
    ///
    /// With `aborted` set only cleanup actions run; others are recorded as
    /// skipped and their sub-pipelines searched for cleanup actions.
    pub(crate) fn run_pipeline<'s>(
        &'s mut self,
        pipeline: PipelineId,
        connection: Option<Connection>,
        aborted: bool,
    ) -> RunFuture<'s> {
        Box::pin(async move {
            let tree = self.tree;
            let mut failure: Option<JobError> = None;
            let mut connection = connection;

            for &id in tree.pipeline(pipeline).actions() {
                let node = tree.node(id);
                let skipping = aborted || failure.is_some();
                if skipping && !node.cleanup {
                    self.skip(id).await;
                    continue;
                }
                match self.run_node(id, connection.clone()).await {
                    Ok(next) => {
                        if !skipping {
                            connection = next;
                        }
                    }
                    Err(e) if failure.is_none() && !aborted => failure = Some(e),
                    Err(e) => {
                        tracing::error!(level = %node.level, action = node.name(), error = %e, "cleanup failed after earlier error");
                    }
                }
            }

            match failure {
                Some(e) => Err(e),
                None => Ok(connection),
            }
        })
    }

    /// Record a skipped node and run any cleanup actions beneath it.
    fn skip<'s>(&'s mut self, id: NodeId) -> Pin<Box<dyn Future<Output = ()> + 's>> {
        Box::pin(async move {
            let node = self.tree.node(id);
            tracing::info!(level = %node.level, action = node.name(), "skipped");
            self.records.push(ActionRecord {
                level: node.level.clone(),
                name: node.name().to_string(),
                outcome: ActionOutcome::Skipped,
                elapsed_ms: 0,
            });
            if let Some(child) = node.child {
                // Errors from cleanup under an aborted branch are logged inside.
                let _ = self.run_pipeline(child, None, true).await;
            }
        })
    }

    /// Recover `pipeline` after a timeout dropped its run.
    ///
    /// Records from `first` on that are still running become canceled. Then
    /// cleanup actions that were never reached run; unreached actions are
    /// recorded as skipped.
    pub(crate) fn interrupted<'s>(
        &'s mut self,
        pipeline: PipelineId,
        first: usize,
    ) -> Pin<Box<dyn Future<Output = ()> + 's>> {
        Box::pin(async move {
            let mut reached = HashSet::new();
            for record in self.records.iter_mut().skip(first) {
                if record.outcome == ActionOutcome::Running {
                    tracing::warn!(level = %record.level, action = %record.name, "interrupted by timeout");
                    record.outcome = ActionOutcome::Canceled;
                }
                reached.insert(record.level.clone());
            }
            self.finish_unreached(pipeline, &reached).await;
        })
    }

    fn finish_unreached<'s>(
        &'s mut self,
        pipeline: PipelineId,
        reached: &'s HashSet<Level>,
    ) -> Pin<Box<dyn Future<Output = ()> + 's>> {
        Box::pin(async move {
            let tree = self.tree;
            for &id in tree.pipeline(pipeline).actions() {
                let node = tree.node(id);
                if reached.contains(&node.level) {
                    if let Some(child) = node.child {
                        self.finish_unreached(child, reached).await;
                    }
                } else if node.cleanup {
                    if let Err(e) = self.run_node(id, None).await {
                        tracing::error!(level = %node.level, action = node.name(), error = %e, "cleanup failed after timeout");
                    }
                } else {
                    self.skip(id).await;
                }
            }
        })
    }

    /// Run one node's step and then its sub-pipeline, bounded by its timeout.
    fn run_node<'s>(&'s mut self, id: NodeId, connection: Option<Connection>) -> RunFuture<'s> {
        let node = self.tree.node(id);
        let span = tracing::info_span!("action", level = %node.level, name = node.name());
        Box::pin(
            async move {
                let tree = self.tree;
                let node = tree.node(id);
                let name = node.name();

                let slot = self.records.len();
                self.records.push(ActionRecord {
                    level: node.level.clone(),
                    name: name.to_string(),
                    outcome: ActionOutcome::Running,
                    elapsed_ms: 0,
                });

                if !node.cleanup && self.cancel.is_cancelled() {
                    tracing::info!("canceled before start");
                    self.records[slot].outcome = ActionOutcome::Canceled;
                    return Err(JobError::Canceled {
                        action: name.to_string(),
                        level: node.level.clone(),
                    });
                }

                tracing::info!(timeout_s = node.timeout.map(|t| t.as_secs()), "starting");
                let start = Instant::now();
                let result = match node.timeout {
                    Some(limit) => {
                        let bounded = tokio::time::timeout(limit, self.step(id, connection)).await;
                        match bounded {
                            Ok(result) => result,
                            Err(_) => {
                                if let Some(child) = node.child {
                                    self.interrupted(child, slot + 1).await;
                                }
                                Err(JobError::Timeout {
                                    action: name.to_string(),
                                    level: node.level.clone(),
                                    after: limit,
                                })
                            }
                        }
                    }
                    None => self.step(id, connection).await,
                };
                let elapsed_ms = start.elapsed().as_millis() as u64;

                let record = &mut self.records[slot];
                record.elapsed_ms = elapsed_ms;
                match &result {
                    Ok(_) => {
                        record.outcome = ActionOutcome::Completed;
                        tracing::info!(elapsed_ms, "completed");
                    }
                    Err(e @ JobError::Canceled { .. }) => {
                        record.outcome = ActionOutcome::Canceled;
                        tracing::info!(elapsed_ms, error = %e, "canceled");
                    }
                    Err(e) => {
                        record.outcome = ActionOutcome::Failed(e.to_string());
                        tracing::error!(error = %e, elapsed_ms, "failed");
                    }
                }
                result
            }
            .instrument(span),
        )
    }

    /// The node's own run step followed by its sub-pipeline.
    fn step<'s>(&'s mut self, id: NodeId, connection: Option<Connection>) -> RunFuture<'s> {
        Box::pin(async move {
            let tree = self.tree;
            let node = tree.node(id);
            let next = {
                let mut ctx = RunContext::new(
                    self.store,
                    self.commands,
                    &node.namespace,
                    node.name(),
                    &node.level,
                    self.work_dir,
                );
                node.action
                    .run(&mut ctx, connection)
                    .await
                    .map_err(|e| JobError::from_action(node.name(), &node.level, e))?
            };
            match node.child {
                Some(child) => self.run_pipeline(child, next, false).await,
                None => Ok(next),
            }
        })
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
