// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Last action of every job; runs even after failures.

use async_trait::async_trait;
use ld_core::{ActionError, ArtifactKind, Parameters, StoreError};
use ld_engine::{argv, Action, ArtifactRef, Connection, RunContext};
use std::time::Duration;

/// Remove containers started by the job and mark the job finished.
pub struct Finalize {
    parameters: Parameters,
    containers: Vec<ArtifactRef>,
}

impl Finalize {
    /// `containers` are the store entries holding ids of containers the
    /// job may have started.
    pub fn new(containers: Vec<ArtifactRef>) -> Self {
        Self { parameters: Parameters::new(), containers }
    }

    pub fn finished() -> ArtifactRef {
        ArtifactRef::new("finalize", "job", "finished", ArtifactKind::Flag)
    }
}

#[async_trait]
impl Action for Finalize {
    fn name(&self) -> &str {
        "finalize"
    }

    fn summary(&self) -> &str {
        "finalize the job"
    }

    fn description(&self) -> &str {
        "release the device resources held by the job"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(60))
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        self.containers.clone()
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![Self::finished()]
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        _connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        for reference in &self.containers {
            let id = match ctx.text(reference) {
                Ok(id) => id,
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            };
            // A container that already exited is not an error.
            if let Err(e) = ctx.run_command(&argv(["docker", "rm", "-f", id.as_str()])).await {
                tracing::warn!(container = %id, error = %e, "failed to remove container");
            }
        }
        ctx.publish(&Self::finished(), true);
        Ok(None)
    }
}

#[cfg(test)]
#[path = "finalize_tests.rs"]
mod tests;
