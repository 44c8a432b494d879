// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build the test overlay and pack it for transfer to the device.

use super::{artifacts, ensure_dir, TestDefinition};
use async_trait::async_trait;
use ld_core::{ActionError, Parameters};
use ld_engine::{argv, Action, ArtifactRef, Connection, Findings, RunContext};
use std::collections::BTreeSet;
use std::time::Duration;

/// Writes a `run.sh` per test definition under `lava-test/{name}/`.
pub struct LavaOverlay {
    parameters: Parameters,
}

impl LavaOverlay {
    /// `definitions` holds every test definition of the job, in job order.
    pub fn new(definitions: Vec<serde_json::Value>) -> Self {
        Self { parameters: Parameters::new().with("definitions", definitions) }
    }
}

#[async_trait]
impl Action for LavaOverlay {
    fn name(&self) -> &str {
        "lava-overlay"
    }

    fn summary(&self) -> &str {
        "build the test overlay"
    }

    fn description(&self) -> &str {
        "write the test definition scripts into an overlay directory"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(60))
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::overlay_dir()]
    }

    fn validate(&self, findings: &mut Findings) {
        // Shapes are reported by the test stage; only cross-stage clashes here.
        let Ok(definitions) = TestDefinition::parse_list(&self.parameters) else {
            return;
        };
        let mut seen = BTreeSet::new();
        for definition in &definitions {
            if !seen.insert(definition.name.as_str()) {
                findings.push(ActionError::failed(format!(
                    "test definition `{}` is defined more than once",
                    definition.name
                )));
            }
        }
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let root = ctx.scratch_dir().join("overlay");
        let tests = root.join("lava-test");
        ensure_dir(&tests).await?;

        for definition in TestDefinition::parse_list(&self.parameters)? {
            let dir = tests.join(&definition.name);
            ensure_dir(&dir).await?;
            let script = dir.join("run.sh");
            tokio::fs::write(&script, definition.script())
                .await
                .map_err(|e| ActionError::io(&script, e))?;
        }
        ctx.publish(&artifacts::overlay_dir(), root);
        Ok(connection)
    }
}

/// Packs the overlay directory into a gzipped tarball.
#[derive(Default)]
pub struct CompressOverlay {
    parameters: Parameters,
}

impl CompressOverlay {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Action for CompressOverlay {
    fn name(&self) -> &str {
        "compress-overlay"
    }

    fn summary(&self) -> &str {
        "compress the overlay"
    }

    fn description(&self) -> &str {
        "pack the overlay directory into a tarball"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(120))
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::overlay_dir()]
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::overlay_file()]
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let dir = ctx.path(&artifacts::overlay_dir())?;
        let scratch = ctx.scratch_dir();
        ensure_dir(&scratch).await?;
        let file = scratch.join("overlay.tar.gz");

        let file_arg = file.display().to_string();
        let dir_arg = dir.display().to_string();
        ctx.run_command(&argv(["tar", "-czf", file_arg.as_str(), "-C", dir_arg.as_str(), "."]))
            .await?;
        ctx.publish(&artifacts::overlay_file(), file);
        Ok(connection)
    }
}

#[cfg(test)]
#[path = "overlay_tests.rs"]
mod tests;
