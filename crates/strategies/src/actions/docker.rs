// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container image checks and container start-up.

use super::artifacts;
use async_trait::async_trait;
use ld_core::{ActionError, CommandError, ParamError, Parameters};
use ld_engine::{argv, Action, ArtifactRef, Connection, Findings, RunContext};
use std::time::Duration;

/// Make sure a container image is present locally, pulling it if not.
pub struct CheckDockerImage {
    key: &'static str,
    image: Option<String>,
    parameters: Parameters,
}

impl CheckDockerImage {
    /// `key` names the parameter the image came from, for error messages.
    pub fn new(key: &'static str, image: Option<&str>) -> Self {
        let mut parameters = Parameters::new();
        if let Some(image) = image {
            parameters = parameters.with("image", image);
        }
        Self { key, image: image.map(str::to_string), parameters }
    }
}

#[async_trait]
impl Action for CheckDockerImage {
    fn name(&self) -> &str {
        "check-docker-image"
    }

    fn summary(&self) -> &str {
        "check docker image"
    }

    fn description(&self) -> &str {
        "pull the container image unless it is already present"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(600))
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::docker_image()]
    }

    fn validate(&self, findings: &mut Findings) {
        match self.image.as_deref() {
            None => findings.push(ParamError::Missing(self.key.to_string())),
            Some(image) if image.trim().is_empty() || image.contains(char::is_whitespace) => {
                findings.push(ParamError::Invalid {
                    name: self.key.to_string(),
                    expected: "a container image name",
                })
            }
            Some(_) => {}
        }
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let image = self.image.as_deref().ok_or_else(|| ParamError::Missing(self.key.to_string()))?;
        match ctx.run_command(&argv(["docker", "image", "inspect", image])).await {
            Ok(_) => tracing::debug!(image, "docker image present"),
            Err(CommandError::Failed { .. }) => {
                tracing::info!(image, "pulling docker image");
                ctx.run_command(&argv(["docker", "pull", image])).await?;
            }
            Err(e) => return Err(e.into()),
        }
        ctx.publish(&artifacts::docker_image(), image);
        Ok(connection)
    }
}

/// Start the test container with the overlay volume mounted and hand out
/// a connection that runs commands inside it.
pub struct StartContainer {
    parameters: Parameters,
    container: String,
    image: ArtifactRef,
    volume: ArtifactRef,
}

impl StartContainer {
    /// `deploy_namespace` is where the image check and the volume live,
    /// when it differs from this action's own namespace.
    pub fn new(container: &str, deploy_namespace: Option<&str>) -> Self {
        Self {
            parameters: Parameters::new().with("container", container),
            container: container.to_string(),
            image: artifacts::scoped(artifacts::docker_image(), deploy_namespace),
            volume: artifacts::scoped(artifacts::docker_volume(), deploy_namespace),
        }
    }
}

#[async_trait]
impl Action for StartContainer {
    fn name(&self) -> &str {
        "start-docker-container"
    }

    fn summary(&self) -> &str {
        "start docker container"
    }

    fn description(&self) -> &str {
        "run the container with the test overlay mounted"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(120))
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        vec![self.image.clone(), self.volume.clone()]
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::container(self.name())]
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        _connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let image = ctx.text(&self.image)?;
        let volume = ctx.path(&self.volume)?;
        let mount = format!("{}/lava-test:{}", volume.display(), super::OVERLAY_TEST_DIR);
        let out = ctx
            .run_command(&argv([
                "docker",
                "run",
                "-d",
                "--rm",
                "--name",
                self.container.as_str(),
                "-v",
                mount.as_str(),
                image.as_str(),
                "sleep",
                "infinity",
            ]))
            .await?;
        let id = out.stdout.trim();
        let id = if id.is_empty() { self.container.as_str() } else { id };
        ctx.publish(&artifacts::container(self.name()), id);

        let connection = Connection::new(self.container.clone())
            .with_exec(argv(["docker", "exec", self.container.as_str()]));
        Ok(Some(connection))
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
