// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed Virtual Platform models run inside a container.

use super::artifacts;
use async_trait::async_trait;
use ld_core::{ActionError, ParamError, Parameters};
use ld_engine::{argv, Action, ArtifactRef, Connection, Findings, RunContext};
use std::collections::BTreeMap;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Image labels referenced as `{LABEL}` in a model argument.
///
/// Returns `None` when a brace is unbalanced or the name is not
/// upper-case alphanumeric.
pub(crate) fn placeholders(arg: &str) -> Option<Vec<String>> {
    let mut labels = Vec::new();
    let mut rest = arg;
    while let Some(start) = rest.find(['{', '}']) {
        if rest[start..].starts_with('}') {
            return None;
        }
        let after = &rest[start + 1..];
        let end = after.find('}')?;
        let name = &after[..end];
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return None;
        }
        labels.push(name.to_ascii_lowercase());
        rest = &after[end + 1..];
    }
    Some(labels)
}

fn substitute(arg: &str, paths: &BTreeMap<String, String>) -> String {
    paths.iter().fold(arg.to_string(), |acc, (label, path)| {
        acc.replace(&format!("{{{}}}", label.to_ascii_uppercase()), path)
    })
}

/// Launch the model binary in its container, with downloaded images
/// substituted into the arguments.
pub struct RunFvp {
    parameters: Parameters,
    container: String,
    image: ArtifactRef,
    labels: Vec<String>,
    deploy_namespace: Option<String>,
}

impl RunFvp {
    pub fn new(parameters: Parameters, container: &str, deploy_namespace: Option<&str>) -> Self {
        let mut labels: Vec<String> = parameters
            .str_list("arguments")
            .unwrap_or_default()
            .iter()
            .filter_map(|arg| placeholders(arg))
            .flatten()
            .collect();
        labels.sort();
        labels.dedup();
        Self {
            parameters,
            container: container.to_string(),
            image: artifacts::docker_image(),
            labels,
            deploy_namespace: deploy_namespace.map(str::to_string),
        }
    }

    fn image_ref(&self, label: &str) -> ArtifactRef {
        artifacts::scoped(artifacts::downloaded(label), self.deploy_namespace.as_deref())
    }
}

#[async_trait]
impl Action for RunFvp {
    fn name(&self) -> &str {
        "run-fvp"
    }

    fn summary(&self) -> &str {
        "run the FVP model"
    }

    fn description(&self) -> &str {
        "start the model binary in its container with the deployed images"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(120))
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        let mut inputs = vec![self.image.clone()];
        inputs.extend(self.labels.iter().map(|label| self.image_ref(label)));
        inputs
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::container(self.name())]
    }

    fn validate(&self, findings: &mut Findings) {
        findings.check(self.parameters.require_str("image"));
        if let Some(arguments) = findings.check(self.parameters.str_list("arguments")) {
            if arguments.iter().any(|arg| placeholders(arg).is_none()) {
                findings.push(ParamError::Invalid {
                    name: "arguments".to_string(),
                    expected: "arguments with well-formed {IMAGE} placeholders",
                });
            }
        }
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        _connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let model = self.parameters.require_str("image")?;
        let image = ctx.text(&self.image)?;
        let mut paths = BTreeMap::new();
        for label in &self.labels {
            let path = ctx.path(&self.image_ref(label))?;
            paths.insert(label.clone(), path.display().to_string());
        }

        let work_dir = ctx.work_dir().display().to_string();
        let mount = format!("{work_dir}:{work_dir}");
        let mut command = argv([
            "docker",
            "run",
            "-d",
            "--rm",
            "--name",
            self.container.as_str(),
            "-v",
            mount.as_str(),
            image.as_str(),
            model,
        ]);
        for arg in self.parameters.str_list("arguments")? {
            command.push(substitute(&arg, &paths));
        }
        let out = ctx.run_command(&command).await?;
        let id = out.stdout.trim();
        let id = if id.is_empty() { self.container.as_str() } else { id };
        ctx.publish(&artifacts::container(self.name()), id);
        Ok(None)
    }
}

/// Poll the model's console log until one of the prompts appears.
pub struct WaitFvpPrompt {
    parameters: Parameters,
}

impl WaitFvpPrompt {
    /// `prompts` is the stage's `prompts` value, checked at validation.
    pub fn new(prompts: Option<serde_json::Value>) -> Self {
        let parameters = match prompts {
            Some(prompts) => Parameters::new().with("prompts", prompts),
            None => Parameters::new(),
        };
        Self { parameters }
    }
}

#[async_trait]
impl Action for WaitFvpPrompt {
    fn name(&self) -> &str {
        "wait-fvp-prompt"
    }

    fn summary(&self) -> &str {
        "wait for the FVP prompt"
    }

    fn description(&self) -> &str {
        "watch the model console until the login prompt appears"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(300))
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::container("run-fvp")]
    }

    fn validate(&self, findings: &mut Findings) {
        if let Some(prompts) = findings.check(self.parameters.str_list("prompts")) {
            if prompts.is_empty() {
                findings.push(ParamError::Missing("prompts".to_string()));
            }
        }
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        _connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let prompts = self.parameters.str_list("prompts")?;
        let container = ctx.text(&artifacts::container("run-fvp"))?;
        loop {
            let out = ctx.run_command(&argv(["docker", "logs", container.as_str()])).await?;
            let seen = prompts
                .iter()
                .find(|prompt| out.stdout.contains(prompt.as_str()) || out.stderr.contains(prompt.as_str()));
            if let Some(prompt) = seen {
                tracing::info!(%prompt, "FVP prompt seen");
                let connection = Connection::new("fvp-console")
                    .with_prompt(prompt.clone())
                    .with_exec(argv(["docker", "exec", container.as_str()]));
                return Ok(Some(connection));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
#[path = "fvp_tests.rs"]
mod tests;
