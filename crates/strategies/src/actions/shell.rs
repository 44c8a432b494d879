// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Actions that talk to the device over an established connection.

use super::OVERLAY_TEST_DIR;
use async_trait::async_trait;
use ld_core::{ActionError, ArtifactKind, CommandError, ParamError, Parameters};
use ld_engine::{argv, Action, ArtifactRef, Connection, Findings, RunContext};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;

/// A named list of shell steps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestDefinition {
    pub name: String,
    pub steps: Vec<String>,
}

impl TestDefinition {
    /// Parse the `definitions` list, or an empty list when absent.
    pub fn parse_list(parameters: &Parameters) -> Result<Vec<Self>, ParamError> {
        let Some(value) = parameters.get("definitions") else {
            return Ok(Vec::new());
        };
        let definitions: Vec<Self> = serde_json::from_value(value.clone()).map_err(|_| {
            ParamError::Invalid {
                name: "definitions".to_string(),
                expected: "a list of { name, steps } tables",
            }
        })?;
        for definition in &definitions {
            if definition.name.is_empty() || definition.name.contains('/') {
                return Err(ParamError::Invalid {
                    name: "definitions.name".to_string(),
                    expected: "a non-empty name without `/`",
                });
            }
        }
        Ok(definitions)
    }

    pub fn script(&self) -> String {
        let mut script = String::from("#!/bin/sh\nset -e\n");
        for step in &self.steps {
            script.push_str(step);
            script.push('\n');
        }
        script
    }

    /// Location of the script on the device.
    pub fn device_path(&self) -> String {
        format!("{OVERLAY_TEST_DIR}/{}/run.sh", self.name)
    }
}

/// Boot on a device that is already running: adopt the connection and
/// check it answers.
pub struct MinimalBoot {
    parameters: Parameters,
}

impl MinimalBoot {
    pub fn new(parameters: Parameters) -> Self {
        Self { parameters }
    }

    /// Connection described by the `connection` table, if any.
    fn configured(&self) -> Result<Option<Connection>, ParamError> {
        let Some(section) = self.parameters.section("connection")? else {
            return Ok(None);
        };
        let name = section.require_str("name").map_err(|_| ParamError::Missing("connection.name".to_string()))?;
        let exec = section.str_list("exec").map_err(|_| ParamError::Invalid {
            name: "connection.exec".to_string(),
            expected: "a list of strings",
        })?;
        Ok(Some(Connection::new(name).with_exec(exec)))
    }
}

#[async_trait]
impl Action for MinimalBoot {
    fn name(&self) -> &str {
        "minimal-boot"
    }

    fn summary(&self) -> &str {
        "minimal boot"
    }

    fn description(&self) -> &str {
        "wait for the prompt on an existing connection"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(120))
    }

    fn validate(&self, findings: &mut Findings) {
        if let Some(prompts) = findings.check(self.parameters.str_list("prompts")) {
            if prompts.is_empty() {
                findings.push(ParamError::Missing("prompts".to_string()));
            }
        }
        findings.check(self.configured());
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let Some(connection) = connection.or(self.configured()?) else {
            return Err(ActionError::failed("no connection to boot over"));
        };
        let prompts = self.parameters.str_list("prompts")?;
        if !connection.exec.is_empty() {
            ctx.run_command(&connection.command(&argv(["true"]))).await?;
        }
        let connection = match prompts.into_iter().next() {
            Some(prompt) => connection.with_prompt(prompt),
            None => connection,
        };
        tracing::info!(connection = %connection.name, "device ready");
        Ok(Some(connection))
    }
}

/// Run each test definition's script over the connection and record
/// `pass` or `fail` per definition.
pub struct TestShell {
    parameters: Parameters,
    names: Vec<String>,
}

impl TestShell {
    pub fn new(parameters: Parameters) -> Self {
        let names = TestDefinition::parse_list(&parameters)
            .map(|defs| defs.into_iter().map(|d| d.name).collect())
            .unwrap_or_default();
        Self { parameters, names }
    }

    fn result_ref(name: &str) -> ArtifactRef {
        ArtifactRef::new("lava-test-shell", "results", name, ArtifactKind::Text)
    }
}

#[async_trait]
impl Action for TestShell {
    fn name(&self) -> &str {
        "lava-test-shell"
    }

    fn summary(&self) -> &str {
        "run test definitions"
    }

    fn description(&self) -> &str {
        "execute each test definition over the connection and record results"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(1800))
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        self.names.iter().map(|name| Self::result_ref(name)).collect()
    }

    fn validate(&self, findings: &mut Findings) {
        let Some(definitions) = findings.check(TestDefinition::parse_list(&self.parameters)) else {
            return;
        };
        if definitions.is_empty() {
            findings.push(ParamError::Missing("definitions".to_string()));
        }
        let mut seen = BTreeSet::new();
        for definition in &definitions {
            if definition.steps.is_empty() {
                findings.push(ActionError::failed(format!(
                    "test definition `{}` has no steps",
                    definition.name
                )));
            }
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
        let Some(connection) = connection else {
            return Err(ActionError::failed("no connection to run tests over"));
        };
        for definition in TestDefinition::parse_list(&self.parameters)? {
            let command = connection.command(&argv(["sh".to_string(), definition.device_path()]));
            let result = match ctx.run_command(&command).await {
                Ok(_) => "pass",
                Err(CommandError::Failed { exit_code, .. }) => {
                    tracing::warn!(test = %definition.name, exit_code, "test definition failed");
                    "fail"
                }
                Err(e) => return Err(e.into()),
            };
            ctx.publish(&Self::result_ref(&definition.name), result);
        }
        Ok(Some(connection))
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
