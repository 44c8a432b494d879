// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configurable action for exercising the engine in tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::action::{Action, ArtifactRef, Connection, Findings};
use crate::context::RunContext;
use async_trait::async_trait;
use ld_core::{ActionError, Artifact, DataKey, ParamError, Parameters, StoreError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Shared, ordered log of which scripted actions ran.
pub type RunLog = Arc<Mutex<Vec<String>>>;

/// Value a scripted action saw when reading the store.
pub type Observation = (DataKey, Result<Artifact, StoreError>);

/// An action whose behaviour is set up by the test.
pub struct ScriptedAction {
    name: String,
    parameters: Parameters,
    required: Vec<String>,
    reads: Vec<ArtifactRef>,
    writes: Vec<(ArtifactRef, Artifact)>,
    command: Option<Vec<String>>,
    sleep: Option<Duration>,
    fail: Option<String>,
    connect: Option<Connection>,
    log: RunLog,
    observed: Arc<Mutex<Vec<Observation>>>,
}

impl ScriptedAction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
            required: Vec::new(),
            reads: Vec::new(),
            writes: Vec::new(),
            command: None,
            sleep: None,
            fail: None,
            connect: None,
            log: RunLog::default(),
            observed: Arc::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Fail validation unless `key` is a string parameter.
    pub fn requires(mut self, key: &str) -> Self {
        self.required.push(key.to_string());
        self
    }

    /// Read `reference` during run; a missing entry fails the action.
    pub fn reads(mut self, reference: ArtifactRef) -> Self {
        self.reads.push(reference);
        self
    }

    pub fn writes(mut self, reference: ArtifactRef, value: impl Into<Artifact>) -> Self {
        self.writes.push((reference, value.into()));
        self
    }

    pub fn command(mut self, argv: &[&str]) -> Self {
        self.command = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn sleeps(mut self, duration: Duration) -> Self {
        self.sleep = Some(duration);
        self
    }

    pub fn fails(mut self, message: impl Into<String>) -> Self {
        self.fail = Some(message.into());
        self
    }

    pub fn connects(mut self, connection: Connection) -> Self {
        self.connect = Some(connection);
        self
    }

    pub fn log_to(mut self, log: &RunLog) -> Self {
        self.log = Arc::clone(log);
        self
    }

    /// Handle on what this action read, valid after the action moves into a tree.
    pub fn observations(&self) -> Arc<Mutex<Vec<Observation>>> {
        Arc::clone(&self.observed)
    }
}

#[async_trait]
impl Action for ScriptedAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn summary(&self) -> &str {
        "scripted test action"
    }

    fn description(&self) -> &str {
        "action driven entirely by test setup"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        self.reads.clone()
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        self.writes.iter().map(|(r, _)| r.clone()).collect()
    }

    fn validate(&self, findings: &mut Findings) {
        for key in &self.required {
            if self.parameters.str(key).ok().flatten().is_none() {
                findings.push(ParamError::Missing(key.clone()));
            }
        }
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        self.log.lock().push(self.name.clone());
        if let Some(duration) = self.sleep {
            tokio::time::sleep(duration).await;
        }
        if let Some(argv) = &self.command {
            ctx.run_command(argv).await?;
        }
        for reference in &self.reads {
            let key = ctx.key_for(reference);
            let seen = ctx.store().get(&key).cloned();
            self.observed.lock().push((key, seen.clone()));
            seen?;
        }
        if let Some(message) = &self.fail {
            return Err(ActionError::failed(message.clone()));
        }
        for (reference, value) in &self.writes {
            ctx.publish(reference, value.clone());
        }
        Ok(self.connect.clone().or(connection))
    }
}
