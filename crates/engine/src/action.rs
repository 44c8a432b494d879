// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The action trait and the specs strategies build action subtrees from.

use crate::context::RunContext;
use async_trait::async_trait;
use ld_core::{ActionError, ArtifactKind, DataKey, Parameters};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Handle to an interactive session on the device under test.
///
/// Produced by boot actions and handed to every following action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Argv prefix that executes a command over this connection
    /// (e.g. `docker exec <container>` or `ssh root@dut`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exec: Vec<String>,
}

impl Connection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), prompt: None, exec: Vec::new() }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_exec(mut self, exec: Vec<String>) -> Self {
        self.exec = exec;
        self
    }

    /// Full argv for running `command` over this connection.
    pub fn command(&self, command: &[String]) -> Vec<String> {
        self.exec.iter().chain(command).cloned().collect()
    }
}

/// A namespace store entry an action reads or writes.
///
/// `namespace: None` means the namespace of the action using the reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    pub namespace: Option<String>,
    pub action: String,
    pub label: String,
    pub key: String,
    pub kind: ArtifactKind,
}

impl ArtifactRef {
    pub fn new(
        action: impl Into<String>,
        label: impl Into<String>,
        key: impl Into<String>,
        kind: ArtifactKind,
    ) -> Self {
        Self {
            namespace: None,
            action: action.into(),
            label: label.into(),
            key: key.into(),
            kind,
        }
    }

    /// Address the entry in another namespace.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Resolve against the namespace of the action holding the reference.
    pub fn resolve(&self, own_namespace: &str) -> DataKey {
        DataKey::new(
            self.namespace.as_deref().unwrap_or(own_namespace),
            &self.action,
            &self.label,
            &self.key,
        )
    }
}

/// Accumulator for problems found by [`Action::validate`].
#[derive(Debug, Default)]
pub struct Findings {
    errors: Vec<ActionError>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: impl Into<ActionError>) {
        self.errors.push(error.into());
    }

    /// Record the error of a failed lookup and keep going.
    pub fn check<T, E: Into<ActionError>>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<ActionError> {
        self.errors
    }
}

/// One step of a job.
///
/// `validate` must be free of side effects; everything that touches the
/// device, the filesystem or the namespace store happens in `run`.
#[async_trait]
pub trait Action: Send + Sync {
    /// Stable identifier, unique within the owning pipeline.
    fn name(&self) -> &str;

    /// One-line human summary.
    fn summary(&self) -> &str;

    /// Longer human description.
    fn description(&self) -> &str;

    /// Parameters bound at construction.
    fn parameters(&self) -> &Parameters;

    /// Timeout used when the job does not override it.
    fn default_timeout(&self) -> Option<Duration> {
        None
    }

    /// Namespace store entries this action reads.
    fn inputs(&self) -> Vec<ArtifactRef> {
        Vec::new()
    }

    /// Namespace store entries this action writes.
    fn outputs(&self) -> Vec<ArtifactRef> {
        Vec::new()
    }

    /// Check parameters and preconditions, recording every problem found.
    fn validate(&self, findings: &mut Findings) {
        let _ = findings;
    }

    /// Perform the step.
    ///
    /// Receives the connection left by the previous action and returns the
    /// connection for the next one (usually the one it was given).
    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError>;
}

/// An action plus everything needed to place it in the tree.
///
/// Strategies return these; [`ActionTree::push`](crate::tree::ActionTree::push)
/// turns them into nodes and assigns levels.
pub struct ActionSpec {
    pub action: Box<dyn Action>,
    pub namespace: String,
    pub timeout: Option<Duration>,
    pub cleanup: bool,
    pub children: Vec<ActionSpec>,
}

impl ActionSpec {
    pub fn new(action: impl Action + 'static, namespace: impl Into<String>) -> Self {
        Self {
            action: Box::new(action),
            namespace: namespace.into(),
            timeout: None,
            cleanup: false,
            children: Vec::new(),
        }
    }

    /// Append a step to this action's sub-pipeline.
    pub fn child(mut self, spec: ActionSpec) -> Self {
        self.children.push(spec);
        self
    }

    pub fn children(mut self, specs: impl IntoIterator<Item = ActionSpec>) -> Self {
        self.children.extend(specs);
        self
    }

    /// Run this action even after an earlier failure or a cancellation.
    pub fn cleanup(mut self) -> Self {
        self.cleanup = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        self.action.name()
    }

    /// Visit this spec and its descendants in pre-order.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut ActionSpec)) {
        f(self);
        for child in &mut self.children {
            child.visit_mut(f);
        }
    }
}

impl std::fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSpec")
            .field("name", &self.action.name())
            .field("namespace", &self.namespace)
            .field("timeout", &self.timeout)
            .field("cleanup", &self.cleanup)
            .field("children", &self.children)
            .finish()
    }
}
