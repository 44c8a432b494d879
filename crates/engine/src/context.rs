// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-action view of the job handed to [`Action::run`](crate::Action::run).

use crate::action::ArtifactRef;
use crate::capability::{CommandOutput, CommandRunner};
use ld_core::{Artifact, CommandError, DataKey, Level, NamespaceStore, StoreError};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Everything an action may touch while it runs.
///
/// Store access is scoped to the action's namespace; the `_in` variants
/// address another namespace explicitly.
pub struct RunContext<'a> {
    store: &'a mut NamespaceStore,
    commands: &'a dyn CommandRunner,
    namespace: &'a str,
    action: &'a str,
    level: &'a Level,
    work_dir: &'a Path,
}

impl<'a> RunContext<'a> {
    pub fn new(
        store: &'a mut NamespaceStore,
        commands: &'a dyn CommandRunner,
        namespace: &'a str,
        action: &'a str,
        level: &'a Level,
        work_dir: &'a Path,
    ) -> Self {
        Self { store, commands, namespace, action, level, work_dir }
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    pub fn action(&self) -> &str {
        self.action
    }

    pub fn level(&self) -> &Level {
        self.level
    }

    /// Directory for files this job downloads or generates.
    pub fn work_dir(&self) -> &Path {
        self.work_dir
    }

    /// Per-action scratch directory under the work dir, named after the level.
    pub fn scratch_dir(&self) -> PathBuf {
        self.work_dir.join(format!("{}-{}", self.level, self.action))
    }

    pub fn store(&self) -> &NamespaceStore {
        self.store
    }

    /// Key for an entry written by this action in its own namespace.
    pub fn own_key(&self, label: &str, key: &str) -> DataKey {
        DataKey::new(self.namespace, self.action, label, key)
    }

    pub fn key_for(&self, reference: &ArtifactRef) -> DataKey {
        reference.resolve(self.namespace)
    }

    pub fn get(&self, action: &str, label: &str, key: &str) -> Result<&Artifact, StoreError> {
        self.store.get(&DataKey::new(self.namespace, action, label, key))
    }

    pub fn get_in(
        &self,
        namespace: &str,
        action: &str,
        label: &str,
        key: &str,
    ) -> Result<&Artifact, StoreError> {
        self.store.get(&DataKey::new(namespace, action, label, key))
    }

    /// Write under this action's name in its own namespace.
    pub fn set(&mut self, label: &str, key: &str, value: impl Into<Artifact>) {
        let key = self.own_key(label, key);
        self.store.set(key, value);
    }

    /// Write under this action's name in another namespace.
    pub fn set_in(&mut self, namespace: &str, label: &str, key: &str, value: impl Into<Artifact>) {
        self.store.set(DataKey::new(namespace, self.action, label, key), value);
    }

    /// Write an entry that must not exist yet.
    pub fn register(
        &mut self,
        label: &str,
        key: &str,
        value: impl Into<Artifact>,
    ) -> Result<(), StoreError> {
        let key = self.own_key(label, key);
        self.store.register(key, value)
    }

    pub fn path(&self, reference: &ArtifactRef) -> Result<PathBuf, StoreError> {
        self.store.get_path(&self.key_for(reference)).map(Path::to_path_buf)
    }

    pub fn flag(&self, reference: &ArtifactRef) -> Result<bool, StoreError> {
        self.store.get_flag(&self.key_for(reference))
    }

    pub fn text(&self, reference: &ArtifactRef) -> Result<String, StoreError> {
        self.store.get_text(&self.key_for(reference)).map(str::to_string)
    }

    pub fn integer(&self, reference: &ArtifactRef) -> Result<i64, StoreError> {
        self.store.get_integer(&self.key_for(reference))
    }

    /// Write a declared output, honouring its namespace.
    pub fn publish(&mut self, reference: &ArtifactRef, value: impl Into<Artifact>) {
        let key = self.key_for(reference);
        self.store.set(key, value);
    }

    /// Run an external command through the injected capability.
    pub async fn run_command(&self, argv: &[String]) -> Result<CommandOutput, CommandError> {
        let command = argv.join(" ");
        tracing::info!(action = self.action, level = %self.level, %command, "running command");
        let start = Instant::now();
        let result = self.commands.run(argv).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(out) => tracing::info!(exit_code = out.exit_code, elapsed_ms, "command finished"),
            Err(e) => tracing::error!(error = %e, elapsed_ms, "command failed"),
        }
        result
    }
}

/// Build an argv from string-like parts.
pub fn argv<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    parts.into_iter().map(Into::into).collect()
}
