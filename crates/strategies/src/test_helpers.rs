// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared setup for running single actions in unit tests.

use ld_core::{ActionError, Artifact, Level, NamespaceStore, Parameters, StoreError, DEFAULT_NAMESPACE};
use ld_engine::{Action, ArtifactRef, Connection, FakeCommandRunner, Findings, RunContext};
use std::path::{Path, PathBuf};

/// Store, fake commands and a scratch directory for one action at a time.
pub(crate) struct Bench {
    pub store: NamespaceStore,
    pub commands: FakeCommandRunner,
    _dir: tempfile::TempDir,
    work_dir: PathBuf,
    level: Level,
}

impl Bench {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().to_path_buf();
        Self {
            store: NamespaceStore::new(),
            commands: FakeCommandRunner::new(),
            _dir: dir,
            work_dir,
            level: Level::top(1),
        }
    }

    /// Work in a subdirectory called `name` of the temporary directory.
    pub fn in_subdir(name: &str) -> Self {
        let mut bench = Self::new();
        bench.work_dir = bench.work_dir.join(name);
        std::fs::create_dir_all(&bench.work_dir).unwrap();
        bench
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub async fn run(
        &mut self,
        action: &dyn Action,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        self.run_in(DEFAULT_NAMESPACE, action, connection).await
    }

    pub async fn run_in(
        &mut self,
        namespace: &str,
        action: &dyn Action,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let name = action.name().to_string();
        let mut ctx = RunContext::new(
            &mut self.store,
            &self.commands,
            namespace,
            &name,
            &self.level,
            &self.work_dir,
        );
        action.run(&mut ctx, connection).await
    }

    /// Write `value` where `reference` points from the default namespace.
    pub fn seed(&mut self, reference: &ArtifactRef, value: impl Into<Artifact>) {
        self.store.set(reference.resolve(DEFAULT_NAMESPACE), value);
    }

    pub fn read(&self, reference: &ArtifactRef) -> Result<&Artifact, StoreError> {
        self.store.get(&reference.resolve(DEFAULT_NAMESPACE))
    }
}

/// Messages of every validation finding.
pub(crate) fn findings(action: &dyn Action) -> Vec<String> {
    let mut findings = Findings::new();
    action.validate(&mut findings);
    findings.into_errors().iter().map(ToString::to_string).collect()
}

pub(crate) fn params(value: serde_json::Value) -> Parameters {
    match value {
        serde_json::Value::Object(map) => map.into(),
        other => panic!("parameters must be an object, got {other}"),
    }
}
