// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for specs.

pub use ld_core::{DataKey, JobError, JobStatus, DEFAULT_NAMESPACE};
pub use ld_engine::{describe, ActionOutcome, EngineConfig, FakeCommandRunner, Job};
pub use ld_strategies::{build_job, JobDefinition, StrategyRegistry};
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;
pub use tempfile::TempDir;

pub fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Job definition text from `tests/fixtures/jobs/{name}.toml`.
pub fn job_text(name: &str) -> String {
    let path = fixtures().join("jobs").join(format!("{name}.toml"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

/// Resolve a job definition with a fake command runner working in `work_dir`.
pub fn resolve(text: &str, commands: &FakeCommandRunner, work_dir: &Path) -> Job {
    let definition = JobDefinition::parse(text).unwrap();
    build_job(
        &definition,
        &StrategyRegistry::builtin(),
        Arc::new(commands.clone()),
        EngineConfig::default().work_dir(work_dir),
    )
    .unwrap()
}

pub fn fixture_job(name: &str, commands: &FakeCommandRunner, work_dir: &Path) -> Job {
    resolve(&job_text(name), commands, work_dir)
}

/// `file://` URL for a small file created in `dir`.
pub fn local_image(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, name.as_bytes()).unwrap();
    format!("file://{}", path.display())
}

pub fn key(namespace: &str, action: &str, label: &str, key: &str) -> DataKey {
    DataKey::new(namespace, action, label, key)
}

/// Names of the actions in the order the run reached them, with outcomes.
pub fn outcomes(job: &Job) -> Vec<(String, String)> {
    job.history().iter().map(|r| (r.name.clone(), r.outcome.to_string())).collect()
}
