// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML job definitions.

use ld_core::Parameters;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading a job definition file.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid job definition: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("job definition has no actions")]
    Empty,
}

/// A job as written by the user.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobDefinition {
    pub name: String,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub timeouts: Timeouts,
    pub actions: Vec<Stage>,
}

/// One top-level stage and its parameter mapping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Deploy(Parameters),
    Boot(Parameters),
    Test(Parameters),
}

impl Stage {
    pub fn kind(&self) -> StageKind {
        match self {
            Stage::Deploy(_) => StageKind::Deploy,
            Stage::Boot(_) => StageKind::Boot,
            Stage::Test(_) => StageKind::Test,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        match self {
            Stage::Deploy(p) | Stage::Boot(p) | Stage::Test(p) => p,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    Deploy,
    Boot,
    Test,
}

ld_core::simple_display! {
    StageKind {
        Deploy => "deploy",
        Boot => "boot",
        Test => "test",
    }
}

impl StageKind {
    /// Parameter naming the strategy for this kind of stage.
    pub fn selector(self) -> &'static str {
        match self {
            StageKind::Deploy => "to",
            StageKind::Boot | StageKind::Test => "method",
        }
    }
}

/// Timeout settings, all in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    /// Whole-job limit.
    #[serde(default)]
    pub job: Option<u64>,
    /// Fallback for actions without a built-in default.
    #[serde(default)]
    pub action: Option<u64>,
    /// Per-action overrides by action name.
    #[serde(default)]
    pub actions: BTreeMap<String, u64>,
}

impl Timeouts {
    /// Timeout for `name`: override, then the action's default, then the job-wide fallback.
    pub fn resolve(&self, name: &str, default: Option<Duration>) -> Option<Duration> {
        self.actions
            .get(name)
            .map(|secs| Duration::from_secs(*secs))
            .or(default)
            .or(self.action.map(Duration::from_secs))
    }

    pub fn job(&self) -> Option<Duration> {
        self.job.map(Duration::from_secs)
    }
}

impl JobDefinition {
    pub fn parse(text: &str) -> Result<Self, DefinitionError> {
        let definition: JobDefinition = toml::from_str(text)?;
        if definition.actions.is_empty() {
            return Err(DefinitionError::Empty);
        }
        Ok(definition)
    }

    pub fn load(path: &Path) -> Result<Self, DefinitionError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| DefinitionError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    /// Test-stage parameter mappings in job order.
    pub fn tests(&self) -> Vec<&Parameters> {
        self.actions
            .iter()
            .filter_map(|stage| match stage {
                Stage::Test(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    /// Parameters of the job itself, as recorded on the resolved job.
    pub fn job_parameters(&self) -> Parameters {
        let mut params = Parameters::new().with("name", self.name.clone());
        if let Some(device_type) = &self.device_type {
            params = params.with("device_type", device_type.clone());
        }
        params
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
