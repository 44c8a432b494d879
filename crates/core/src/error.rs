// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared by the engine and the strategies.
//!
//! [`ActionError`] is what a single action reports, without tree context.
//! [`JobError`] is the user-facing surface: every variant raised for a
//! specific action carries that action's name and [`Level`].

use crate::level::Level;
use crate::namespace::StoreError;
use crate::params::ParamError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors from the injected command-execution capability.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn { command: String, source: std::io::Error },
    #[error("command `{command}` failed with exit code {exit_code}: {stderr}")]
    Failed { command: String, exit_code: i32, stderr: String },
    #[error("command `{command}` timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },
    #[error("empty command")]
    Empty,
}

/// Failure reported by one action's validate or run step.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Param(#[from] ParamError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ActionError::Io { path: path.into(), source }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        ActionError::Failed(message.into())
    }

    /// Category this error falls into when raised during validation.
    pub fn validation_category(&self) -> ErrorCategory {
        match self {
            ActionError::Store(StoreError::TypeMismatch { .. }) => ErrorCategory::TypeMismatch,
            ActionError::Store(StoreError::Conflict(_)) => ErrorCategory::Conflict,
            _ => ErrorCategory::Validation,
        }
    }
}

/// Broad classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Unknown strategy tag or malformed job definition.
    Configuration,
    /// Missing or invalid parameter found by validate().
    Validation,
    /// Namespace store key consumed as the wrong kind.
    TypeMismatch,
    /// Duplicate registration of something that must be unique.
    Conflict,
    /// Failure of an external capability or the filesystem during run().
    Runtime,
    Timeout,
    Canceled,
    /// The engine API was called out of order.
    Usage,
}

crate::simple_display! {
    ErrorCategory {
        Configuration => "configuration",
        Validation => "validation",
        TypeMismatch => "type_mismatch",
        Conflict => "conflict",
        Runtime => "runtime",
        Timeout => "timeout",
        Canceled => "canceled",
        Usage => "usage",
    }
}

impl ErrorCategory {
    /// Structural errors are collected by validate(); the rest abort run().
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ErrorCategory::Configuration
                | ErrorCategory::Validation
                | ErrorCategory::TypeMismatch
                | ErrorCategory::Conflict
        )
    }
}

/// One structured error entry on a pipeline's error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub action: String,
    pub level: Level,
    pub category: ErrorCategory,
    pub message: String,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.action, self.message)
    }
}

/// The error surface of a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{}", conflict_message(.action, .level, .message))]
    Conflict { action: Option<String>, level: Option<Level>, message: String },

    #[error("usage error: {0}")]
    Usage(String),

    #[error("job is invalid: {}", summarize(.0))]
    Invalid(Vec<ErrorRecord>),

    #[error("[{level}] {action} failed: {source}")]
    Action {
        action: String,
        level: Level,
        #[source]
        source: ActionError,
    },

    #[error("[{level}] {action} timed out after {}s", .after.as_secs())]
    Timeout { action: String, level: Level, after: Duration },

    #[error("job timed out after {}s", .after.as_secs())]
    JobTimeout { after: Duration },

    #[error("[{level}] {action} canceled")]
    Canceled { action: String, level: Level },
}

impl JobError {
    /// Wrap a run-step failure with the action's identity.
    ///
    /// Store conflicts keep their own variant rather than becoming a
    /// generic action failure.
    pub fn from_action(action: &str, level: &Level, source: ActionError) -> Self {
        match source {
            ActionError::Store(StoreError::Conflict(key)) => JobError::Conflict {
                action: Some(action.to_string()),
                level: Some(level.clone()),
                message: format!("artifact {key} is already registered"),
            },
            source => JobError::Action { action: action.to_string(), level: level.clone(), source },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            JobError::Configuration(_) => ErrorCategory::Configuration,
            JobError::Conflict { .. } => ErrorCategory::Conflict,
            JobError::Usage(_) => ErrorCategory::Usage,
            JobError::Invalid(_) => ErrorCategory::Validation,
            JobError::Action { .. } => ErrorCategory::Runtime,
            JobError::Timeout { .. } | JobError::JobTimeout { .. } => ErrorCategory::Timeout,
            JobError::Canceled { .. } => ErrorCategory::Canceled,
        }
    }

    /// Name and level of the action the error was raised for, if any.
    pub fn context(&self) -> Option<(&str, &Level)> {
        match self {
            JobError::Action { action, level, .. }
            | JobError::Timeout { action, level, .. }
            | JobError::Canceled { action, level } => Some((action.as_str(), level)),
            JobError::Conflict { action: Some(action), level: Some(level), .. } => {
                Some((action.as_str(), level))
            }
            JobError::Invalid(records) => records.first().map(|r| (r.action.as_str(), &r.level)),
            _ => None,
        }
    }
}

fn conflict_message(action: &Option<String>, level: &Option<Level>, message: &str) -> String {
    match (action, level) {
        (Some(action), Some(level)) => format!("[{level}] {action} conflict: {message}"),
        _ => format!("conflict: {message}"),
    }
}

fn summarize(records: &[ErrorRecord]) -> String {
    records.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
