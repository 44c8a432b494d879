// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job status state machine.

use serde::{Deserialize, Serialize};

/// Overall status of a job.
///
/// Transitions only move forward:
///
/// ```text
/// NotStarted -> Validating -> Valid -> Running -> Complete | Failed | Canceled
///                          \-> Invalid
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    NotStarted,
    Validating,
    Valid,
    Invalid,
    Running,
    Complete,
    Failed,
    Canceled,
}

crate::simple_display! {
    JobStatus {
        NotStarted => "not_started",
        Validating => "validating",
        Valid => "valid",
        Invalid => "invalid",
        Running => "running",
        Complete => "complete",
        Failed => "failed",
        Canceled => "canceled",
    }
}

impl JobStatus {
    /// Whether moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (NotStarted, Validating)
                | (Validating, Valid)
                | (Validating, Invalid)
                | (Valid, Running)
                | (Running, Complete)
                | (Running, Failed)
                | (Running, Canceled)
        )
    }

    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Invalid | JobStatus::Complete | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
