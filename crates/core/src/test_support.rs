// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core types.
pub mod strategies {
    use crate::level::Level;
    use crate::status::JobStatus;
    use proptest::prelude::*;

    pub fn arb_level() -> impl Strategy<Value = Level> {
        prop::collection::vec(1u32..40, 1..5).prop_map(|parts| {
            let mut parts = parts.into_iter();
            let mut level = Level::top(parts.next().unwrap_or(1));
            for p in parts {
                level = level.child(p);
            }
            level
        })
    }

    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::NotStarted),
            Just(JobStatus::Validating),
            Just(JobStatus::Valid),
            Just(JobStatus::Invalid),
            Just(JobStatus::Running),
            Just(JobStatus::Complete),
            Just(JobStatus::Failed),
            Just(JobStatus::Canceled),
        ]
    }

    /// Tree shapes: one entry per top-level action, listing how many
    /// grandchildren each of its children owns.
    pub fn arb_tree_shape() -> impl Strategy<Value = Vec<Vec<usize>>> {
        prop::collection::vec(prop::collection::vec(0usize..4, 0..4), 1..6)
    }
}
