// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ld-engine: action tree, validate/run lifecycle and description engine

pub mod action;
pub mod capability;
pub mod context;
pub mod describe;
mod job;
mod runner;
pub mod tree;
mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use action::{Action, ActionSpec, ArtifactRef, Connection, Findings};
#[cfg(any(test, feature = "test-support"))]
pub use capability::FakeCommandRunner;
pub use capability::{CommandOutput, CommandRunner, LocalCommandRunner};
pub use context::{argv, RunContext};
pub use describe::DescriptionRecord;
pub use job::{EngineConfig, Job};
pub use runner::{ActionOutcome, ActionRecord};
pub use tree::{ActionTree, Node, NodeId, Pipeline, PipelineId};
pub use validate::validate_tree;
