// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ld-strategies: job definitions, the strategy selector and the
//! deploy, boot and test actions it composes.

pub mod actions;
pub mod definition;
pub mod registry;
mod resolve;
pub mod stages;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use definition::{DefinitionError, JobDefinition, Stage, StageKind, Timeouts};
pub use registry::{strategies, Factory, StrategyRegistry, KINDS};
pub use resolve::{build_job, resolve};
pub use stages::StageContext;
