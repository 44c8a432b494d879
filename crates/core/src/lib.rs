// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ld-core: shared types for the lab dispatcher job engine

pub mod macros;

pub mod error;
pub mod level;
pub mod namespace;
pub mod params;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::{ActionError, CommandError, ErrorCategory, ErrorRecord, JobError};
pub use level::{Level, LevelParseError};
pub use namespace::{Artifact, ArtifactKind, DataKey, NamespaceStore, StoreError, DEFAULT_NAMESPACE};
pub use params::{ParamError, Parameters};
pub use status::JobStatus;
