// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete actions composed by the built-in strategies.

mod apply;
mod docker;
mod download;
mod finalize;
mod fvp;
mod overlay;
mod shell;
mod stage;

pub use apply::{ApplyOverlayDocker, ApplyOverlayImage, ApplyOverlayTftp, RootPartition};
pub use docker::{CheckDockerImage, StartContainer};
pub use download::Download;
pub use finalize::Finalize;
pub use fvp::{RunFvp, WaitFvpPrompt};
pub use overlay::{CompressOverlay, LavaOverlay};
pub use shell::{MinimalBoot, TestDefinition, TestShell};
pub use stage::StageAction;

use ld_core::ArtifactKind;
use ld_engine::ArtifactRef;

/// Directory inside the device where test definitions are unpacked.
pub const OVERLAY_TEST_DIR: &str = "/lava-test";

/// Store references shared between actions of different strategies.
pub mod artifacts {
    use super::*;

    /// File fetched by `download-{label}`.
    pub fn downloaded(label: &str) -> ArtifactRef {
        ArtifactRef::new(format!("download-{label}"), "file", label, ArtifactKind::Path)
    }

    pub fn overlay_dir() -> ArtifactRef {
        ArtifactRef::new("lava-overlay", "output", "dir", ArtifactKind::Path)
    }

    /// Compressed overlay tarball.
    pub fn overlay_file() -> ArtifactRef {
        ArtifactRef::new("compress-overlay", "output", "file", ArtifactKind::Path)
    }

    /// Root partition number recorded by a deploy stage for image `label`.
    pub fn root_partition(deploy: &str, label: &str) -> ArtifactRef {
        ArtifactRef::new(deploy, "root_partition", label, ArtifactKind::Integer)
    }

    pub fn docker_image() -> ArtifactRef {
        ArtifactRef::new("check-docker-image", "image", "name", ArtifactKind::Text)
    }

    pub fn docker_volume() -> ArtifactRef {
        ArtifactRef::new("apply-overlay-docker", "volume", "path", ArtifactKind::Path)
    }

    /// Container started by `action`.
    pub fn container(action: &str) -> ArtifactRef {
        ArtifactRef::new(action, "container", "id", ArtifactKind::Text)
    }

    /// Place `reference` in `namespace` when one is given.
    pub fn scoped(reference: ArtifactRef, namespace: Option<&str>) -> ArtifactRef {
        match namespace {
            Some(ns) => reference.in_namespace(ns),
            None => reference,
        }
    }
}

/// Create `dir` and its parents.
pub(crate) async fn ensure_dir(dir: &std::path::Path) -> Result<(), ld_core::ActionError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| ld_core::ActionError::io(dir, e))
}
