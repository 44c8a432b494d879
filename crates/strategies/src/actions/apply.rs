// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Install the compressed overlay into whatever the device boots from.

use super::{artifacts, ensure_dir};
use async_trait::async_trait;
use ld_core::{ActionError, ArtifactKind, Parameters};
use ld_engine::{argv, Action, ArtifactRef, Connection, RunContext};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Linux partition type ids as reported by `partx`.
const LINUX_PARTITION_TYPES: &[&str] = &["0x83", "0fc63daf-8483-4772-8e79-3d69d8477de4"];

async fn overlay_path(ctx: &RunContext<'_>) -> Result<PathBuf, ActionError> {
    let overlay = ctx.path(&artifacts::overlay_file())?;
    tokio::fs::metadata(&overlay).await.map_err(|e| ActionError::io(&overlay, e))?;
    Ok(overlay)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Shell scripts take their paths as positional arguments, never inline.
const UNPACK_GZIP: &str = r#"cd "$1" && gzip -dc "$2" | cpio -idm"#;
const UNPACK_PLAIN: &str = r#"cd "$1" && cpio -idm < "$2""#;
const REPACK: &str = r#"cd "$1" && find . | cpio -o -H newc | gzip -9 > "$2""#;

fn script(body: &str, args: [&str; 2]) -> Vec<String> {
    argv(["sh", "-c", body, "sh", args[0], args[1]])
}

/// Unpack the overlay into the ramdisk when one is deployed.
///
/// The ramdisk is rewritten unless its image sets `install_overlay = false`.
/// The repacked ramdisk replaces the downloaded one in the store so the
/// boot reads the patched file.
pub struct ApplyOverlayTftp {
    parameters: Parameters,
    ramdisk: Option<ArtifactRef>,
    decompressed: bool,
}

impl ApplyOverlayTftp {
    /// `install_overlay` is the ramdisk image's flag, if it set one.
    pub fn new(has_ramdisk: bool, install_overlay: Option<bool>) -> Self {
        let force_ramdisk = has_ramdisk && install_overlay != Some(false);
        Self {
            parameters: Parameters::new().with("force_ramdisk", force_ramdisk),
            ramdisk: force_ramdisk.then(|| artifacts::downloaded("ramdisk")),
            decompressed: false,
        }
    }

    /// The download already decompressed the ramdisk, so it is a plain
    /// cpio archive rather than a gzipped one.
    pub fn decompressed(mut self, decompressed: bool) -> Self {
        self.decompressed = decompressed;
        if self.force_ramdisk() {
            self.parameters =
                std::mem::take(&mut self.parameters).with("ramdisk_compressed", !decompressed);
        }
        self
    }

    pub fn force_ramdisk(&self) -> bool {
        self.ramdisk.is_some()
    }
}

#[async_trait]
impl Action for ApplyOverlayTftp {
    fn name(&self) -> &str {
        "apply-overlay-tftp"
    }

    fn summary(&self) -> &str {
        "apply overlay to the ramdisk"
    }

    fn description(&self) -> &str {
        "unpack the overlay into the deployed ramdisk and repack it"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(120))
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        let mut inputs = vec![artifacts::overlay_file()];
        inputs.extend(self.ramdisk.clone());
        inputs
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        self.ramdisk.iter().cloned().collect()
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let Some(ramdisk_ref) = &self.ramdisk else {
            tracing::info!("no ramdisk to modify, overlay left for the rootfs");
            return Ok(connection);
        };
        let ramdisk = ctx.path(ramdisk_ref)?;
        let overlay = overlay_path(ctx).await?;

        let scratch = ctx.scratch_dir();
        let extract = scratch.join("ramdisk");
        ensure_dir(&extract).await?;
        let repacked = scratch.join("ramdisk.cpio.gz");
        let (extract_arg, ramdisk_arg, overlay_arg, repacked_arg) =
            (display(&extract), display(&ramdisk), display(&overlay), display(&repacked));

        let unpack = if self.decompressed { UNPACK_PLAIN } else { UNPACK_GZIP };
        ctx.run_command(&script(unpack, [&extract_arg, &ramdisk_arg])).await?;
        ctx.run_command(&argv(["tar", "-xzf", overlay_arg.as_str(), "-C", extract_arg.as_str()]))
            .await?;
        ctx.run_command(&script(REPACK, [&extract_arg, &repacked_arg])).await?;

        tracing::info!(ramdisk = %repacked.display(), "ramdisk repacked with overlay");
        ctx.publish(ramdisk_ref, repacked);
        Ok(connection)
    }
}

/// How the image's root partition is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootPartition {
    /// Recorded in the store by the deploy stage.
    Stored(ArtifactRef),
    /// Read from the image's partition table.
    Derive,
}

/// Copy the overlay into the root partition of a disk image.
pub struct ApplyOverlayImage {
    parameters: Parameters,
    image: ArtifactRef,
    root: RootPartition,
}

impl ApplyOverlayImage {
    pub fn new(label: &str, root: RootPartition) -> Self {
        let source = match root {
            RootPartition::Stored(_) => "stored",
            RootPartition::Derive => "derived",
        };
        Self {
            parameters: Parameters::new().with("image", label).with("root_partition", source),
            image: artifacts::downloaded(label),
            root,
        }
    }

    pub fn root(&self) -> &RootPartition {
        &self.root
    }

    fn output() -> ArtifactRef {
        ArtifactRef::new("apply-overlay-image", "output", "applied", ArtifactKind::Flag)
    }
}

#[async_trait]
impl Action for ApplyOverlayImage {
    fn name(&self) -> &str {
        "apply-overlay-image"
    }

    fn summary(&self) -> &str {
        "apply overlay to the image"
    }

    fn description(&self) -> &str {
        "copy the overlay into the root partition of the deployed image"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(120))
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        let mut inputs = vec![artifacts::overlay_file(), self.image.clone()];
        if let RootPartition::Stored(reference) = &self.root {
            inputs.push(reference.clone());
        }
        inputs
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![Self::output()]
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let partition = match &self.root {
            RootPartition::Stored(reference) => ctx.integer(reference)?,
            RootPartition::Derive => derive_root_partition(ctx, &ctx.path(&self.image)?).await?,
        };
        let overlay = overlay_path(ctx).await?;
        let image = ctx.path(&self.image)?;
        tracing::info!(partition, image = %image.display(), "copying overlay into root partition");

        let device = format!("/dev/sda{partition}");
        let (image, overlay) = (display(&image), display(&overlay));
        ctx.run_command(&argv([
            "guestfish",
            "--rw",
            "-a",
            image.as_str(),
            "-m",
            device.as_str(),
            "tar-in",
            overlay.as_str(),
            "/",
            "compress:gzip",
        ]))
        .await?;
        ctx.publish(&Self::output(), true);
        Ok(connection)
    }
}

/// First Linux partition in the image's partition table.
async fn derive_root_partition(ctx: &RunContext<'_>, image: &Path) -> Result<i64, ActionError> {
    let image = display(image);
    let out = ctx
        .run_command(&argv(["partx", "--show", "--noheadings", "--output", "NR,TYPE", image.as_str()]))
        .await?;
    parse_root_partition(&out.stdout).ok_or_else(|| {
        ActionError::failed(format!("no root partition specified and none found in {image}"))
    })
}

pub(crate) fn parse_root_partition(partx: &str) -> Option<i64> {
    partx.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let number = fields.next()?.parse().ok()?;
        let kind = fields.next()?.to_ascii_lowercase();
        LINUX_PARTITION_TYPES.contains(&kind.as_str()).then_some(number)
    })
}

/// Unpack the overlay into a directory mounted into the container.
#[derive(Default)]
pub struct ApplyOverlayDocker {
    parameters: Parameters,
}

impl ApplyOverlayDocker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Action for ApplyOverlayDocker {
    fn name(&self) -> &str {
        "apply-overlay-docker"
    }

    fn summary(&self) -> &str {
        "apply overlay to a container volume"
    }

    fn description(&self) -> &str {
        "unpack the overlay into the directory mounted into the container"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(60))
    }

    fn inputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::overlay_file()]
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::docker_volume()]
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let overlay = overlay_path(ctx).await?;
        let volume = ctx.scratch_dir().join("volume");
        ensure_dir(&volume).await?;
        let (overlay_arg, volume_arg) = (display(&overlay), display(&volume));
        ctx.run_command(&argv(["tar", "-xzf", overlay_arg.as_str(), "-C", volume_arg.as_str()]))
            .await?;
        ctx.publish(&artifacts::docker_volume(), volume);
        Ok(connection)
    }
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;
