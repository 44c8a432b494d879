// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deploy strategies, selected by `to`.

use super::StageContext;
use crate::actions::{
    ApplyOverlayDocker, ApplyOverlayImage, ApplyOverlayTftp, CheckDockerImage, CompressOverlay,
    Download, LavaOverlay, RootPartition, StageAction,
};
use ld_core::Parameters;
use ld_engine::ActionSpec;

fn downloads(images: &[(String, Parameters)], namespace: &str) -> Vec<ActionSpec> {
    images
        .iter()
        .map(|(label, params)| ActionSpec::new(Download::new(label, params.clone()), namespace))
        .collect()
}

fn overlay(ctx: &StageContext<'_>) -> ActionSpec {
    ActionSpec::new(LavaOverlay::new(ctx.test_definitions()), ctx.namespace())
        .child(ActionSpec::new(CompressOverlay::new(), ctx.namespace()))
}

fn root_partition(image: &Parameters) -> Option<i64> {
    image
        .u64("root_partition")
        .ok()
        .flatten()
        .filter(|n| *n > 0)
        .and_then(|n| i64::try_from(n).ok())
}

fn ramdisk(images: &[(String, Parameters)]) -> Option<&Parameters> {
    images.iter().find(|(label, _)| label == "ramdisk").map(|(_, params)| params)
}

/// Overlay install for the deployed ramdisk, if any.
///
/// A ramdisk with `compression` set is already a plain cpio archive once
/// downloaded.
fn apply_overlay_tftp(ramdisk: Option<&Parameters>) -> ApplyOverlayTftp {
    match ramdisk {
        Some(params) => ApplyOverlayTftp::new(true, params.bool("install_overlay").ok().flatten())
            .decompressed(params.contains("compression")),
        None => ApplyOverlayTftp::new(false, None),
    }
}

/// Kernel, device tree and ramdisk for a TFTP boot.
pub fn tftp(ctx: &StageContext<'_>) -> ActionSpec {
    let images = ctx.images();
    let ramdisk = ramdisk(&images);
    let stage = StageAction::new(
        "tftp-deploy",
        "tftp deployment",
        "download images for a TFTP boot and prepare the test overlay",
        ctx.parameters.clone(),
    )
    .requires_images(&["kernel"]);

    ActionSpec::new(stage, ctx.namespace())
        .children(downloads(&images, ctx.namespace()))
        .child(overlay(ctx))
        .child(ActionSpec::new(apply_overlay_tftp(ramdisk), ctx.namespace()))
}

/// A single disk image with the overlay copied into its root partition.
pub fn image(ctx: &StageContext<'_>) -> ActionSpec {
    let images = ctx.images();
    let mut stage = StageAction::new(
        "image-deploy",
        "image deployment",
        "download a disk image and install the test overlay into it",
        ctx.parameters.clone(),
    )
    .requires_images(&[]);

    let target = images
        .iter()
        .find(|(_, params)| params.contains("root_partition"))
        .or_else(|| images.iter().find(|(label, _)| label == "image"))
        .or_else(|| images.first());
    let partition = target.and_then(|(label, params)| Some((label, root_partition(params)?)));
    if let Some((label, partition)) = partition {
        stage = stage.root_partition(label, partition);
    }
    let apply = target.map(|(label, _)| {
        let root = match partition {
            Some(_) => RootPartition::Stored(stage.root_partition_ref(label)),
            None => RootPartition::Derive,
        };
        ApplyOverlayImage::new(label, root)
    });

    let mut spec = ActionSpec::new(stage, ctx.namespace())
        .children(downloads(&images, ctx.namespace()))
        .child(overlay(ctx));
    if let Some(apply) = apply {
        spec = spec.child(ActionSpec::new(apply, ctx.namespace()));
    }
    spec
}

/// Firmware and disk images for an FVP model.
///
/// The overlay goes into the root partition of every image that names
/// one, and into the ramdisk unless that image opts out.
pub fn fvp(ctx: &StageContext<'_>) -> ActionSpec {
    let images = ctx.images();
    let ramdisk = ramdisk(&images);
    let mut stage = StageAction::new(
        "fvp-deploy",
        "fvp deployment",
        "download images for an FVP model and prepare the test overlay",
        ctx.parameters.clone(),
    )
    .requires_images(&[]);

    let mut target = None;
    for (label, params) in &images {
        if let Some(partition) = root_partition(params) {
            stage = stage.root_partition(label, partition);
            target.get_or_insert(label.as_str());
        }
    }
    let apply_image = target.map(|label| {
        ApplyOverlayImage::new(label, RootPartition::Stored(stage.root_partition_ref(label)))
    });

    let mut spec = ActionSpec::new(stage, ctx.namespace())
        .children(downloads(&images, ctx.namespace()))
        .child(overlay(ctx));
    if let Some(apply) = apply_image {
        spec = spec.child(ActionSpec::new(apply, ctx.namespace()));
    }
    if ramdisk.is_some() {
        spec = spec.child(ActionSpec::new(apply_overlay_tftp(ramdisk), ctx.namespace()));
    }
    spec
}

/// A container image with the overlay unpacked into a volume.
pub fn docker(ctx: &StageContext<'_>) -> ActionSpec {
    let image = ctx.parameters.str("image").ok().flatten();
    let stage = StageAction::new(
        "docker-deploy",
        "docker deployment",
        "check the container image and unpack the test overlay into a volume",
        ctx.parameters.clone(),
    );

    ActionSpec::new(stage, ctx.namespace())
        .child(ActionSpec::new(CheckDockerImage::new("image", image), ctx.namespace()))
        .child(overlay(ctx))
        .child(ActionSpec::new(ApplyOverlayDocker::new(), ctx.namespace()))
}

#[cfg(test)]
#[path = "deploy_tests.rs"]
mod tests;
