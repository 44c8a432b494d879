// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::Bench;
use ld_core::{Artifact, StoreError};
use yare::parameterized;

/// Overlay tarball that exists on disk.
fn real_overlay(bench: &mut Bench) -> PathBuf {
    let overlay = bench.work_dir().join("overlay.tar.gz");
    std::fs::write(&overlay, b"tarball").unwrap();
    bench.seed(&artifacts::overlay_file(), overlay.clone());
    overlay
}

#[parameterized(
    ramdisk_without_flag = { true, None, true },
    ramdisk_opted_in = { true, Some(true), true },
    ramdisk_opted_out = { true, Some(false), false },
    no_ramdisk = { false, None, false },
)]
fn ramdisk_policy(has_ramdisk: bool, install_overlay: Option<bool>, forced: bool) {
    let action = ApplyOverlayTftp::new(has_ramdisk, install_overlay);

    assert_eq!(action.force_ramdisk(), forced);
    assert_eq!(action.parameters().bool("force_ramdisk").unwrap(), Some(forced));
    assert_eq!(action.inputs().contains(&artifacts::downloaded("ramdisk")), forced);
}

fn script_args(call: &[String]) -> (&str, &str, &str) {
    assert_eq!(&call[..2], &["sh".to_string(), "-c".to_string()]);
    assert_eq!(call[3], "sh");
    (call[2].as_str(), call[4].as_str(), call[5].as_str())
}

#[tokio::test]
async fn tftp_repacks_the_ramdisk() {
    let mut bench = Bench::new();
    let overlay = real_overlay(&mut bench);
    bench.seed(&artifacts::downloaded("ramdisk"), PathBuf::from("/images/ramdisk.cpio.gz"));

    bench.run(&ApplyOverlayTftp::new(true, None), None).await.unwrap();

    let scratch = bench.work_dir().join("1-apply-overlay-tftp");
    let (extract, repacked) =
        (scratch.join("ramdisk").display().to_string(), scratch.join("ramdisk.cpio.gz"));
    let calls = bench.commands.calls();
    assert_eq!(bench.commands.programs(), vec!["sh", "tar", "sh"]);
    assert_eq!(script_args(&calls[0]), (UNPACK_GZIP, extract.as_str(), "/images/ramdisk.cpio.gz"));
    assert_eq!(calls[1][2], overlay.display().to_string());
    let repacked_arg = repacked.display().to_string();
    assert_eq!(script_args(&calls[2]), (REPACK, extract.as_str(), repacked_arg.as_str()));
    assert_eq!(
        bench.read(&artifacts::downloaded("ramdisk")).unwrap(),
        &Artifact::Path(repacked)
    );
}

#[tokio::test]
async fn tftp_unpacks_a_decompressed_ramdisk_as_plain_cpio() {
    let mut bench = Bench::new();
    real_overlay(&mut bench);
    bench.seed(&artifacts::downloaded("ramdisk"), PathBuf::from("/images/rootfs.cpio"));
    let action = ApplyOverlayTftp::new(true, None).decompressed(true);
    assert_eq!(action.parameters().bool("ramdisk_compressed").unwrap(), Some(false));

    bench.run(&action, None).await.unwrap();

    let calls = bench.commands.calls();
    let (body, _, ramdisk) = script_args(&calls[0]);
    assert_eq!(body, UNPACK_PLAIN);
    assert!(!body.contains("gzip"));
    assert_eq!(ramdisk, "/images/rootfs.cpio");
}

#[tokio::test]
async fn tftp_passes_paths_with_spaces_as_arguments() {
    let mut bench = Bench::in_subdir("work dir; rm -rf");
    real_overlay(&mut bench);
    let ramdisk = bench.work_dir().join("my ramdisk.cpio.gz");
    bench.seed(&artifacts::downloaded("ramdisk"), ramdisk.clone());

    bench.run(&ApplyOverlayTftp::new(true, None), None).await.unwrap();

    let scratch = bench.work_dir().join("1-apply-overlay-tftp");
    let extract = scratch.join("ramdisk").display().to_string();
    let calls = bench.commands.calls();
    for call in [&calls[0], &calls[2]] {
        let (body, dir, _) = script_args(call);
        assert!(!body.contains("work dir"), "{body}");
        assert_eq!(dir, extract);
    }
    assert_eq!(script_args(&calls[0]).2, ramdisk.display().to_string());
}

#[tokio::test]
async fn tftp_without_ramdisk_does_nothing() {
    let mut bench = Bench::new();
    let action = ApplyOverlayTftp::new(false, None).decompressed(true);

    bench.run(&action, None).await.unwrap();

    assert!(bench.commands.calls().is_empty());
    assert!(action.outputs().is_empty());
    assert!(!action.parameters().contains("ramdisk_compressed"));
    assert!(bench.read(&artifacts::downloaded("ramdisk")).is_err());
}

#[tokio::test]
async fn tftp_reports_missing_overlay_file() {
    let mut bench = Bench::new();
    bench.seed(&artifacts::overlay_file(), PathBuf::from("/nonexistent/overlay.tar.gz"));
    bench.seed(&artifacts::downloaded("ramdisk"), PathBuf::from("/images/ramdisk.cpio.gz"));

    let err = bench.run(&ApplyOverlayTftp::new(true, None), None).await.unwrap_err();

    assert!(err.to_string().contains("No such file or directory"), "{err}");
    assert!(bench.commands.calls().is_empty());
}

#[tokio::test]
async fn stored_root_partition_skips_derivation() {
    let mut bench = Bench::new();
    let stored = artifacts::root_partition("fvp-deploy", "disk");
    bench.seed(&stored, 1i64);
    bench.seed(&artifacts::overlay_file(), PathBuf::from("/nonexistent/overlay.tar.gz"));
    let action = ApplyOverlayImage::new("disk", RootPartition::Stored(stored));

    let err = bench.run(&action, None).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("No such file or directory"), "{message}");
    assert!(!message.contains("no root partition"), "{message}");
    assert!(bench.commands.calls().is_empty());
}

#[tokio::test]
async fn stored_root_partition_copies_overlay() {
    let mut bench = Bench::new();
    let stored = artifacts::root_partition("image-deploy", "image");
    bench.seed(&stored, 2i64);
    let overlay = real_overlay(&mut bench);
    bench.seed(&artifacts::downloaded("image"), PathBuf::from("/images/disk.img"));
    let action = ApplyOverlayImage::new("image", RootPartition::Stored(stored));

    bench.run(&action, None).await.unwrap();

    let overlay = overlay.display().to_string();
    assert_eq!(
        bench.commands.calls(),
        vec![argv([
            "guestfish",
            "--rw",
            "-a",
            "/images/disk.img",
            "-m",
            "/dev/sda2",
            "tar-in",
            overlay.as_str(),
            "/",
            "compress:gzip",
        ])]
    );
    assert_eq!(bench.read(&ApplyOverlayImage::output()).unwrap(), &Artifact::Flag(true));
}

#[tokio::test]
async fn stored_root_partition_must_be_recorded() {
    let mut bench = Bench::new();
    let stored = artifacts::root_partition("fvp-deploy", "disk");
    let action = ApplyOverlayImage::new("disk", RootPartition::Stored(stored));

    let err = bench.run(&action, None).await.unwrap_err();
    assert!(matches!(err, ActionError::Store(StoreError::NotFound(_))));
}

#[tokio::test]
async fn derives_root_partition_from_partition_table() {
    let mut bench = Bench::new();
    bench.commands.respond("partx", "1 0xef\n2 0x83\n");
    real_overlay(&mut bench);
    bench.seed(&artifacts::downloaded("image"), PathBuf::from("/images/disk.img"));

    bench.run(&ApplyOverlayImage::new("image", RootPartition::Derive), None).await.unwrap();

    let calls = bench.commands.calls();
    assert_eq!(bench.commands.programs(), vec!["partx", "guestfish"]);
    assert_eq!(calls[1][5], "/dev/sda2");
}

#[tokio::test]
async fn underivable_root_partition_fails() {
    let mut bench = Bench::new();
    bench.commands.respond("partx", "1 0xef\n");
    real_overlay(&mut bench);
    bench.seed(&artifacts::downloaded("image"), PathBuf::from("/images/disk.img"));

    let err = bench.run(&ApplyOverlayImage::new("image", RootPartition::Derive), None).await.unwrap_err();

    assert_eq!(err.to_string(), "no root partition specified and none found in /images/disk.img");
}

#[test]
fn image_inputs_include_stored_partition() {
    let stored = artifacts::root_partition("fvp-deploy", "disk");
    let action = ApplyOverlayImage::new("disk", RootPartition::Stored(stored.clone()));

    assert_eq!(
        action.inputs(),
        vec![artifacts::overlay_file(), artifacts::downloaded("disk"), stored]
    );
    assert_eq!(action.parameters().str("root_partition").unwrap(), Some("stored"));

    let derived = ApplyOverlayImage::new("disk", RootPartition::Derive);
    assert_eq!(derived.inputs().len(), 2);
    assert_eq!(derived.root(), &RootPartition::Derive);
}

#[parameterized(
    mbr = { "1 0xc\n2 0x83\n", Some(2) },
    gpt = { "1 c12a7328-f81f-11d2-ba4b-00a0c93ec93b\n3 0FC63DAF-8483-4772-8E79-3D69D8477DE4\n", Some(3) },
    first_linux_wins = { "5 0x83\n6 0x83\n", Some(5) },
    no_linux = { "1 0xef\n", None },
    garbage = { "NR TYPE\n\n", None },
)]
fn root_partition_from_partx(output: &str, expected: Option<i64>) {
    assert_eq!(parse_root_partition(output), expected);
}

#[tokio::test]
async fn docker_overlay_unpacks_into_volume() {
    let mut bench = Bench::new();
    let overlay = real_overlay(&mut bench);

    bench.run(&ApplyOverlayDocker::new(), None).await.unwrap();

    let volume = bench.work_dir().join("1-apply-overlay-docker").join("volume");
    assert!(volume.is_dir());
    let (overlay, volume_arg) = (overlay.display().to_string(), volume.display().to_string());
    assert_eq!(
        bench.commands.calls(),
        vec![argv(["tar", "-xzf", overlay.as_str(), "-C", volume_arg.as_str()])]
    );
    assert_eq!(bench.read(&artifacts::docker_volume()).unwrap(), &Artifact::Path(volume));
}
