// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where the test overlay ends up for each kind of deployment.

use crate::prelude::*;

fn stage_overlay_tarball(work_dir: &Path, level: &str) {
    let scratch = work_dir.join(format!("{level}-compress-overlay"));
    std::fs::create_dir_all(&scratch).unwrap();
    std::fs::write(scratch.join("overlay.tar.gz"), b"").unwrap();
}

fn fvp_deploy(images: &Path, root_partition: &str) -> String {
    format!(
        r#"
name = "fvp deploy"

[[actions]]
[actions.deploy]
to = "fvp"

[actions.deploy.images.bl1]
url = "{bl1}"

[actions.deploy.images.disk]
url = "{disk}"
{root_partition}
"#,
        bl1 = local_image(images, "bl1.bin"),
        disk = local_image(images, "disk.img"),
    )
}

fn image_deploy(images: &Path) -> String {
    format!(
        "name = \"image deploy\"\n[[actions]]\n[actions.deploy]\nto = \"image\"\nimages.image = {{ url = \"{}\" }}\n",
        local_image(images, "debian.img")
    )
}

fn tftp_deploy(images: &Path, install_overlay: &str) -> String {
    format!(
        r#"
name = "tftp deploy"

[[actions]]
[actions.deploy]
to = "tftp"

[actions.deploy.images.kernel]
url = "{kernel}"

[actions.deploy.images.ramdisk]
url = "{ramdisk}"
{install_overlay}
"#,
        kernel = local_image(images, "zImage"),
        ramdisk = local_image(images, "rootfs.cpio.gz"),
    )
}

fn guestfish_device(commands: &FakeCommandRunner) -> Option<String> {
    let call = commands.calls().into_iter().find(|c| c[0] == "guestfish")?;
    let at = call.iter().position(|arg| arg == "-m")?;
    call.get(at + 1).cloned()
}

#[tokio::test]
async fn stored_root_partition_is_used_without_probing() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    stage_overlay_tarball(dir.path(), "1.3.1");
    let mut job = resolve(&fvp_deploy(images.path(), "root_partition = 2"), &commands, dir.path());

    job.validate().unwrap();
    job.run().await.unwrap();

    assert_eq!(guestfish_device(&commands).as_deref(), Some("/dev/sda2"));
    assert!(!commands.programs().contains(&"partx".to_string()));
    let downloaded = job.store().get_path(&key("common", "download-disk", "file", "disk")).unwrap();
    assert_eq!(std::fs::read(downloaded).unwrap(), b"disk.img");
}

#[tokio::test]
async fn stored_root_partition_with_missing_overlay_fails_on_the_overlay() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    let mut job = resolve(&fvp_deploy(images.path(), "root_partition = 2"), &commands, dir.path());
    job.validate().unwrap();

    let err = job.run().await.unwrap_err().to_string();

    assert!(err.starts_with("[1.4] apply-overlay-image failed:"), "{err}");
    assert!(err.contains("No such file or directory"), "{err}");
    assert!(!err.contains("no root partition"), "{err}");
    assert_eq!(commands.programs(), vec!["tar".to_string()]);
}

#[tokio::test]
async fn fvp_without_root_partition_leaves_images_untouched() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    let mut job = resolve(&fvp_deploy(images.path(), ""), &commands, dir.path());

    job.validate().unwrap();
    job.run().await.unwrap();

    assert!(outcomes(&job).iter().all(|(name, _)| name != "apply-overlay-image"));
    assert_eq!(commands.programs(), vec!["tar".to_string()]);
}

#[tokio::test]
async fn image_root_partition_is_derived_from_the_partition_table() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    commands.respond("partx", " 1 0x0c\n 2 0x83\n");
    stage_overlay_tarball(dir.path(), "1.2.1");
    let mut job = resolve(&image_deploy(images.path()), &commands, dir.path());

    job.validate().unwrap();
    job.run().await.unwrap();

    assert_eq!(guestfish_device(&commands).as_deref(), Some("/dev/sda2"));
    assert!(job.store().get_flag(&key("common", "apply-overlay-image", "output", "applied")).unwrap());
}

#[tokio::test]
async fn image_without_linux_partition_fails() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    commands.respond("partx", " 1 0x0c\n");
    stage_overlay_tarball(dir.path(), "1.2.1");
    let mut job = resolve(&image_deploy(images.path()), &commands, dir.path());
    job.validate().unwrap();

    let err = job.run().await.unwrap_err().to_string();

    assert!(err.contains("no root partition specified and none found in"), "{err}");
    assert!(!commands.programs().contains(&"guestfish".to_string()));
}

#[tokio::test]
async fn ramdisk_is_repacked_by_default() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    stage_overlay_tarball(dir.path(), "1.3.1");
    let mut job = resolve(&tftp_deploy(images.path(), ""), &commands, dir.path());

    job.validate().unwrap();
    job.run().await.unwrap();

    assert_eq!(commands.programs(), vec!["tar", "sh", "tar", "sh"]);
    let ramdisk = job.store().get_path(&key("common", "download-ramdisk", "file", "ramdisk")).unwrap();
    assert!(ramdisk.ends_with("1.4-apply-overlay-tftp/ramdisk.cpio.gz"));
    let unpack = &commands.calls()[1];
    assert!(unpack[2].contains("gzip -dc"), "{unpack:?}");
    assert!(unpack.last().unwrap().ends_with("1.2-download-ramdisk/rootfs.cpio.gz"));
}

#[tokio::test]
async fn decompressed_ramdisk_is_not_gunzipped_again() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    stage_overlay_tarball(dir.path(), "1.3.1");
    let mut job = resolve(&tftp_deploy(images.path(), "compression = \"gz\""), &commands, dir.path());

    job.validate().unwrap();
    job.run().await.unwrap();

    assert_eq!(commands.programs(), vec!["gzip", "tar", "sh", "tar", "sh"]);
    let calls = commands.calls();
    assert!(calls[0].last().unwrap().ends_with("1.2-download-ramdisk/rootfs.cpio.gz"));
    let unpack = &calls[2];
    assert!(!unpack[2].contains("gzip"), "{unpack:?}");
    assert!(unpack.last().unwrap().ends_with("1.2-download-ramdisk/rootfs.cpio"));
}

#[tokio::test]
async fn fvp_model_boots_the_repacked_ramdisk() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    commands.respond("docker", "root@fvp:~#\n");
    stage_overlay_tarball(dir.path(), "1.3.1");
    let text = format!(
        r#"
name = "fvp ramdisk"

[[actions]]
[actions.deploy]
to = "fvp"
images.bl1 = {{ url = "{bl1}" }}
images.ramdisk = {{ url = "{ramdisk}" }}

[[actions]]
[actions.boot]
method = "fvp"
image = "/opt/model/FVP_Base_RevC-2xAEMvA"
arguments = ["-C bp.secureflashloader.fname={{BL1}}", "-C ramdisk={{RAMDISK}}"]
prompts = ["root@fvp:~#"]
docker = {{ name = "fvp:11.24" }}
"#,
        bl1 = local_image(images.path(), "bl1.bin"),
        ramdisk = local_image(images.path(), "ramdisk.cpio.gz"),
    );
    let mut job = resolve(&text, &commands, dir.path());

    job.validate().unwrap();
    job.run().await.unwrap();

    let repacked = dir.path().join("1.4-apply-overlay-tftp/ramdisk.cpio.gz");
    let run = commands.calls().into_iter().find(|c| c[..2] == ["docker", "run"]).unwrap();
    assert_eq!(run.last().unwrap(), &format!("-C ramdisk={}", repacked.display()));
    assert!(!run.iter().any(|arg| arg.contains("1.2-download-ramdisk")), "{run:?}");
}

#[tokio::test]
async fn ramdisk_is_left_alone_when_overlay_install_is_disabled() {
    let dir = TempDir::new().unwrap();
    let images = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    let mut job = resolve(&tftp_deploy(images.path(), "install_overlay = false"), &commands, dir.path());

    job.validate().unwrap();
    job.run().await.unwrap();

    assert_eq!(commands.programs(), vec!["tar"]);
    let ramdisk = job.store().get_path(&key("common", "download-ramdisk", "file", "ramdisk")).unwrap();
    assert!(ramdisk.ends_with("1.2-download-ramdisk/rootfs.cpio.gz"));
}
