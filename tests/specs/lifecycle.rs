// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validate and run phases of whole jobs.

use crate::prelude::*;

/// The fake `tar` writes nothing, so lay down the tarball `compress-overlay` would produce.
fn stage_overlay_tarball(work_dir: &Path, level: &str) {
    let scratch = work_dir.join(format!("{level}-compress-overlay"));
    std::fs::create_dir_all(&scratch).unwrap();
    std::fs::write(scratch.join("overlay.tar.gz"), b"").unwrap();
}

#[tokio::test]
async fn docker_job_runs_to_completion() {
    let dir = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    commands.respond("docker", "c0ffee\n");
    stage_overlay_tarball(dir.path(), "1.2.1");
    let mut job = fixture_job("docker", &commands, dir.path());

    job.validate().unwrap();
    job.run().await.unwrap();

    assert_eq!(job.status(), JobStatus::Complete);
    let names: Vec<_> = job.history().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "docker-deploy",
            "check-docker-image",
            "lava-overlay",
            "compress-overlay",
            "apply-overlay-docker",
            "docker-boot",
            "start-docker-container",
            "lava-test-shell",
            "finalize",
        ]
    );
    assert!(job.history().iter().all(|r| r.outcome == ActionOutcome::Completed));

    let store = job.store();
    assert_eq!(store.get_text(&key("common", "lava-test-shell", "results", "smoke")).unwrap(), "pass");
    assert_eq!(store.get_text(&key("common", "start-docker-container", "container", "id")).unwrap(), "c0ffee");
    assert!(store.get_flag(&key("common", "finalize", "job", "finished")).unwrap());

    let script = std::fs::read_to_string(dir.path().join("1.2-lava-overlay/overlay/lava-test/smoke/run.sh")).unwrap();
    assert!(script.ends_with("uname -a\n"));

    let calls = commands.calls();
    assert!(calls.contains(&vec![
        "docker".to_string(),
        "exec".to_string(),
        "ld-common-2".to_string(),
        "sh".to_string(),
        "/lava-test/smoke/run.sh".to_string(),
    ]));
    assert_eq!(
        calls.last().unwrap(),
        &vec!["docker".to_string(), "rm".to_string(), "-f".to_string(), "c0ffee".to_string()]
    );
}

#[tokio::test]
async fn run_requires_a_valid_job() {
    let dir = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    let mut job = fixture_job("docker", &commands, dir.path());

    let err = job.run().await.unwrap_err();

    assert!(matches!(err, JobError::Usage(_)));
    assert_eq!(job.status(), JobStatus::NotStarted);
    assert!(commands.calls().is_empty());
}

#[tokio::test]
async fn invalid_job_reports_every_error_and_cannot_run() {
    let dir = TempDir::new().unwrap();
    let text = job_text("fvp")
        .replace("image = \"/opt/model/FVP_Base_RevC-2xAEMvA\"\n", "")
        .replace("prompts = [\"root@fvp:~#\"]\n", "prompts = []\n");
    let mut job = resolve(&text, &FakeCommandRunner::new(), dir.path());

    let Err(JobError::Invalid(errors)) = job.validate() else {
        panic!("expected an invalid job");
    };
    let messages: Vec<_> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "[2.2] run-fvp: missing required parameter `image`",
            "[2.3] wait-fvp-prompt: missing required parameter `prompts`",
        ]
    );
    assert_eq!(job.errors(), errors);
    assert!(matches!(job.run().await, Err(JobError::Usage(_))));
}

#[tokio::test]
async fn cancellation_still_runs_cleanup() {
    let dir = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    let mut job = fixture_job("docker", &commands, dir.path());
    job.validate().unwrap();

    job.cancel_token().cancel();
    let err = job.run().await.unwrap_err();

    assert!(matches!(err, JobError::Canceled { .. }));
    assert_eq!(job.status(), JobStatus::Canceled);
    let outcomes = outcomes(&job);
    assert_eq!(outcomes.first().unwrap(), &("docker-deploy".to_string(), "canceled".to_string()));
    assert_eq!(outcomes.last().unwrap(), &("finalize".to_string(), "completed".to_string()));
    // No container was started, so there is nothing to remove.
    assert!(commands.calls().is_empty());
}

#[tokio::test]
async fn failure_skips_later_stages_and_runs_finalize() {
    let dir = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    commands.fail("docker", 1, "Error response from daemon: pull access denied");
    let mut job = fixture_job("docker", &commands, dir.path());
    job.validate().unwrap();

    let err = job.run().await.unwrap_err();

    assert_eq!(job.status(), JobStatus::Failed);
    let (action, level) = err.context().unwrap();
    assert_eq!((action, level.to_string().as_str()), ("check-docker-image", "1.1"));
    let outcomes = outcomes(&job);
    assert_eq!(outcomes[1], ("check-docker-image".to_string(), "failed".to_string()));
    assert_eq!(outcomes[2], ("lava-overlay".to_string(), "skipped".to_string()));
    assert!(outcomes.contains(&("docker-boot".to_string(), "skipped".to_string())));
    assert_eq!(outcomes.last().unwrap(), &("finalize".to_string(), "completed".to_string()));
}

#[tokio::test]
async fn job_timeout_from_definition_bounds_the_run() {
    let dir = TempDir::new().unwrap();
    let commands = FakeCommandRunner::new();
    commands.delay("docker", std::time::Duration::from_secs(5));
    let text = job_text("docker").replace("[timeouts]\naction = 45\n", "[timeouts]\njob = 1\n");
    let mut job = resolve(&text, &commands, dir.path());
    assert_eq!(job.config().job_timeout, Some(std::time::Duration::from_secs(1)));
    job.validate().unwrap();

    let err = job.run().await.unwrap_err();

    assert!(matches!(err, JobError::JobTimeout { .. }));
    assert_eq!(job.status(), JobStatus::Failed);
    let outcomes = outcomes(&job);
    assert_eq!(outcomes[1], ("check-docker-image".to_string(), "canceled".to_string()));
    assert!(outcomes.contains(&("docker-boot".to_string(), "skipped".to_string())));
    assert_eq!(outcomes.last().unwrap(), &("finalize".to_string(), "completed".to_string()));
}
