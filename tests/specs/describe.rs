// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical descriptions of the fixture jobs.
//!
//! Run with `LD_BLESS=1` to rewrite the stored descriptions after an
//! intended change to a pipeline.

use crate::prelude::*;

fn check_description(name: &str) {
    let dir = TempDir::new().unwrap();
    let mut job = fixture_job(name, &FakeCommandRunner::new(), dir.path());
    job.validate().unwrap_or_else(|e| panic!("{name}: {e}"));

    let actual = describe::render(&job.describe(false)).unwrap();
    let path = fixtures().join("describe").join(format!("{name}.json"));
    if std::env::var_os("LD_BLESS").is_some() {
        std::fs::write(&path, &actual).unwrap();
        return;
    }
    let expected = std::fs::read_to_string(&path).unwrap();
    similar_asserts::assert_eq!(expected, actual);
}

#[test]
fn tftp_description_is_stable() {
    check_description("tftp");
}

#[test]
fn fvp_description_is_stable() {
    check_description("fvp");
}

#[test]
fn docker_description_is_stable() {
    check_description("docker");
}

#[test]
fn image_description_is_stable() {
    check_description("image");
}

#[test]
fn description_is_the_same_before_and_after_validation() {
    let dir = TempDir::new().unwrap();
    let mut job = fixture_job("tftp", &FakeCommandRunner::new(), dir.path());
    let before = describe::render(&job.describe(false)).unwrap();
    job.validate().unwrap();
    let after = describe::render(&job.describe(false)).unwrap();

    similar_asserts::assert_eq!(before, after);
}

#[test]
fn stored_description_parses_back() {
    let text = std::fs::read_to_string(fixtures().join("describe/fvp.json")).unwrap();
    let records = describe::parse(&text).unwrap();

    assert_eq!(records.len(), 15);
    assert_eq!(records[0].name, "fvp-deploy");
    assert!(records.iter().all(|r| r.parameters.is_none() && r.artifacts.is_none()));
    assert_eq!(describe::render(&records).unwrap(), text);
}

#[test]
fn resolved_description_carries_parameters() {
    let dir = TempDir::new().unwrap();
    let job = fixture_job("tftp", &FakeCommandRunner::new(), dir.path());
    let records = job.describe(true);

    let apply = records.iter().find(|r| r.name == "apply-overlay-tftp").unwrap();
    let parameters = apply.parameters.as_ref().unwrap();
    assert_eq!(parameters.bool("force_ramdisk").unwrap(), Some(true));
    // Nothing has run, so nothing is in the store yet.
    assert!(records.iter().all(|r| r.artifacts.as_ref().is_some_and(|a| a.is_empty())));
}
