// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy selection and tree construction for whole job definitions.

use crate::prelude::*;
use ld_engine::ActionTree;
use ld_strategies::StageKind;

fn tree(text: &str) -> Result<ActionTree, JobError> {
    ld_strategies::resolve(&JobDefinition::parse(text).unwrap(), &StrategyRegistry::builtin())
}

fn top_level(tree: &ActionTree) -> Vec<(String, String)> {
    tree.pipeline(tree.root())
        .actions()
        .iter()
        .map(|&id| {
            let node = tree.node(id);
            (node.level.to_string(), node.action.name().to_string())
        })
        .collect()
}

#[test]
fn stages_become_top_level_actions_in_order() {
    let tree = tree(&job_text("tftp")).unwrap();

    assert_eq!(
        top_level(&tree),
        vec![
            ("1".to_string(), "tftp-deploy".to_string()),
            ("2".to_string(), "minimal-boot".to_string()),
            ("3".to_string(), "lava-test-shell".to_string()),
            ("4".to_string(), "finalize".to_string()),
        ]
    );
}

#[test]
fn finalize_is_cleanup_in_the_default_namespace() {
    let tree = tree(&job_text("fvp")).unwrap();
    let last = *tree.pipeline(tree.root()).actions().last().unwrap();
    let node = tree.node(last);

    assert_eq!(node.action.name(), "finalize");
    assert!(node.cleanup);
    assert_eq!(node.namespace, DEFAULT_NAMESPACE);
    let inputs: Vec<_> = node.action.inputs().iter().map(|r| r.resolve(&node.namespace).to_string()).collect();
    assert_eq!(inputs, vec!["target:run-fvp/container/id"]);
}

#[test]
fn namespaces_follow_the_stage() {
    let tree = tree(&job_text("fvp")).unwrap();
    let compress = tree.find_path(&["fvp-deploy", "lava-overlay", "compress-overlay"]).unwrap();

    assert_eq!(tree.node(compress).namespace, "target");
    assert_eq!(tree.node(compress).level.to_string(), "1.5.1");
}

#[test]
fn two_test_stages_conflict() {
    let text = format!(
        "{}\n[[actions]]\n[actions.test]\ndefinitions = [{{ name = \"again\", steps = [\"true\"] }}]\n",
        job_text("docker")
    );

    let err = tree(&text).unwrap_err();

    assert!(matches!(err, JobError::Conflict { .. }), "{err}");
    assert!(err.to_string().contains("duplicate action name `lava-test-shell`"), "{err}");
}

#[test]
fn unknown_strategy_lists_the_known_ones() {
    let text = job_text("docker").replace("to = \"docker\"", "to = \"nfs\"");

    let err = tree(&text).unwrap_err();

    assert_eq!(
        err.to_string(),
        "configuration error: unknown deploy strategy `nfs` in stage 1; expected one of: docker, fvp, image, tftp"
    );
}

#[test]
fn boot_stage_needs_a_method() {
    let text = job_text("docker").replace("method = \"docker\"", "");

    let err = tree(&text).unwrap_err();

    assert_eq!(err.to_string(), "configuration error: boot stage 2 does not set `method`");
}

#[test]
fn incomplete_registry_is_a_configuration_error() {
    let mut registry = StrategyRegistry::empty();
    registry.register(StageKind::Test, "shell", ld_strategies::stages::test::shell);
    let definition = JobDefinition::parse(&job_text("docker")).unwrap();

    let err = ld_strategies::resolve(&definition, &registry).unwrap_err();

    assert_eq!(err.to_string(), "configuration error: no factory registered for deploy strategy `docker`");
}

#[test]
fn job_parameters_carry_name_and_device_type() {
    let dir = TempDir::new().unwrap();
    let job = fixture_job("tftp", &FakeCommandRunner::new(), dir.path());

    assert_eq!(job.name(), "beaglebone tftp smoke");
    assert_eq!(job.parameters().str("device_type").unwrap(), Some("beaglebone-black"));
    assert_eq!(job.config().job_timeout, Some(std::time::Duration::from_secs(1800)));
}
