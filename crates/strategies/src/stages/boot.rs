// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boot strategies, selected by `method`.

use super::StageContext;
use crate::actions::{CheckDockerImage, MinimalBoot, RunFvp, StageAction, StartContainer, WaitFvpPrompt};
use ld_engine::ActionSpec;

/// Launch the model container and wait for its console prompt.
pub fn fvp(ctx: &StageContext<'_>) -> ActionSpec {
    let params = ctx.parameters;
    let docker = params.section("docker").ok().flatten();
    let image = docker.as_ref().and_then(|d| d.str("name").ok().flatten());
    let container = ctx.container_name();
    let stage = StageAction::new(
        "boot-fvp",
        "boot fvp",
        "run the FVP model in its container until the console prompt",
        params.clone(),
    );

    ActionSpec::new(stage, ctx.namespace())
        .child(ActionSpec::new(CheckDockerImage::new("docker.name", image), ctx.namespace()))
        .child(ActionSpec::new(
            RunFvp::new(params.clone(), &container, ctx.deploy_namespace()),
            ctx.namespace(),
        ))
        .child(ActionSpec::new(WaitFvpPrompt::new(params.get("prompts").cloned()), ctx.namespace()))
}

/// Adopt a device that is already up.
pub fn minimal(ctx: &StageContext<'_>) -> ActionSpec {
    ActionSpec::new(MinimalBoot::new(ctx.parameters.clone()), ctx.namespace())
}

/// Start the deployed container and open a shell in it.
pub fn docker(ctx: &StageContext<'_>) -> ActionSpec {
    let container = ctx.container_name();
    let stage = StageAction::new(
        "docker-boot",
        "docker boot",
        "start the container and open a shell in it",
        ctx.parameters.clone(),
    );

    ActionSpec::new(stage, ctx.namespace()).child(ActionSpec::new(
        StartContainer::new(&container, ctx.deploy_namespace()),
        ctx.namespace(),
    ))
}

#[cfg(test)]
#[path = "boot_tests.rs"]
mod tests;
