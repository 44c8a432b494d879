// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strategy selection: stage parameters to an action subtree.

use crate::definition::StageKind;
use crate::stages::{boot, deploy, test, StageContext};
use ld_core::JobError;
use ld_engine::ActionSpec;
use std::collections::BTreeMap;

/// Builds a stage's subtree. Pure: no I/O, no errors.
pub type Factory = fn(&StageContext<'_>) -> ActionSpec;

pub const DEPLOY_STRATEGIES: &[&str] = &["docker", "fvp", "image", "tftp"];
pub const BOOT_STRATEGIES: &[&str] = &["docker", "fvp", "minimal"];
pub const TEST_STRATEGIES: &[&str] = &["shell"];

const DEFAULT_TEST_STRATEGY: &str = "shell";

/// Stage kinds, in the order they are listed.
pub const KINDS: [StageKind; 3] = [StageKind::Deploy, StageKind::Boot, StageKind::Test];

/// Every tag the selector accepts for `kind`.
pub fn strategies(kind: StageKind) -> &'static [&'static str] {
    match kind {
        StageKind::Deploy => DEPLOY_STRATEGIES,
        StageKind::Boot => BOOT_STRATEGIES,
        StageKind::Test => TEST_STRATEGIES,
    }
}

/// Tag to factory mapping per stage kind.
#[derive(Default)]
pub struct StrategyRegistry {
    factories: BTreeMap<StageKind, BTreeMap<&'static str, Factory>>,
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The strategies shipped with this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry
            .register(StageKind::Deploy, "docker", deploy::docker)
            .register(StageKind::Deploy, "fvp", deploy::fvp)
            .register(StageKind::Deploy, "image", deploy::image)
            .register(StageKind::Deploy, "tftp", deploy::tftp)
            .register(StageKind::Boot, "docker", boot::docker)
            .register(StageKind::Boot, "fvp", boot::fvp)
            .register(StageKind::Boot, "minimal", boot::minimal)
            .register(StageKind::Test, "shell", test::shell);
        registry
    }

    pub fn register(&mut self, kind: StageKind, tag: &'static str, factory: Factory) -> &mut Self {
        self.factories.entry(kind).or_default().insert(tag, factory);
        self
    }

    /// Registered `(kind, tag)` pairs in order.
    pub fn registered(&self) -> Vec<(StageKind, &'static str)> {
        self.factories
            .iter()
            .flat_map(|(kind, tags)| tags.keys().map(move |tag| (*kind, *tag)))
            .collect()
    }

    /// Every known tag has a factory and every factory a known tag.
    pub fn check(&self) -> Result<(), JobError> {
        for kind in KINDS {
            let registered = self.factories.get(&kind);
            for tag in strategies(kind) {
                if !registered.is_some_and(|tags| tags.contains_key(tag)) {
                    return Err(JobError::Configuration(format!(
                        "no factory registered for {kind} strategy `{tag}`"
                    )));
                }
            }
        }
        for (kind, tag) in self.registered() {
            if !strategies(kind).contains(&tag) {
                return Err(JobError::Configuration(format!(
                    "{kind} strategy `{tag}` is registered but not a known strategy"
                )));
            }
        }
        Ok(())
    }

    /// Build the subtree for one stage from its selector parameter.
    pub fn select(&self, kind: StageKind, ctx: &StageContext<'_>) -> Result<ActionSpec, JobError> {
        let stage = ctx.index + 1;
        let selector = kind.selector();
        let tag = match ctx.parameters.str(selector) {
            Ok(Some(tag)) => tag,
            Ok(None) if kind == StageKind::Test => DEFAULT_TEST_STRATEGY,
            Ok(None) => {
                return Err(JobError::Configuration(format!(
                    "{kind} stage {stage} does not set `{selector}`"
                )))
            }
            Err(e) => return Err(JobError::Configuration(format!("{kind} stage {stage}: {e}"))),
        };
        let factory = self.factories.get(&kind).and_then(|tags| tags.get(tag)).ok_or_else(|| {
            JobError::Configuration(format!(
                "unknown {kind} strategy `{tag}` in stage {stage}; expected one of: {}",
                strategies(kind).join(", ")
            ))
        })?;
        tracing::debug!(%kind, strategy = tag, stage, "strategy selected");
        Ok(factory(ctx))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
