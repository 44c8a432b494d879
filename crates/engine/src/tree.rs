// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Arena of actions and the pipelines that order them.
//!
//! Every action is a [`Node`]; every ordered list of actions is a
//! [`Pipeline`]. A node owns at most one child pipeline. Pipelines only
//! grow by appending during resolution, and a node's [`Level`] is fixed
//! when it is pushed.

use crate::action::{Action, ActionSpec};
use ld_core::{ErrorRecord, JobError, Level};
use std::time::Duration;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Index of a pipeline in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(usize);

/// One action placed in the tree.
pub struct Node {
    pub action: Box<dyn Action>,
    pub level: Level,
    pub namespace: String,
    pub timeout: Option<Duration>,
    pub cleanup: bool,
    /// Pipeline this node belongs to.
    pub pipeline: PipelineId,
    /// Sub-pipeline owned by this node.
    pub child: Option<PipelineId>,
}

impl Node {
    pub fn name(&self) -> &str {
        self.action.name()
    }
}

/// Ordered actions plus the errors recorded against them.
#[derive(Debug, Default)]
pub struct Pipeline {
    owner: Option<NodeId>,
    actions: Vec<NodeId>,
    errors: Vec<ErrorRecord>,
}

impl Pipeline {
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub fn actions(&self) -> &[NodeId] {
        &self.actions
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }
}

/// The resolved action tree of a job.
pub struct ActionTree {
    nodes: Vec<Node>,
    pipelines: Vec<Pipeline>,
}

impl std::fmt::Debug for ActionTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let actions: Vec<String> =
            self.nodes.iter().map(|n| format!("{} {}", n.level, n.name())).collect();
        f.debug_struct("ActionTree").field("actions", &actions).finish()
    }
}

impl Default for ActionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionTree {
    /// Create a tree holding only the empty root pipeline.
    pub fn new() -> Self {
        Self { nodes: Vec::new(), pipelines: vec![Pipeline::default()] }
    }

    pub fn root(&self) -> PipelineId {
        PipelineId(0)
    }

    /// Append `spec` (and its children) to `pipeline`.
    ///
    /// Fails with a conflict if the pipeline already holds an action with
    /// the same name; nothing is added in that case.
    pub fn push(&mut self, pipeline: PipelineId, spec: ActionSpec) -> Result<NodeId, JobError> {
        if let Some(existing) = self.find_in(pipeline, spec.name()) {
            let node = &self.nodes[existing.0];
            return Err(JobError::Conflict {
                action: Some(node.name().to_string()),
                level: Some(node.level.clone()),
                message: format!("duplicate action name `{}` in pipeline", spec.name()),
            });
        }
        self.check_children_unique(&spec)?;
        Ok(self.insert(pipeline, spec))
    }

    fn check_children_unique(&self, spec: &ActionSpec) -> Result<(), JobError> {
        let mut seen = std::collections::HashSet::new();
        for child in &spec.children {
            if !seen.insert(child.name()) {
                return Err(JobError::Conflict {
                    action: Some(spec.name().to_string()),
                    level: None,
                    message: format!(
                        "duplicate action name `{}` in pipeline of `{}`",
                        child.name(),
                        spec.name()
                    ),
                });
            }
            self.check_children_unique(child)?;
        }
        Ok(())
    }

    fn insert(&mut self, pipeline: PipelineId, spec: ActionSpec) -> NodeId {
        let position = self.pipelines[pipeline.0].actions.len() as u32 + 1;
        let level = match self.pipelines[pipeline.0].owner {
            Some(owner) => self.nodes[owner.0].level.child(position),
            None => Level::top(position),
        };
        let id = NodeId(self.nodes.len());
        let ActionSpec { action, namespace, timeout, cleanup, children } = spec;
        self.nodes.push(Node { action, level, namespace, timeout, cleanup, pipeline, child: None });
        self.pipelines[pipeline.0].actions.push(id);

        if !children.is_empty() {
            let child = PipelineId(self.pipelines.len());
            self.pipelines.push(Pipeline { owner: Some(id), ..Pipeline::default() });
            self.nodes[id.0].child = Some(child);
            for spec in children {
                self.insert(child, spec);
            }
        }
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn pipeline(&self, id: PipelineId) -> &Pipeline {
        &self.pipelines[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in pre-order, which is also level order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.pipelines[0].actions.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(child) = self.nodes[id.0].child {
                stack.extend(self.pipelines[child.0].actions.iter().rev().copied());
            }
        }
        out
    }

    /// Action named `name` directly inside `pipeline`.
    pub fn find_in(&self, pipeline: PipelineId, name: &str) -> Option<NodeId> {
        self.pipelines[pipeline.0].actions.iter().copied().find(|id| self.nodes[id.0].name() == name)
    }

    /// First action named `name` anywhere in the tree, in pre-order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.preorder().into_iter().find(|id| self.nodes[id.0].name() == name)
    }

    /// Follow a path of names from the root, e.g. `["fvp-deploy", "apply-overlay-image"]`.
    pub fn find_path(&self, path: &[&str]) -> Option<NodeId> {
        let mut pipeline = self.root();
        let mut found = None;
        for (i, name) in path.iter().enumerate() {
            let id = self.find_in(pipeline, name)?;
            found = Some(id);
            if i + 1 < path.len() {
                pipeline = self.nodes[id.0].child?;
            }
        }
        found
    }

    /// Direct children of `id`, in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes[id.0].child {
            Some(child) => &self.pipelines[child.0].actions,
            None => &[],
        }
    }

    pub(crate) fn record_error(&mut self, pipeline: PipelineId, record: ErrorRecord) {
        self.pipelines[pipeline.0].errors.push(record);
    }

    /// Every error recorded in the tree, in level order.
    pub fn errors(&self) -> Vec<ErrorRecord> {
        let mut all: Vec<ErrorRecord> =
            self.pipelines.iter().flat_map(|p| p.errors.iter().cloned()).collect();
        all.sort_by(|a, b| a.level.cmp(&b.level));
        all
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tests;
