// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Namespaced artifact store shared between actions of one job.
//!
//! Values are addressed by `(namespace, action, label, key)`. Every call
//! names its namespace explicitly; there is no ambient default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Namespace used when a job stage does not declare one.
pub const DEFAULT_NAMESPACE: &str = "common";

/// Errors from namespace store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(DataKey),
    #[error("artifact {key} is a {found}, expected a {expected}")]
    TypeMismatch { key: DataKey, expected: ArtifactKind, found: ArtifactKind },
    #[error("artifact {0} is already registered")]
    Conflict(DataKey),
}

/// Address of an artifact within one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataKey {
    pub namespace: String,
    pub action: String,
    pub label: String,
    pub key: String,
}

impl DataKey {
    pub fn new(
        namespace: impl Into<String>,
        action: impl Into<String>,
        label: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            action: action.into(),
            label: label.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}/{}", self.namespace, self.action, self.label, self.key)
    }
}

/// Type tag of an [`Artifact`], used for static and runtime type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Path,
    Flag,
    Text,
    Integer,
    Blob,
}

crate::simple_display! {
    ArtifactKind {
        Path => "path",
        Flag => "flag",
        Text => "text",
        Integer => "integer",
        Blob => "blob",
    }
}

/// A value produced by one action for consumption by a later one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Artifact {
    Path(PathBuf),
    Flag(bool),
    Text(String),
    Integer(i64),
    Blob(serde_json::Value),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Path(_) => ArtifactKind::Path,
            Artifact::Flag(_) => ArtifactKind::Flag,
            Artifact::Text(_) => ArtifactKind::Text,
            Artifact::Integer(_) => ArtifactKind::Integer,
            Artifact::Blob(_) => ArtifactKind::Blob,
        }
    }
}

impl From<PathBuf> for Artifact {
    fn from(p: PathBuf) -> Self {
        Artifact::Path(p)
    }
}

impl From<bool> for Artifact {
    fn from(b: bool) -> Self {
        Artifact::Flag(b)
    }
}

impl From<String> for Artifact {
    fn from(s: String) -> Self {
        Artifact::Text(s)
    }
}

impl From<&str> for Artifact {
    fn from(s: &str) -> Self {
        Artifact::Text(s.to_string())
    }
}

impl From<i64> for Artifact {
    fn from(n: i64) -> Self {
        Artifact::Integer(n)
    }
}

/// Artifact store owned by a single job.
///
/// Writes are last-wins per exact key. Reads of a missing key return
/// [`StoreError::NotFound`]; typed reads never coerce.
#[derive(Debug, Clone, Default)]
pub struct NamespaceStore {
    entries: BTreeMap<DataKey, Artifact>,
}

impl NamespaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DataKey) -> Result<&Artifact, StoreError> {
        self.entries.get(key).ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    pub fn contains(&self, key: &DataKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a value, replacing any previous one. Returns the replaced value.
    pub fn set(&mut self, key: DataKey, value: impl Into<Artifact>) -> Option<Artifact> {
        let value = value.into();
        tracing::debug!(key = %key, kind = %value.kind(), "namespace store write");
        self.entries.insert(key, value)
    }

    /// Store a value that must not already exist.
    pub fn register(&mut self, key: DataKey, value: impl Into<Artifact>) -> Result<(), StoreError> {
        if self.entries.contains_key(&key) {
            return Err(StoreError::Conflict(key));
        }
        self.entries.insert(key, value.into());
        Ok(())
    }

    pub fn get_path(&self, key: &DataKey) -> Result<&Path, StoreError> {
        match self.get(key)? {
            Artifact::Path(p) => Ok(p),
            other => Err(mismatch(key, ArtifactKind::Path, other)),
        }
    }

    pub fn get_flag(&self, key: &DataKey) -> Result<bool, StoreError> {
        match self.get(key)? {
            Artifact::Flag(b) => Ok(*b),
            other => Err(mismatch(key, ArtifactKind::Flag, other)),
        }
    }

    pub fn get_text(&self, key: &DataKey) -> Result<&str, StoreError> {
        match self.get(key)? {
            Artifact::Text(s) => Ok(s),
            other => Err(mismatch(key, ArtifactKind::Text, other)),
        }
    }

    pub fn get_integer(&self, key: &DataKey) -> Result<i64, StoreError> {
        match self.get(key)? {
            Artifact::Integer(n) => Ok(*n),
            other => Err(mismatch(key, ArtifactKind::Integer, other)),
        }
    }

    /// All entries of one namespace, in key order.
    pub fn namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = (&'a DataKey, &'a Artifact)> + 'a {
        self.entries.iter().filter(move |(k, _)| k.namespace == namespace)
    }

    /// Distinct namespaces holding at least one entry.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|k| k.namespace.as_str()).collect();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn mismatch(key: &DataKey, expected: ArtifactKind, found: &Artifact) -> StoreError {
    StoreError::TypeMismatch { key: key.clone(), expected, found: found.kind() }
}

#[cfg(test)]
#[path = "namespace_tests.rs"]
mod tests;
