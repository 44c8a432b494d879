// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dotted positional index of an action within the resolved tree.
//!
//! Top-level actions are `1`, `2`, `3`; children of action `2` are `2.1`,
//! `2.2`, and so on. Ordering compares the integer components, so `2.10`
//! sorts after `2.9`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a dotted level string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelParseError {
    #[error("empty level")]
    Empty,
    #[error("invalid level component `{component}` in `{input}`")]
    Component { input: String, component: String },
}

/// Position of an action in the tree, one 1-based index per depth.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(Vec<u32>);

impl Level {
    /// Level of the `position`-th (1-based) top-level action.
    pub fn top(position: u32) -> Self {
        Self(vec![position])
    }

    /// Level of the `position`-th (1-based) child of this action.
    pub fn child(&self, position: u32) -> Self {
        let mut parts = self.0.clone();
        parts.push(position);
        Self(parts)
    }

    /// Nesting depth; top-level actions have depth 1.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Level {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(LevelParseError::Empty);
        }
        let parts = s
            .split('.')
            .map(|c| match c.parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(LevelParseError::Component {
                    input: s.to_string(),
                    component: c.to_string(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(parts))
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "level_tests.rs"]
mod tests;
