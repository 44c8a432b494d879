// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable parameter mappings bound to actions at construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from typed parameter lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("missing required parameter `{0}`")]
    Missing(String),
    #[error("parameter `{name}` must be {expected}")]
    Invalid { name: String, expected: &'static str },
}

/// A resolved parameter mapping.
///
/// Keys are kept sorted so that serialized output is canonical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used when assembling parameters in code.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Nested mapping under `key`, if present and a table.
    pub fn section(&self, key: &str) -> Result<Option<Parameters>, ParamError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Parameters(map.clone()))),
            Some(_) => Err(invalid(key, "a table")),
        }
    }

    pub fn str(&self, key: &str) -> Result<Option<&str>, ParamError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(invalid(key, "a string")),
        }
    }

    pub fn require_str(&self, key: &str) -> Result<&str, ParamError> {
        self.str(key)?.ok_or_else(|| ParamError::Missing(key.to_string()))
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, ParamError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(invalid(key, "a boolean")),
        }
    }

    pub fn u64(&self, key: &str) -> Result<Option<u64>, ParamError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| invalid(key, "a non-negative integer")),
        }
    }

    /// List of strings, or an empty list when absent.
    pub fn str_list(&self, key: &str) -> Result<Vec<String>, ParamError> {
        match self.0.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| invalid(key, "a list of strings")))
                .collect(),
            Some(_) => Err(invalid(key, "a list of strings")),
        }
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn invalid(name: &str, expected: &'static str) -> ParamError {
    ParamError::Invalid { name: name.to_string(), expected }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
