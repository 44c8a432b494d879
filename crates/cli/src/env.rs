// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the CLI. Nothing else reads the environment.

use std::path::PathBuf;

/// Filter used when `LD_LOG` is unset or unparsable.
pub const DEFAULT_LOG: &str = "warn";

/// Tracing filter directives from `LD_LOG` (e.g. `info` or `ld_engine=debug`).
pub fn log_filter() -> String {
    std::env::var("LD_LOG").unwrap_or_else(|_| DEFAULT_LOG.to_string())
}

/// Working directory for downloads and generated files, from `LD_WORK_DIR`.
pub fn work_dir() -> Option<PathBuf> {
    std::env::var_os("LD_WORK_DIR").filter(|v| !v.is_empty()).map(PathBuf::from)
}
