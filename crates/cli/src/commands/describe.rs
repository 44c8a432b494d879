// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ld describe`: print the canonical description, or check it against a fixture.

use anyhow::{Context, Result};
use clap::Args;
use ld_engine::{describe, EngineConfig};
use std::path::PathBuf;

use crate::exit_error::ExitError;

#[derive(Args)]
pub struct DescribeArgs {
    /// Job definition (TOML)
    pub job: PathBuf,

    /// Include parameters and resolved artifact keys
    #[arg(long)]
    pub resolve: bool,

    /// Compare against a stored description instead of printing it
    #[arg(long, value_name = "FIXTURE")]
    pub check: Option<PathBuf>,
}

pub fn handle(args: DescribeArgs) -> Result<()> {
    let job = super::load_job(&args.job, EngineConfig::default())?;
    let actual = describe::render(&job.describe(args.resolve))?;

    let Some(fixture) = args.check else {
        print!("{actual}");
        return Ok(());
    };

    let expected = std::fs::read_to_string(&fixture)
        .with_context(|| format!("failed to read {}", fixture.display()))?;
    match describe::first_difference(&expected, &actual) {
        None => {
            println!("{} matches {}", job.name(), fixture.display());
            Ok(())
        }
        Some((line, want, got)) => {
            eprintln!("line {line}:");
            eprintln!("  expected: {want}");
            eprintln!("  actual:   {got}");
            Err(ExitError::failure(format!("description differs from {}", fixture.display()))
                .into())
        }
    }
}
