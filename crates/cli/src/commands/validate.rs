// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ld validate`

use anyhow::Result;
use clap::Args;
use ld_core::JobError;
use ld_engine::EngineConfig;
use std::path::PathBuf;

use crate::color;
use crate::exit_error::ExitError;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ValidateArgs {
    /// Job definition (TOML)
    pub job: PathBuf,
}

pub fn handle(args: ValidateArgs, format: OutputFormat) -> Result<()> {
    let mut job = super::load_job(&args.job, EngineConfig::default())?;
    let errors = match job.validate() {
        Ok(()) => Vec::new(),
        Err(JobError::Invalid(errors)) => errors,
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Text => {
            if errors.is_empty() {
                println!("{} is valid ({} actions)", job.name(), job.tree().len());
            }
            for error in &errors {
                println!("{}", color::failure(&error.to_string()));
            }
        }
        OutputFormat::Json => {
            let report = serde_json::json!({
                "job": job.name(),
                "status": job.status(),
                "errors": errors,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ExitError::failure(format!("job is invalid: {} error(s)", errors.len())).into())
    }
}
