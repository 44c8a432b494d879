// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ld run`: validate, then run a job until it completes, fails or is canceled.

use anyhow::Result;
use clap::Args;
use ld_core::{JobError, JobStatus};
use ld_engine::EngineConfig;
use std::path::PathBuf;

use crate::color;
use crate::env;
use crate::exit_error::{ExitError, CANCELED};
use crate::output::{format_record, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Job definition (TOML)
    pub job: PathBuf,

    /// Directory for downloads and generated files [env: LD_WORK_DIR]
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,
}

pub async fn handle(args: RunArgs, format: OutputFormat) -> Result<()> {
    let mut config = EngineConfig::default();
    if let Some(dir) = args.work_dir.or_else(env::work_dir) {
        config = config.work_dir(dir);
    }

    let mut job = super::load_job(&args.job, config)?;
    if let Err(e) = job.validate() {
        if let JobError::Invalid(errors) = &e {
            for error in errors {
                eprintln!("{}", color::failure(&error.to_string()));
            }
        }
        return Err(ExitError::failure(e.to_string()).into());
    }

    let cancel = job.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, canceling at the next action");
            cancel.cancel();
        }
    });
    let result = job.run().await;
    interrupt.abort();

    match format {
        OutputFormat::Text => {
            for record in job.history() {
                println!("{}", format_record(record));
            }
            println!("{} {}", color::header(job.name()), job.status());
        }
        OutputFormat::Json => {
            let report = serde_json::json!({
                "job": job.name(),
                "status": job.status(),
                "actions": job.history(),
                "error": result.as_ref().err().map(|e| e.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    match result {
        Ok(()) => Ok(()),
        Err(e) if job.status() == JobStatus::Canceled => Err(ExitError::new(CANCELED, e.to_string()).into()),
        Err(e) => Err(ExitError::failure(e.to_string()).into()),
    }
}
