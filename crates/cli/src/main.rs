// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ld: resolve, validate, describe and run device test jobs.

mod color;
mod commands;
mod env;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use exit_error::ExitError;
use output::OutputFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ld",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")"),
    about = "Resolve, validate and run device test jobs",
    styles = color::styles()
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and validate a job without running it
    Validate(commands::validate::ValidateArgs),
    /// Print the canonical description of a resolved job
    Describe(commands::describe::DescribeArgs),
    /// Validate a job, then run it
    Run(commands::run::RunArgs),
    /// List the strategies each stage can select
    Strategies,
}

fn init_tracing() {
    let filter = EnvFilter::try_new(env::log_filter()).unwrap_or_else(|_| EnvFilter::new(env::DEFAULT_LOG));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Validate(args) => commands::validate::handle(args, cli.output),
        Commands::Describe(args) => commands::describe::handle(args),
        Commands::Run(args) => commands::run::handle(args, cli.output).await,
        Commands::Strategies => commands::strategies::handle(cli.output),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        let code = match e.downcast_ref::<ExitError>() {
            Some(exit) => {
                if !exit.message.is_empty() {
                    eprintln!("error: {}", exit.message);
                }
                exit.code
            }
            None => {
                eprintln!("error: {e:#}");
                1
            }
        };
        std::process::exit(code);
    }
}
