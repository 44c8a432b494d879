// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ld strategies`

use anyhow::Result;
use ld_strategies::{strategies, KINDS};

use crate::color;
use crate::output::OutputFormat;

pub fn handle(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for kind in KINDS {
                println!(
                    "{} {}",
                    color::header(&kind.to_string()),
                    color::context(&format!("(selected by `{}`)", kind.selector()))
                );
                for tag in strategies(kind) {
                    println!("  {tag}");
                }
            }
        }
        OutputFormat::Json => {
            let kinds: Vec<_> = KINDS
                .iter()
                .map(|kind| {
                    serde_json::json!({
                        "kind": kind.to_string(),
                        "selector": kind.selector(),
                        "strategies": strategies(*kind),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&kinds)?);
        }
    }
    Ok(())
}
