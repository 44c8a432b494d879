// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use ld_engine::ActionRecord;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One line per visited action: indented by depth, with outcome and time.
pub fn format_record(record: &ActionRecord) -> String {
    let indent = "  ".repeat(record.level.depth().saturating_sub(1));
    let mut line = format!(
        "{indent}{} {} {} ({})",
        record.level,
        record.name,
        record.outcome.as_str(),
        format_elapsed(record.elapsed_ms)
    );
    if let ld_engine::ActionOutcome::Failed(error) = &record.outcome {
        line.push_str(": ");
        line.push_str(error);
    }
    line
}

/// Milliseconds as `850ms`, `2.4s` or `3m05s`.
pub fn format_elapsed(ms: u64) -> String {
    match ms {
        0..=999 => format!("{ms}ms"),
        1_000..=59_999 => format!("{:.1}s", ms as f64 / 1000.0),
        _ => format!("{}m{:02}s", ms / 60_000, (ms % 60_000) / 1000),
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
