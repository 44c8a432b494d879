// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetch one image into the job's working directory.

use super::{artifacts, ensure_dir};
use async_trait::async_trait;
use ld_core::{ActionError, ParamError, Parameters};
use ld_engine::{argv, Action, ArtifactRef, Connection, Findings, RunContext};
use std::path::{Path, PathBuf};
use std::time::Duration;

const COMPRESSIONS: &[(&str, &str)] = &[("gz", "gzip"), ("xz", "xz"), ("zstd", "zstd")];

/// Where an image comes from.
#[derive(Debug, PartialEq, Eq)]
enum Source<'a> {
    Local(&'a Path),
    Remote(&'a str),
}

fn source(url: &str) -> Option<Source<'_>> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(Source::Local(Path::new(path)));
    }
    if url.starts_with('/') {
        return Some(Source::Local(Path::new(url)));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        return Some(Source::Remote(url));
    }
    None
}

/// `download-{label}`: copy or fetch `images.{label}.url`, decompressing
/// when `compression` is set.
pub struct Download {
    name: String,
    label: String,
    parameters: Parameters,
}

impl Download {
    pub fn new(label: &str, parameters: Parameters) -> Self {
        Self { name: format!("download-{label}"), label: label.to_string(), parameters }
    }

    fn compression(&self) -> Result<Option<&'static str>, ParamError> {
        let Some(name) = self.parameters.str("compression")? else {
            return Ok(None);
        };
        COMPRESSIONS
            .iter()
            .find(|(tag, _)| *tag == name)
            .map(|(_, tool)| Some(*tool))
            .ok_or(ParamError::Invalid { name: "compression".to_string(), expected: "one of gz, xz, zstd" })
    }
}

#[async_trait]
impl Action for Download {
    fn name(&self) -> &str {
        &self.name
    }

    fn summary(&self) -> &str {
        "download image"
    }

    fn description(&self) -> &str {
        "fetch an image into the working directory and decompress it"
    }

    fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn default_timeout(&self) -> Option<Duration> {
        Some(Duration::from_secs(300))
    }

    fn outputs(&self) -> Vec<ArtifactRef> {
        vec![artifacts::downloaded(&self.label)]
    }

    fn validate(&self, findings: &mut Findings) {
        if let Some(url) = findings.check(self.parameters.require_str("url")) {
            if source(url).is_none() {
                findings.push(ParamError::Invalid {
                    name: "url".to_string(),
                    expected: "a file://, http:// or https:// URL or an absolute path",
                });
            }
        }
        findings.check(self.compression());
        findings.check(self.parameters.bool("install_overlay"));
        if let Some(Some(0)) = findings.check(self.parameters.u64("root_partition")) {
            findings.push(ParamError::Invalid {
                name: "root_partition".to_string(),
                expected: "a positive integer",
            });
        }
    }

    async fn run(
        &self,
        ctx: &mut RunContext<'_>,
        connection: Option<Connection>,
    ) -> Result<Option<Connection>, ActionError> {
        let url = self.parameters.require_str("url")?;
        let dir = ctx.scratch_dir();
        ensure_dir(&dir).await?;

        let file_name = url.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(&self.label);
        let mut dest = dir.join(file_name);
        match source(url) {
            Some(Source::Local(path)) => {
                tokio::fs::copy(path, &dest).await.map_err(|e| ActionError::io(path, e))?;
            }
            Some(Source::Remote(url)) => {
                let dest_arg = dest.display().to_string();
                ctx.run_command(&argv(["curl", "-fsSL", "-o", dest_arg.as_str(), url])).await?;
            }
            None => return Err(ActionError::failed(format!("unsupported url `{url}`"))),
        }

        if let Some(tool) = self.compression()? {
            dest = decompress(ctx, tool, &dest).await?;
        }
        tracing::info!(image = %self.label, path = %dest.display(), "image downloaded");
        ctx.publish(&artifacts::downloaded(&self.label), dest);
        Ok(connection)
    }
}

/// Decompress in place; the result drops the compression extension.
async fn decompress(ctx: &RunContext<'_>, tool: &str, path: &Path) -> Result<PathBuf, ActionError> {
    let file = path.display().to_string();
    let mut command = argv([tool, "-d", "-f"]);
    if tool == "zstd" {
        command.push("--rm".to_string());
    }
    command.push(file);
    ctx.run_command(&command).await?;
    Ok(path.with_extension(""))
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
