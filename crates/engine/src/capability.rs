// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injected capability for running external commands.
//!
//! The engine never spawns processes itself; the host picks a runner
//! (local processes here, containers or remote shells elsewhere).

use async_trait::async_trait;
use ld_core::CommandError;
use std::time::Duration;

/// Captured result of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self { exit_code: 0, stdout: stdout.into(), stderr: String::new() }
    }
}

/// Runs an external command and returns its output.
///
/// A non-zero exit status is reported as [`CommandError::Failed`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[String]) -> Result<CommandOutput, CommandError>;
}

/// Runs commands as local child processes.
#[derive(Debug, Clone, Default)]
pub struct LocalCommandRunner {
    timeout: Option<Duration>,
}

impl LocalCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every command, independently of action timeouts.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl CommandRunner for LocalCommandRunner {
    async fn run(&self, argv: &[String]) -> Result<CommandOutput, CommandError> {
        let (program, args) = argv.split_first().ok_or(CommandError::Empty)?;
        let command = argv.join(" ");
        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args).kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, cmd.output()).await {
                Ok(result) => result,
                Err(_) => return Err(CommandError::Timeout { command, after: limit }),
            },
            None => cmd.output().await,
        }
        .map_err(|source| CommandError::Spawn { command: command.clone(), source })?;

        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(CommandError::Failed { command, exit_code, stderr: stderr.trim().to_string() });
        }
        Ok(CommandOutput { exit_code, stdout, stderr })
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{CommandOutput, CommandRunner};
    use async_trait::async_trait;
    use ld_core::CommandError;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone)]
    enum Reply {
        Output(CommandOutput),
        Fail { exit_code: i32, stderr: String },
    }

    #[derive(Default)]
    struct FakeState {
        calls: Vec<Vec<String>>,
        replies: HashMap<String, Reply>,
        delays: HashMap<String, Duration>,
    }

    /// Command runner for tests.
    ///
    /// Records every argv and answers by program name; unknown programs
    /// succeed with empty output.
    #[derive(Clone, Default)]
    pub struct FakeCommandRunner {
        inner: Arc<Mutex<FakeState>>,
    }

    impl FakeCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `program` with the given stdout.
        pub fn respond(&self, program: &str, stdout: &str) -> &Self {
            self.inner
                .lock()
                .replies
                .insert(program.to_string(), Reply::Output(CommandOutput::stdout(stdout)));
            self
        }

        /// Make `program` exit with a failure.
        pub fn fail(&self, program: &str, exit_code: i32, stderr: &str) -> &Self {
            self.inner.lock().replies.insert(
                program.to_string(),
                Reply::Fail { exit_code, stderr: stderr.to_string() },
            );
            self
        }

        /// Make `program` take `delay` before answering.
        pub fn delay(&self, program: &str, delay: Duration) -> &Self {
            self.inner.lock().delays.insert(program.to_string(), delay);
            self
        }

        /// Every argv received, in order.
        pub fn calls(&self) -> Vec<Vec<String>> {
            self.inner.lock().calls.clone()
        }

        /// Programs invoked, in order.
        pub fn programs(&self) -> Vec<String> {
            self.inner.lock().calls.iter().filter_map(|c| c.first().cloned()).collect()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeCommandRunner {
        async fn run(&self, argv: &[String]) -> Result<CommandOutput, CommandError> {
            let program = argv.first().cloned().ok_or(CommandError::Empty)?;
            let (reply, delay) = {
                let mut state = self.inner.lock();
                state.calls.push(argv.to_vec());
                (state.replies.get(&program).cloned(), state.delays.get(&program).copied())
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match reply {
                None => Ok(CommandOutput::default()),
                Some(Reply::Output(out)) => Ok(out),
                Some(Reply::Fail { exit_code, stderr }) => {
                    Err(CommandError::Failed { command: argv.join(" "), exit_code, stderr })
                }
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCommandRunner;

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
