//! External command execution behind an injectable [`Executor`] trait.
//!
//! Every shell-out in the engine (service reloads, compose invocations,
//! diagnostics probes) goes through this seam so tests can substitute a
//! scripted mock instead of touching the host.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl ExecResult {
    /// Combined stdout and stderr, trimmed, for error reporting.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim().to_string();
        let err = self.stderr.trim();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(err);
        }
        out
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Interface for running external commands and probing PATH.
///
/// Injected into the installer, the service controller, and the diagnostics
/// probes so unit tests can run against a scripted [`test_helpers::MockExecutor`]
/// without mutable global state.
pub trait Executor: std::fmt::Debug {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, allowing failure (returns the result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned at all.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command in a specific working directory, allowing failure.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned at all.
    fn run_in_unchecked(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check if a program is available on PATH. Looked up at call time and
    /// never cached: the host may change between invocations.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    fn spawn(program: &str, args: &[&str], dir: Option<&Path>) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }
        let output = cmd
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }
}

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = Self::spawn(program, args, None)?;
        if !result.success {
            bail!(
                "{program} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.combined()
            );
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        Self::spawn(program, args, None)
    }

    fn run_in_unchecked(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        Self::spawn(program, args, Some(dir))
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Shared test helpers for engine and mechanism unit tests.
///
/// Provides a configurable [`MockExecutor`] so individual test modules do not
/// have to duplicate the boilerplate.
#[cfg(test)]
pub(crate) mod test_helpers {
    use super::{ExecResult, Executor};
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    /// A scripted mock executor.
    ///
    /// Maintains a queue of `(success, stdout)` responses consumed in FIFO
    /// order. When the queue is empty any call returns a failed response with
    /// stdout `"unexpected call"`. Every invocation is recorded as a single
    /// `"program arg arg ..."` string retrievable via [`calls`](Self::calls).
    ///
    /// Use [`with_which`](Self::with_which) to configure which program names
    /// [`Executor::which`] reports as present (defaults to none).
    #[derive(Debug, Default)]
    pub struct MockExecutor {
        responses: Mutex<VecDeque<(bool, String)>>,
        which: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockExecutor {
        /// Create a mock with a single successful response.
        #[must_use]
        pub fn ok(stdout: &str) -> Self {
            Self::with_responses(vec![(true, stdout.to_string())])
        }

        /// Create a mock with a single failed response (empty stdout).
        #[must_use]
        pub fn fail() -> Self {
            Self::with_responses(vec![(false, String::new())])
        }

        /// Create a mock from an ordered list of `(success, stdout)` pairs.
        #[must_use]
        pub fn with_responses(responses: Vec<(bool, String)>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                which: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Mark a program name as present on PATH.
        #[must_use]
        pub fn with_which(mut self, program: &str) -> Self {
            self.which.push(program.to_string());
            self
        }

        /// Every command invocation made so far, oldest first.
        #[must_use]
        pub fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .map_or_else(|_| Vec::new(), |guard| guard.clone())
        }

        fn record(&self, program: &str, args: &[&str]) {
            if let Ok(mut guard) = self.calls.lock() {
                let mut line = program.to_string();
                for arg in args {
                    line.push(' ');
                    line.push_str(arg);
                }
                guard.push(line);
            }
        }

        fn next(&self) -> (bool, String) {
            self.responses.lock().map_or_else(
                |_| (false, "mutex poisoned".to_string()),
                |mut guard| {
                    guard
                        .pop_front()
                        .unwrap_or_else(|| (false, "unexpected call".to_string()))
                },
            )
        }

        fn next_result(&self) -> ExecResult {
            let (success, stdout) = self.next();
            ExecResult {
                stdout,
                stderr: String::new(),
                success,
                code: Some(i32::from(!success)),
            }
        }
    }

    impl Executor for MockExecutor {
        fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            self.record(program, args);
            let result = self.next_result();
            if result.success {
                Ok(result)
            } else {
                anyhow::bail!("{program} failed: {}", result.combined())
            }
        }

        fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            self.record(program, args);
            Ok(self.next_result())
        }

        fn run_in_unchecked(
            &self,
            _dir: &Path,
            program: &str,
            args: &[&str],
        ) -> anyhow::Result<ExecResult> {
            self.record(program, args);
            Ok(self.next_result())
        }

        fn which(&self, program: &str) -> bool {
            self.which.iter().any(|p| p == program)
        }
    }
}
