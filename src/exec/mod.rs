// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Process execution
//!
//! A typed command builder and runner trait so every external invocation
//! (terraform, az, aws, gh, apt) goes through one seam that tests can
//! substitute with a scripted fake.

mod environment;

pub use environment::{EnvironmentAdapter, ProcessEnvironment};

#[cfg(test)]
pub use environment::recording::RecordingEnvironment;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{CloudOpsError, CloudOpsResult};

/// A fully-specified external command
///
/// Credential-bearing invocations set `redacted` so argument values never
/// reach the logs.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    envs: HashMap<String, String>,
    redacted: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            envs: HashMap::new(),
            redacted: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }

    /// Hide argument values from log output
    pub fn redacted(mut self) -> Self {
        self.redacted = true;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Log-safe rendering of the command line
    pub fn display_line(&self) -> String {
        if self.redacted {
            format!("{} [arguments redacted]", self.program)
        } else if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Both streams joined, stdout first
    pub fn combined_output(&self) -> String {
        let mut combined = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !combined.is_empty() {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }
}

/// Trait for running external commands
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, capturing output
    ///
    /// A non-zero exit is NOT an error at this layer; callers decide what
    /// each exit code means. Only a failure to spawn the process errors.
    async fn run(&self, spec: &CommandSpec) -> CloudOpsResult<ProcessOutput>;
}

/// Runner backed by real system processes
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> CloudOpsResult<ProcessOutput> {
        info!("Running: {}", spec.display_line());
        if let Some(ref cwd) = spec.cwd {
            debug!("  in directory: {}", cwd.display());
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        if let Some(ref cwd) = spec.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(&spec.envs);

        let output = cmd.output().await.map_err(|e| CloudOpsError::CommandSpawn {
            program: spec.program.clone(),
            error: e.to_string(),
            help: Some(format!(
                "Ensure '{}' is installed and on the PATH",
                spec.program
            )),
        })?;

        let result = ProcessOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !result.success() {
            debug!(
                "Command exited with code {}: {}",
                result.exit_code,
                spec.display_line()
            );
        }

        Ok(result)
    }
}

/// Check if a command exists in the system PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_line_redaction() {
        let spec = CommandSpec::new("az")
            .args(["login", "--password", "hunter2"])
            .redacted();
        let line = spec.display_line();
        assert!(!line.contains("hunter2"));
        assert!(line.contains("az"));
    }

    #[test]
    fn test_combined_output() {
        let output = ProcessOutput {
            exit_code: 1,
            stdout: "out".into(),
            stderr: "err".into(),
        };
        assert_eq!(output.combined_output(), "out\nerr");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_system_runner_captures_output() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("sh").args(["-c", "echo hello"]);
        let output = runner.run(&spec).await.unwrap();
        assert!(output.success());
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_system_runner_spawn_failure() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("definitely-not-a-real-binary-xyz");
        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, CloudOpsError::CommandSpawn { .. }));
    }

    #[tokio::test]
    async fn test_fake_runner_rules_and_log() {
        use fake::FakeRunner;

        let runner = FakeRunner::new();
        runner.respond("terraform", Some("plan"), 2, "changes", "");

        let plan = CommandSpec::new("terraform").arg("plan");
        let output = runner.run(&plan).await.unwrap();
        assert_eq!(output.exit_code, 2);

        let init = CommandSpec::new("terraform").arg("init");
        let output = runner.run(&init).await.unwrap();
        assert_eq!(output.exit_code, 0);

        assert!(runner.invoked("terraform", Some("plan")));
        assert!(runner.invoked("terraform", Some("init")));
        assert!(!runner.invoked("terraform", Some("apply")));
    }
}
