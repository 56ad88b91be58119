// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Toolchain installation
//!
//! Idempotently ensures the external CLIs the pipeline shells out to:
//! terraform always, the provider CLIs per selected provider, and the
//! GitHub CLI for PR reporting. Every installer probes the installed
//! version before downloading anything.

mod cloud;
mod github;
mod terraform;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::errors::{CloudOpsError, CloudOpsResult};
use crate::exec::{CommandRunner, CommandSpec, EnvironmentAdapter};
use crate::utils::create_spinner;

/// Installs and verifies the required CLI toolchain
pub struct ToolInstaller {
    runner: Arc<dyn CommandRunner>,
    env: Arc<dyn EnvironmentAdapter>,
    http: reqwest::Client,
    install_dir: PathBuf,
    /// `GITHUB_PATH` file, when running under Actions
    github_path: Option<PathBuf>,
}

impl ToolInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, env: Arc<dyn EnvironmentAdapter>) -> Self {
        let install_dir = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local").join("bin"))
            .unwrap_or_else(|| PathBuf::from(".local/bin"));

        Self {
            runner,
            env,
            http: reqwest::Client::new(),
            install_dir,
            github_path: None,
        }
    }

    /// Override the user-local binary directory
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = dir.into();
        self
    }

    /// Propagate the install directory to later workflow steps
    pub fn with_github_path(mut self, path: Option<PathBuf>) -> Self {
        self.github_path = path;
        self
    }

    /// Install everything the configured run needs, in order
    pub async fn ensure_all(&self, config: &PipelineConfig) -> CloudOpsResult<()> {
        self.ensure_terraform(&config.versions.terraform).await?;

        if config.provider.requires_azure() {
            self.ensure_azure_cli().await?;
        }
        if config.provider.requires_aws() {
            self.ensure_aws_cli().await?;
        }

        self.ensure_github_cli(&config.versions.gh).await?;

        Ok(())
    }

    /// Run a version-check subcommand; `Some(stdout)` means the tool works
    pub(crate) async fn probe(&self, program: &str, args: &[&str]) -> Option<String> {
        let spec = CommandSpec::new(program).args(args.iter().copied());
        match self.runner.run(&spec).await {
            Ok(output) if output.success() => Some(output.stdout),
            _ => None,
        }
    }

    /// Fetch a URL to a local file, with a spinner
    pub(crate) async fn download(&self, url: &str, dest: &Path) -> CloudOpsResult<()> {
        info!("Downloading from: {}", url);
        let spinner = create_spinner(&format!("Downloading {}", url));

        let response = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, "cloudops")
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        tokio::fs::write(dest, &bytes).await?;

        spinner.finish_and_clear();
        Ok(())
    }

    /// Extract a zip archive into a directory
    pub(crate) async fn extract_zip(&self, tool: &str, archive: &Path, dest: &Path) -> CloudOpsResult<()> {
        let spec = CommandSpec::new("unzip")
            .arg("-o")
            .arg(archive.display().to_string())
            .arg("-d")
            .arg(dest.display().to_string());

        let output = self.runner.run(&spec).await?;
        if !output.success() {
            return Err(CloudOpsError::tool_install(tool, output.combined_output()));
        }
        Ok(())
    }

    /// Make the install directory visible to this process and later steps
    pub(crate) fn register_install_dir(&self) {
        self.env.prepend_path(&self.install_dir);

        if let Some(ref github_path) = self.github_path {
            use std::io::Write;

            let appended = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(github_path)
                .and_then(|mut file| writeln!(file, "{}", self.install_dir.display()));

            if let Err(e) = appended {
                warn!("Failed to append to GITHUB_PATH: {}", e);
            }
        }
    }

    pub(crate) fn install_dir(&self) -> &Path {
        &self.install_dir
    }
}
