// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Install command - set up the CLI toolchain only

use std::str::FromStr;
use std::sync::Arc;

use colored::Colorize;
use miette::Result;

use crate::config::Provider;
use crate::exec::{command_exists, ProcessEnvironment, SystemRunner};
use crate::github::GithubContext;
use crate::toolchain::ToolInstaller;

/// Install terraform, the provider CLIs, and the GitHub CLI
pub async fn run(
    provider: String,
    tf_version: String,
    gh_cli_version: String,
    verbose: bool,
) -> Result<()> {
    let provider = Provider::from_str(&provider)?;
    let github = GithubContext::from_env();

    if verbose {
        for tool in ["terraform", "az", "aws", "gh"] {
            let status = if command_exists(tool) {
                "on PATH".green()
            } else {
                "missing".yellow()
            };
            println!("  {} {}", tool, status);
        }
        println!();
    }

    let installer = ToolInstaller::new(
        Arc::new(SystemRunner::new()),
        Arc::new(ProcessEnvironment),
    )
    .with_github_path(github.path_file.clone());

    installer.ensure_terraform(&tf_version).await?;
    if provider.requires_azure() {
        installer.ensure_azure_cli().await?;
    }
    if provider.requires_aws() {
        installer.ensure_aws_cli().await?;
    }
    installer.ensure_github_cli(&gh_cli_version).await?;

    println!("{} Toolchain ready", "✓".green());

    Ok(())
}
