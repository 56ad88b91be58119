// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! GitHub CLI installer

use tracing::info;

use super::ToolInstaller;
use crate::errors::{CloudOpsError, CloudOpsResult};
use crate::exec::CommandSpec;

impl ToolInstaller {
    /// Ensure a working `gh` binary
    pub async fn ensure_github_cli(&self, version: &str) -> CloudOpsResult<()> {
        info!("Installing GitHub CLI (version: {})...", version);

        if self.probe("gh", &["--version"]).await.is_some() {
            info!("GitHub CLI already installed");
            if version == "latest" {
                return Ok(());
            }
        }

        info!("Installing GitHub CLI via apt...");
        let commands = [
            CommandSpec::new("sudo").args(["apt-get", "update"]),
            CommandSpec::new("sudo").args(["apt-get", "install", "-y", "gh"]),
        ];

        for spec in &commands {
            let output = self.runner.run(spec).await?;
            if !output.success() {
                return Err(CloudOpsError::tool_install("gh", output.combined_output()));
            }
        }

        match self.probe("gh", &["--version"]).await {
            Some(stdout) => {
                info!("✓ GitHub CLI installed: {}", stdout.trim());
                Ok(())
            }
            None => Err(CloudOpsError::tool_install(
                "gh",
                "installation could not be verified",
            )),
        }
    }
}
