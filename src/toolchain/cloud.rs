// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Provider CLI installers
//!
//! Azure CLI via the Microsoft apt repository, AWS CLI via the bundled
//! installer. Both assume a Debian-family runner, matching the hosted
//! Actions images.

use tracing::{info, warn};

use super::ToolInstaller;
use crate::errors::{CloudOpsError, CloudOpsResult};
use crate::exec::CommandSpec;

const AWS_CLI_URL: &str = "https://awscli.amazonaws.com/awscli-exe-linux-x86_64.zip";

impl ToolInstaller {
    /// Ensure a working `az` binary
    pub async fn ensure_azure_cli(&self) -> CloudOpsResult<()> {
        info!("Installing Azure CLI...");

        if self.probe("az", &["version"]).await.is_some() {
            info!("Azure CLI already installed");
            return Ok(());
        }

        info!("Installing Azure CLI via apt...");
        let commands = [
            CommandSpec::new("sudo").args(["apt-get", "update"]),
            CommandSpec::new("sudo").args([
                "apt-get",
                "install",
                "-y",
                "ca-certificates",
                "curl",
                "apt-transport-https",
                "lsb-release",
                "gnupg",
            ]),
            CommandSpec::new("bash").args([
                "-c",
                "curl -sL https://packages.microsoft.com/keys/microsoft.asc | \
                 gpg --dearmor | sudo tee /etc/apt/trusted.gpg.d/microsoft.gpg > /dev/null",
            ]),
            CommandSpec::new("bash").args([
                "-c",
                "AZ_REPO=$(lsb_release -cs) && \
                 echo \"deb [arch=amd64] https://packages.microsoft.com/repos/azure-cli/ $AZ_REPO main\" | \
                 sudo tee /etc/apt/sources.list.d/azure-cli.list",
            ]),
            CommandSpec::new("sudo").args(["apt-get", "update"]),
            CommandSpec::new("sudo").args(["apt-get", "install", "-y", "azure-cli"]),
        ];

        for spec in &commands {
            let output = self.runner.run(spec).await?;
            if !output.success() {
                warn!("Command failed: {}", spec.display_line());
                break;
            }
        }

        match self.probe("az", &["version"]).await {
            Some(_) => {
                info!("✓ Azure CLI installed");
                Ok(())
            }
            None => Err(CloudOpsError::tool_install(
                "azure-cli",
                "installation could not be verified",
            )),
        }
    }

    /// Ensure a working `aws` binary
    pub async fn ensure_aws_cli(&self) -> CloudOpsResult<()> {
        info!("Installing AWS CLI...");

        if self.probe("aws", &["--version"]).await.is_some() {
            info!("AWS CLI already installed");
            return Ok(());
        }

        info!("Installing AWS CLI v2...");

        let tmp = tempfile::tempdir()?;
        let archive = tmp.path().join("awscliv2.zip");
        self.download(AWS_CLI_URL, &archive)
            .await
            .map_err(|e| CloudOpsError::tool_install("aws-cli", e.to_string()))?;

        self.extract_zip("aws-cli", &archive, tmp.path()).await?;

        let install_script = tmp.path().join("aws").join("install");
        let output = self
            .runner
            .run(&CommandSpec::new(install_script.display().to_string()))
            .await?;
        if !output.success() {
            return Err(CloudOpsError::tool_install(
                "aws-cli",
                output.combined_output(),
            ));
        }

        match self.probe("aws", &["--version"]).await {
            Some(stdout) => {
                info!("✓ AWS CLI installed: {}", stdout.trim());
                Ok(())
            }
            None => Err(CloudOpsError::tool_install(
                "aws-cli",
                "installation could not be verified",
            )),
        }
    }
}
