// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Terraform installer
//!
//! Pinned or latest version from HashiCorp releases, extracted into the
//! user-local binary directory.

use serde::Deserialize;
use tracing::{info, warn};

use super::ToolInstaller;
use crate::errors::{CloudOpsError, CloudOpsResult};

/// Used when the latest-version lookup is unreachable
const FALLBACK_VERSION: &str = "1.9.0";

const RELEASES_API: &str = "https://api.github.com/repos/hashicorp/terraform/releases/latest";

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    tag_name: String,
}

impl ToolInstaller {
    /// Ensure a working terraform binary of the requested version
    pub async fn ensure_terraform(&self, version: &str) -> CloudOpsResult<()> {
        info!("Installing Terraform (version: {})...", version);

        if let Some(stdout) = self.probe("terraform", &["version"]).await {
            let installed = stdout
                .split_whitespace()
                .nth(1)
                .map(|v| v.trim_start_matches('v'))
                .unwrap_or("unknown")
                .to_string();
            info!("Terraform already installed: {}", installed);

            if version == "latest" || installed == version {
                info!("Skipping installation (compatible version available)");
                return Ok(());
            }
        }

        let version = if version == "latest" {
            self.latest_terraform_version().await
        } else {
            version.to_string()
        };

        info!("Installing Terraform version: {}", version);

        let (os, arch) = host_platform()?;
        let url = format!(
            "https://releases.hashicorp.com/terraform/{version}/terraform_{version}_{os}_{arch}.zip"
        );

        let tmp = tempfile::tempdir()?;
        let archive = tmp.path().join("terraform.zip");
        self.download(&url, &archive)
            .await
            .map_err(|e| CloudOpsError::tool_install("terraform", e.to_string()))?;

        tokio::fs::create_dir_all(self.install_dir()).await?;
        info!("Extracting to: {}", self.install_dir().display());
        self.extract_zip("terraform", &archive, self.install_dir())
            .await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let binary = self.install_dir().join("terraform");
            if let Err(e) =
                std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
            {
                warn!("Failed to mark terraform executable: {}", e);
            }
        }

        self.register_install_dir();

        match self.probe("terraform", &["version"]).await {
            Some(stdout) => {
                info!("✓ Terraform installed: {}", stdout.trim());
                Ok(())
            }
            None => Err(CloudOpsError::tool_install(
                "terraform",
                "installation could not be verified",
            )),
        }
    }

    /// Latest release tag, with a pinned fallback when unreachable
    async fn latest_terraform_version(&self) -> String {
        info!("Fetching latest Terraform version...");

        let fetched = async {
            let release: ReleaseInfo = self
                .http
                .get(RELEASES_API)
                .header(reqwest::header::USER_AGENT, "cloudops")
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok::<_, reqwest::Error>(release.tag_name)
        }
        .await;

        match fetched {
            Ok(tag) => {
                let version = tag.trim_start_matches('v').to_string();
                info!("Latest version: {}", version);
                version
            }
            Err(e) => {
                warn!("Failed to fetch latest version: {}. Using fallback version.", e);
                FALLBACK_VERSION.to_string()
            }
        }
    }
}

/// Release artifact platform pair for the host
fn host_platform() -> CloudOpsResult<(&'static str, &'static str)> {
    let os = match std::env::consts::OS {
        "linux" => "linux",
        "macos" => "darwin",
        "windows" => "windows",
        other => {
            return Err(CloudOpsError::tool_install(
                "terraform",
                format!("unsupported platform: {}", other),
            ))
        }
    };

    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => {
            return Err(CloudOpsError::tool_install(
                "terraform",
                format!("unsupported architecture: {}", other),
            ))
        }
    };

    Ok((os, arch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::fake::FakeRunner;
    use crate::exec::RecordingEnvironment;
    use std::sync::Arc;

    fn installer(fake: Arc<FakeRunner>) -> ToolInstaller {
        ToolInstaller::new(fake, Arc::new(RecordingEnvironment::new()))
            .with_install_dir(tempfile::tempdir().unwrap().path().join("bin"))
    }

    #[tokio::test]
    async fn test_latest_already_installed_skips_download() {
        let fake = Arc::new(FakeRunner::new());
        fake.respond(
            "terraform",
            Some("version"),
            0,
            "Terraform v1.9.0\non linux_amd64",
            "",
        );

        let installer = installer(fake.clone());
        installer.ensure_terraform("latest").await.unwrap();

        // Only the version probe ran; no extraction happened
        assert_eq!(fake.calls().len(), 1);
        assert!(!fake.invoked("unzip", None));
    }

    #[tokio::test]
    async fn test_matching_pin_skips_download() {
        let fake = Arc::new(FakeRunner::new());
        fake.respond("terraform", Some("version"), 0, "Terraform v1.6.6", "");

        let installer = installer(fake.clone());
        installer.ensure_terraform("1.6.6").await.unwrap();

        assert_eq!(fake.calls().len(), 1);
    }

    #[test]
    fn test_host_platform_supported() {
        assert!(host_platform().is_ok());
    }
}
