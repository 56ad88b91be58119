// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! AWS access-key authentication
//!
//! Exports the environment Terraform's aws provider reads and writes the
//! CLI credential files with owner-only permissions.

use std::path::Path;

use tracing::info;

use super::CredentialConfigurator;
use crate::config::AwsCredentials;
use crate::errors::{CloudOpsError, CloudOpsResult};

impl CredentialConfigurator {
    pub(super) async fn configure_aws(&self, credentials: &AwsCredentials) -> CloudOpsResult<()> {
        info!("Configuring AWS credentials...");

        self.env.export("AWS_ACCESS_KEY_ID", &credentials.access_key_id);
        self.env
            .export("AWS_SECRET_ACCESS_KEY", &credentials.secret_access_key);
        self.env.export("AWS_DEFAULT_REGION", &credentials.region);

        std::fs::create_dir_all(&self.aws_dir)
            .map_err(|e| CloudOpsError::authentication("aws", e.to_string()))?;

        let credentials_body = format!(
            "[default]\naws_access_key_id = {}\naws_secret_access_key = {}\n",
            credentials.access_key_id, credentials.secret_access_key
        );
        write_restricted(&self.aws_dir.join("credentials"), &credentials_body)?;

        let config_body = format!("[default]\nregion = {}\n", credentials.region);
        write_restricted(&self.aws_dir.join("config"), &config_body)?;

        info!("✓ AWS credentials configured");
        Ok(())
    }
}

/// Write a credential file readable only by its owner
fn write_restricted(path: &Path, contents: &str) -> CloudOpsResult<()> {
    std::fs::write(path, contents)
        .map_err(|e| CloudOpsError::authentication("aws", e.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| CloudOpsError::authentication("aws", e.to_string()))?;
    }

    Ok(())
}
