// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Cloud provider authentication
//!
//! Exchanges supplied secrets for authenticated sessions. Credential
//! material never reaches the logs; env-var export goes through the
//! [`EnvironmentAdapter`] seam. Authentication failures are never
//! retried.

mod aws;
mod azure;

pub use azure::ServicePrincipal;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::config::PipelineConfig;
use crate::errors::{CloudOpsError, CloudOpsResult};
use crate::exec::{CommandRunner, EnvironmentAdapter};

/// Check that every provider the run requires has credentials supplied
///
/// Runs before any tool is installed or invoked, so a misconfigured
/// multi-cloud run fails without side effects.
pub fn check_required(config: &PipelineConfig) -> CloudOpsResult<()> {
    if config.provider.requires_azure() && config.azure_credentials.is_none() {
        return Err(CloudOpsError::authentication(
            "azure",
            format!(
                "azure_credentials input is required for provider '{}'",
                config.provider
            ),
        ));
    }

    if config.provider.requires_aws() && config.aws_credentials.is_none() {
        return Err(CloudOpsError::authentication(
            "aws",
            format!(
                "aws_access_key_id and aws_secret_access_key inputs are required for provider '{}'",
                config.provider
            ),
        ));
    }

    Ok(())
}

/// Establishes authenticated provider sessions for the run
pub struct CredentialConfigurator {
    runner: Arc<dyn CommandRunner>,
    env: Arc<dyn EnvironmentAdapter>,
    aws_dir: PathBuf,
}

impl CredentialConfigurator {
    pub fn new(runner: Arc<dyn CommandRunner>, env: Arc<dyn EnvironmentAdapter>) -> Self {
        let aws_dir = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".aws"))
            .unwrap_or_else(|| PathBuf::from(".aws"));

        Self { runner, env, aws_dir }
    }

    /// Override the AWS CLI configuration directory
    pub fn with_aws_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.aws_dir = dir.into();
        self
    }

    /// Authenticate against every provider the configuration names
    ///
    /// For `multi`, Azure then AWS; either failure is fatal for the whole
    /// run, with no partial success.
    pub async fn configure(&self, config: &PipelineConfig) -> CloudOpsResult<()> {
        if config.provider.requires_azure() {
            let credentials = config.azure_credentials.as_deref().ok_or_else(|| {
                CloudOpsError::authentication("azure", "azure_credentials input is required")
            })?;
            self.configure_azure(credentials).await?;
        }

        if config.provider.requires_aws() {
            let credentials = config.aws_credentials.as_ref().ok_or_else(|| {
                CloudOpsError::authentication("aws", "AWS credential inputs are required")
            })?;
            self.configure_aws(credentials).await?;
        }

        Ok(())
    }

    /// Best-effort removal of exported secrets and written files
    pub fn cleanup(&self) {
        info!("Cleaning up credentials...");

        for var in [
            "ARM_CLIENT_ID",
            "ARM_CLIENT_SECRET",
            "ARM_TENANT_ID",
            "ARM_SUBSCRIPTION_ID",
            "AWS_ACCESS_KEY_ID",
            "AWS_SECRET_ACCESS_KEY",
            "AWS_DEFAULT_REGION",
        ] {
            self.env.remove(var);
        }

        for file in ["credentials", "config"] {
            let path = self.aws_dir.join(file);
            if path.exists() {
                let _ = std::fs::remove_file(path);
            }
        }

        info!("✓ Credentials cleaned up");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawInputs, PipelineConfig};

    fn inputs(provider: &str) -> RawInputs {
        RawInputs {
            tf_path: "infra".into(),
            provider: provider.into(),
            operation: "plan".into(),
            tf_version: "latest".into(),
            gh_cli_version: "latest".into(),
            aws_region: "us-east-1".into(),
            ..Default::default()
        }
    }

    fn config_for(provider: &str, azure: bool, aws: bool) -> PipelineConfig {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::create_dir(workspace.path().join("infra")).unwrap();

        let mut raw = inputs(provider);
        if azure {
            raw.azure_credentials = r#"{"clientId":"id","clientSecret":"s","tenantId":"t"}"#.into();
        }
        if aws {
            raw.aws_access_key_id = "AKIA123".into();
            raw.aws_secret_access_key = "secret".into();
        }

        PipelineConfig::from_inputs(&raw, workspace.path()).unwrap()
    }

    #[test]
    fn test_check_required_passes_with_credentials() {
        assert!(check_required(&config_for("azure", true, false)).is_ok());
        assert!(check_required(&config_for("aws", false, true)).is_ok());
        assert!(check_required(&config_for("multi", true, true)).is_ok());
    }

    #[test]
    fn test_multi_missing_azure_names_azure() {
        let err = check_required(&config_for("multi", false, true)).unwrap_err();
        match err {
            CloudOpsError::Authentication { provider, .. } => assert_eq!(provider, "azure"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_multi_missing_aws_names_aws() {
        let err = check_required(&config_for("multi", true, false)).unwrap_err();
        match err {
            CloudOpsError::Authentication { provider, .. } => assert_eq!(provider, "aws"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
