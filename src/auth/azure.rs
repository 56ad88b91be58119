// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Azure service-principal authentication

use serde::Deserialize;
use tracing::info;

use super::CredentialConfigurator;
use crate::errors::{CloudOpsError, CloudOpsResult};
use crate::exec::CommandSpec;

/// Service-principal credentials, as produced by `az ad sp create-for-rbac`
///
/// Debug output never includes the secret.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipal {
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    #[serde(default)]
    pub subscription_id: Option<String>,
}

impl std::fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl CredentialConfigurator {
    /// Log in with a service principal and export the ARM_* variables
    /// Terraform's azurerm provider reads
    pub(super) async fn configure_azure(&self, credentials: &str) -> CloudOpsResult<()> {
        info!("Configuring Azure credentials...");

        let principal: ServicePrincipal = serde_json::from_str(credentials).map_err(|e| {
            CloudOpsError::authentication("azure", format!("invalid credentials JSON: {}", e))
        })?;

        // Login arguments carry the secret; never log them
        let login = CommandSpec::new("az")
            .args(["login", "--service-principal"])
            .arg("--username")
            .arg(&principal.client_id)
            .arg("--password")
            .arg(&principal.client_secret)
            .arg("--tenant")
            .arg(&principal.tenant_id)
            .redacted();

        let output = self.runner.run(&login).await?;
        if !output.success() {
            return Err(CloudOpsError::authentication("azure", output.stderr));
        }

        if let Some(ref subscription) = principal.subscription_id {
            let spec = CommandSpec::new("az")
                .args(["account", "set", "--subscription"])
                .arg(subscription);
            let output = self.runner.run(&spec).await?;
            if !output.success() {
                return Err(CloudOpsError::authentication("azure", output.stderr));
            }
        }

        self.env.export("ARM_CLIENT_ID", &principal.client_id);
        self.env.export("ARM_CLIENT_SECRET", &principal.client_secret);
        self.env.export("ARM_TENANT_ID", &principal.tenant_id);
        self.env.export(
            "ARM_SUBSCRIPTION_ID",
            principal.subscription_id.as_deref().unwrap_or(""),
        );

        info!("✓ Azure credentials configured");
        Ok(())
    }
}
