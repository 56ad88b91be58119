// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Pipeline configuration
//!
//! Raw Action inputs are validated into an immutable [`PipelineConfig`]
//! exactly once at startup; no component reads the process environment
//! afterwards. Working-directory resolution is read-only and repeatable.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{CloudOpsError, CloudOpsResult};

/// Target cloud platform(s) for credentials and CLIs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Azure,
    Aws,
    Multi,
}

impl Provider {
    pub fn requires_azure(&self) -> bool {
        matches!(self, Self::Azure | Self::Multi)
    }

    pub fn requires_aws(&self) -> bool {
        matches!(self, Self::Aws | Self::Multi)
    }
}

impl FromStr for Provider {
    type Err = CloudOpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "azure" => Ok(Self::Azure),
            "aws" => Ok(Self::Aws),
            "multi" => Ok(Self::Multi),
            other => Err(CloudOpsError::configuration(
                "cloud_provider",
                format!("'{}' is not one of: azure, aws, multi", other),
            )),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Azure => "azure",
            Self::Aws => "aws",
            Self::Multi => "multi",
        };
        write!(f, "{}", name)
    }
}

/// Which part of the Terraform lifecycle the run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Plan,
    Apply,
    PlanApply,
}

impl Operation {
    /// Whether the apply stage may run at all
    pub fn includes_apply(&self) -> bool {
        matches!(self, Self::Apply | Self::PlanApply)
    }
}

impl FromStr for Operation {
    type Err = CloudOpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plan" => Ok(Self::Plan),
            "apply" => Ok(Self::Apply),
            "plan-apply" => Ok(Self::PlanApply),
            other => Err(CloudOpsError::configuration(
                "terraform_operation",
                format!("'{}' is not one of: plan, apply, plan-apply", other),
            )),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plan => "plan",
            Self::Apply => "apply",
            Self::PlanApply => "plan-apply",
        };
        write!(f, "{}", name)
    }
}

/// Parsed multi-line `key=value` input (backend config, variables)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyValuePairs(Vec<(String, String)>);

impl KeyValuePairs {
    /// Parse multi-line text; every non-empty line must hold one pair
    pub fn parse(field: &str, text: &str) -> CloudOpsResult<Self> {
        let mut pairs = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    pairs.push((key.trim().to_string(), value.trim().to_string()));
                }
                _ => {
                    return Err(CloudOpsError::KeyValueParse {
                        field: field.to_string(),
                        line: idx + 1,
                        content: line.to_string(),
                    });
                }
            }
        }

        Ok(Self(pairs))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }

    /// Pairs re-joined as `key=value` strings, one per pair
    pub fn as_assignments(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    }
}

/// AWS access-key credentials
///
/// Debug output never includes the secret.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

/// Version pins forwarded to the toolchain installer
#[derive(Debug, Clone)]
pub struct ToolVersions {
    pub terraform: String,
    pub gh: String,
}

/// Raw inputs as received from the CLI / Action environment
#[derive(Clone, Default)]
pub struct RawInputs {
    pub tf_path: String,
    pub working_dir: Option<String>,
    pub provider: String,
    pub operation: String,
    pub tf_version: String,
    pub gh_cli_version: String,
    pub backend_config: String,
    pub tf_vars: String,
    pub pr_comment: bool,
    pub artifact_upload: bool,
    pub strict_fmt: bool,
    pub force_apply: bool,
    pub azure_credentials: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_region: String,
}

/// Validated, immutable pipeline configuration
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub working_dir: PathBuf,
    pub workspace: PathBuf,
    pub provider: Provider,
    pub operation: Operation,
    pub versions: ToolVersions,
    pub backend_config: KeyValuePairs,
    pub tf_vars: KeyValuePairs,
    pub pr_comment: bool,
    pub artifact_upload: bool,
    pub strict_fmt: bool,
    pub force_apply: bool,
    /// Raw service-principal JSON, parsed by the credential configurator
    pub azure_credentials: Option<String>,
    pub aws_credentials: Option<AwsCredentials>,
}

impl PipelineConfig {
    /// Validate raw inputs into a pipeline configuration
    ///
    /// Fails before any external process is spawned: required fields,
    /// enum values, key=value syntax, and path existence are all checked
    /// here.
    pub fn from_inputs(inputs: &RawInputs, workspace: &Path) -> CloudOpsResult<Self> {
        if inputs.tf_path.trim().is_empty() {
            return Err(CloudOpsError::configuration("tf_path", "is required"));
        }

        let provider = Provider::from_str(&inputs.provider)?;
        let operation = Operation::from_str(&inputs.operation)?;

        let backend_config = KeyValuePairs::parse("backend_config", &inputs.backend_config)?;
        let tf_vars = KeyValuePairs::parse("tf_vars", &inputs.tf_vars)?;

        let working_dir = resolve_working_dir(
            workspace,
            inputs.tf_path.trim(),
            inputs.working_dir.as_deref(),
        )?;

        let azure_credentials = match inputs.azure_credentials.trim() {
            "" => None,
            json => Some(json.to_string()),
        };

        let aws_credentials = if inputs.aws_access_key_id.trim().is_empty()
            || inputs.aws_secret_access_key.trim().is_empty()
        {
            None
        } else {
            Some(AwsCredentials {
                access_key_id: inputs.aws_access_key_id.trim().to_string(),
                secret_access_key: inputs.aws_secret_access_key.trim().to_string(),
                region: inputs.aws_region.trim().to_string(),
            })
        };

        Ok(Self {
            working_dir,
            workspace: workspace.to_path_buf(),
            provider,
            operation,
            versions: ToolVersions {
                terraform: inputs.tf_version.trim().to_string(),
                gh: inputs.gh_cli_version.trim().to_string(),
            },
            backend_config,
            tf_vars,
            pr_comment: inputs.pr_comment,
            artifact_upload: inputs.artifact_upload,
            strict_fmt: inputs.strict_fmt,
            force_apply: inputs.force_apply,
            azure_credentials,
            aws_credentials,
        })
    }

    /// Working directory relative to the workspace, for display and outputs
    pub fn relative_working_dir(&self) -> PathBuf {
        self.working_dir
            .strip_prefix(&self.workspace)
            .unwrap_or(&self.working_dir)
            .to_path_buf()
    }
}

/// Resolve the Terraform working directory from the configured path
///
/// An existing directory is used verbatim; an existing file yields its
/// parent; anything else is an error. Read-only and repeatable.
pub fn resolve_working_dir(
    workspace: &Path,
    tf_path: &str,
    explicit: Option<&str>,
) -> CloudOpsResult<PathBuf> {
    if let Some(dir) = explicit {
        let resolved = workspace.join(dir);
        if resolved.is_dir() {
            return Ok(resolved);
        }
        return Err(CloudOpsError::PathNotFound {
            path: resolved,
            help: Some("tf_working_dir must name an existing directory".into()),
        });
    }

    let full = workspace.join(tf_path);
    if full.is_dir() {
        Ok(full)
    } else if full.is_file() {
        // A file's configuration lives in its directory
        Ok(full
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| workspace.to_path_buf()))
    } else {
        Err(CloudOpsError::PathNotFound {
            path: full,
            help: Some("tf_path must name an existing file or directory".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(tf_path: &str) -> RawInputs {
        RawInputs {
            tf_path: tf_path.into(),
            provider: "azure".into(),
            operation: "plan".into(),
            tf_version: "latest".into(),
            gh_cli_version: "latest".into(),
            aws_region: "us-east-1".into(),
            pr_comment: true,
            artifact_upload: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_parsing_case_insensitive() {
        assert_eq!(Provider::from_str("Azure").unwrap(), Provider::Azure);
        assert_eq!(Provider::from_str("AWS").unwrap(), Provider::Aws);
        assert_eq!(Provider::from_str("multi").unwrap(), Provider::Multi);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = Provider::from_str("gcp").unwrap_err();
        assert!(matches!(err, CloudOpsError::Configuration { ref field, .. } if field == "cloud_provider"));
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!(Operation::from_str("plan").unwrap(), Operation::Plan);
        assert_eq!(Operation::from_str("APPLY").unwrap(), Operation::Apply);
        assert_eq!(
            Operation::from_str("plan-apply").unwrap(),
            Operation::PlanApply
        );
        assert!(Operation::from_str("destroy").is_err());
    }

    #[test]
    fn test_apply_gate() {
        assert!(!Operation::Plan.includes_apply());
        assert!(Operation::Apply.includes_apply());
        assert!(Operation::PlanApply.includes_apply());
    }

    #[test]
    fn test_key_value_parsing() {
        let text = "resource_group_name=rg-state\n\nstorage_account_name = statestore\n";
        let pairs = KeyValuePairs::parse("backend_config", text).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs.as_assignments(),
            vec!["resource_group_name=rg-state", "storage_account_name=statestore"]
        );
    }

    #[test]
    fn test_key_value_parse_error_cites_line() {
        let text = "good=1\nnot a pair\n";
        let err = KeyValuePairs::parse("tf_vars", text).unwrap_err();
        match err {
            CloudOpsError::KeyValueParse { field, line, content } => {
                assert_eq!(field, "tf_vars");
                assert_eq!(line, 2);
                assert_eq!(content, "not a pair");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_key_value_rejects_missing_key() {
        assert!(KeyValuePairs::parse("tf_vars", "=value").is_err());
    }

    #[test]
    fn test_resolve_directory_verbatim() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::create_dir(workspace.path().join("infra")).unwrap();

        let resolved = resolve_working_dir(workspace.path(), "infra", None).unwrap();
        assert_eq!(resolved, workspace.path().join("infra"));
    }

    #[test]
    fn test_resolve_file_uses_parent() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::create_dir(workspace.path().join("infra")).unwrap();
        std::fs::write(workspace.path().join("infra/main.tf"), "").unwrap();

        let resolved = resolve_working_dir(workspace.path(), "infra/main.tf", None).unwrap();
        assert_eq!(resolved, workspace.path().join("infra"));
    }

    #[test]
    fn test_resolve_missing_path_fails() {
        let workspace = tempfile::tempdir().unwrap();
        let err = resolve_working_dir(workspace.path(), "nope", None).unwrap_err();
        assert!(matches!(err, CloudOpsError::PathNotFound { .. }));
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::create_dir(workspace.path().join("infra")).unwrap();

        let first = resolve_working_dir(workspace.path(), "infra", None).unwrap();
        let second = resolve_working_dir(workspace.path(), "infra", None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_explicit_working_dir_override() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::create_dir(workspace.path().join("envs")).unwrap();
        std::fs::create_dir(workspace.path().join("infra")).unwrap();

        let resolved = resolve_working_dir(workspace.path(), "infra", Some("envs")).unwrap();
        assert_eq!(resolved, workspace.path().join("envs"));
    }

    #[test]
    fn test_config_requires_tf_path() {
        let workspace = tempfile::tempdir().unwrap();
        let err = PipelineConfig::from_inputs(&raw("  "), workspace.path()).unwrap_err();
        assert!(matches!(err, CloudOpsError::Configuration { ref field, .. } if field == "tf_path"));
    }

    #[test]
    fn test_config_builds_and_relativizes() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::create_dir(workspace.path().join("infra")).unwrap();

        let mut inputs = raw("infra");
        inputs.aws_access_key_id = "AKIA123".into();
        inputs.aws_secret_access_key = "secret".into();

        let config = PipelineConfig::from_inputs(&inputs, workspace.path()).unwrap();
        assert_eq!(config.relative_working_dir(), PathBuf::from("infra"));
        assert_eq!(config.provider, Provider::Azure);
        // AWS creds are retained even for azure runs; the configurator
        // only uses what the provider requires
        assert!(config.aws_credentials.is_some());
    }

    #[test]
    fn test_aws_credentials_debug_redacts_secret() {
        let creds = AwsCredentials {
            access_key_id: "AKIA123".into(),
            secret_access_key: "supersecret".into(),
            region: "us-east-1".into(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("supersecret"));
    }
}
