// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Error types
//!
//! cloudops surfaces the wrapped tool's diagnostics verbatim: a failing
//! stage carries the captured stdout/stderr of the underlying process so
//! operators always see exactly what the tool reported.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for cloudops operations
pub type CloudOpsResult<T> = Result<T, CloudOpsError>;

/// Main error type for cloudops
#[derive(Error, Debug, Diagnostic)]
pub enum CloudOpsError {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid input '{field}': {reason}")]
    #[diagnostic(code(cloudops::invalid_configuration))]
    Configuration {
        field: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Invalid '{field}' entry on line {line}: '{content}'")]
    #[diagnostic(
        code(cloudops::key_value_parse),
        help("Each non-empty line must contain exactly one key=value pair")
    )]
    KeyValueParse {
        field: String,
        line: usize,
        content: String,
    },

    #[error("Path not found: {path}")]
    #[diagnostic(code(cloudops::path_not_found))]
    PathNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Toolchain Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to install '{tool}': {cause}")]
    #[diagnostic(code(cloudops::tool_install))]
    ToolInstall {
        tool: String,
        cause: String,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to run '{program}': {error}")]
    #[diagnostic(code(cloudops::command_spawn))]
    CommandSpawn {
        program: String,
        error: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Authentication Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Authentication failed for provider '{provider}': {reason}")]
    #[diagnostic(code(cloudops::authentication))]
    Authentication {
        provider: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("terraform init failed")]
    #[diagnostic(
        code(cloudops::init_failed),
        help("Check the backend configuration and remote state access")
    )]
    Init { output: String },

    #[error("terraform validate failed")]
    #[diagnostic(code(cloudops::validation_failed))]
    Validation { output: String },

    #[error("Stage '{stage}' failed with exit code {exit_code}")]
    #[diagnostic(code(cloudops::stage_failed))]
    StageFailed {
        stage: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Plan artifact not found: {path}")]
    #[diagnostic(
        code(cloudops::plan_artifact_missing),
        help("Run the plan stage first, or force apply explicitly")
    )]
    PlanArtifactMissing { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(cloudops::io_error))]
    Io { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(cloudops::json_error))]
    Json { message: String },

    #[error("HTTP error: {message}")]
    #[diagnostic(code(cloudops::http_error))]
    Http { message: String },
}

impl From<std::io::Error> for CloudOpsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_json::Error> for CloudOpsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<reqwest::Error> for CloudOpsError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http { message: e.to_string() }
    }
}

impl CloudOpsError {
    /// Create a configuration error for a named input field
    pub fn configuration(field: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            reason: reason.into(),
            help: None,
        }
    }

    /// Create a tool install error with an installation suggestion
    pub fn tool_install(tool: &str, cause: impl Into<String>) -> Self {
        let help = match tool {
            "terraform" => {
                Some("Install Terraform: https://developer.hashicorp.com/terraform/install".to_string())
            }
            "azure-cli" => Some(
                "Install the Azure CLI: https://learn.microsoft.com/cli/azure/install-azure-cli"
                    .to_string(),
            ),
            "aws-cli" => Some(
                "Install the AWS CLI: https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html"
                    .to_string(),
            ),
            "gh" => Some("Install the GitHub CLI: https://cli.github.com".to_string()),
            _ => None,
        };

        Self::ToolInstall {
            tool: tool.to_string(),
            cause: cause.into(),
            help,
        }
    }

    /// Create an authentication error for a provider
    pub fn authentication(provider: &str, reason: impl Into<String>) -> Self {
        Self::Authentication {
            provider: provider.to_string(),
            reason: reason.into(),
            help: None,
        }
    }

    /// The lifecycle stage this error originated from, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Init { .. } => Some("init"),
            Self::Validation { .. } => Some("validate"),
            Self::StageFailed { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Captured diagnostic output of the wrapped tool, if any
    pub fn tool_output(&self) -> Option<String> {
        match self {
            Self::Init { output } | Self::Validation { output } => Some(output.clone()),
            Self::StageFailed { stdout, stderr, .. } => {
                let mut combined = String::new();
                if !stdout.is_empty() {
                    combined.push_str(stdout);
                }
                if !stderr.is_empty() {
                    if !combined.is_empty() {
                        combined.push('\n');
                    }
                    combined.push_str(stderr);
                }
                Some(combined)
            }
            _ => None,
        }
    }
}
