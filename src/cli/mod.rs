// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! CLI command definitions and handlers
//!
//! Every run option carries an `INPUT_*` environment binding so the
//! binary doubles as a GitHub Action entrypoint without flag plumbing.

pub mod check;
pub mod install;
pub mod run;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::RawInputs;

/// Terraform pipeline orchestrator
///
/// Installs the toolchain, authenticates against Azure and/or AWS, and
/// runs the init → fmt → validate → plan → apply sequence.
#[derive(Parser, Debug)]
#[clap(
    name = "cloudops",
    version,
    about = "Terraform pipeline orchestrator for Azure and AWS CI workflows",
    long_about = None,
    after_help = "Examples:\n\
        cloudops check --tf-path infra              Validate inputs and resolve the working directory\n\
        cloudops install --provider aws             Install the required CLI toolchain\n\
        cloudops run --tf-path infra --provider azure --operation plan\n\n\
        Every option also reads its INPUT_* environment variable, so the\n\
        same binary serves as a GitHub Action entrypoint.\n\n\
        See 'cloudops <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline
    Run {
        #[clap(flatten)]
        inputs: InputArgs,
    },

    /// Validate inputs and resolve the working directory without
    /// touching any external tool
    Check {
        #[clap(flatten)]
        inputs: InputArgs,
    },

    /// Install the required CLI toolchain only
    Install {
        /// Cloud provider to install CLIs for
        #[clap(long, env = "INPUT_CLOUD_PROVIDER", default_value = "azure")]
        provider: String,

        /// Terraform version to install
        #[clap(long, env = "INPUT_TF_VERSION", default_value = "latest")]
        tf_version: String,

        /// GitHub CLI version to install
        #[clap(long, env = "INPUT_GH_CLI_VERSION", default_value = "latest")]
        gh_cli_version: String,
    },
}

/// Pipeline inputs, mirroring the Action's input surface
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Path to the Terraform configuration (file or directory)
    #[clap(long, env = "INPUT_TF_PATH")]
    pub tf_path: String,

    /// Explicit working-directory override (workspace-relative)
    #[clap(long, env = "INPUT_TF_WORKING_DIR")]
    pub working_dir: Option<String>,

    /// Cloud provider: azure, aws, or multi
    #[clap(long, env = "INPUT_CLOUD_PROVIDER", default_value = "azure")]
    pub provider: String,

    /// Terraform operation: plan, apply, or plan-apply
    #[clap(long, env = "INPUT_TERRAFORM_OPERATION", default_value = "plan")]
    pub operation: String,

    /// Terraform version to install
    #[clap(long, env = "INPUT_TF_VERSION", default_value = "latest")]
    pub tf_version: String,

    /// GitHub CLI version to install
    #[clap(long, env = "INPUT_GH_CLI_VERSION", default_value = "latest")]
    pub gh_cli_version: String,

    /// Backend configuration, one key=value per line
    #[clap(long, env = "INPUT_BACKEND_CONFIG", default_value = "")]
    pub backend_config: String,

    /// Terraform variables, one key=value per line
    #[clap(long, env = "INPUT_TF_VARS", default_value = "")]
    pub tf_vars: String,

    /// Post a plan summary to the pull request
    #[clap(
        long,
        env = "INPUT_ENABLE_PR_COMMENT",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub pr_comment: bool,

    /// Publish the plan artifact path for upload
    #[clap(
        long,
        env = "INPUT_ENABLE_ARTIFACT_UPLOAD",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub artifact_upload: bool,

    /// Treat fmt check failures as fatal
    #[clap(
        long,
        env = "INPUT_STRICT_FMT",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    pub strict_fmt: bool,

    /// Run apply even when the plan found no changes
    #[clap(
        long,
        env = "INPUT_FORCE_APPLY",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    pub force_apply: bool,

    /// Azure service-principal credentials JSON
    #[clap(
        long,
        env = "INPUT_AZURE_CREDENTIALS",
        default_value = "",
        hide_env_values = true
    )]
    pub azure_credentials: String,

    /// AWS access key id
    #[clap(
        long,
        env = "INPUT_AWS_ACCESS_KEY_ID",
        default_value = "",
        hide_env_values = true
    )]
    pub aws_access_key_id: String,

    /// AWS secret access key
    #[clap(
        long,
        env = "INPUT_AWS_SECRET_ACCESS_KEY",
        default_value = "",
        hide_env_values = true
    )]
    pub aws_secret_access_key: String,

    /// AWS region
    #[clap(long, env = "INPUT_AWS_REGION", default_value = "us-east-1")]
    pub aws_region: String,
}

impl InputArgs {
    pub fn into_raw(self) -> RawInputs {
        RawInputs {
            tf_path: self.tf_path,
            working_dir: self.working_dir,
            provider: self.provider,
            operation: self.operation,
            tf_version: self.tf_version,
            gh_cli_version: self.gh_cli_version,
            backend_config: self.backend_config,
            tf_vars: self.tf_vars,
            pr_comment: self.pr_comment,
            artifact_upload: self.artifact_upload,
            strict_fmt: self.strict_fmt,
            force_apply: self.force_apply,
            azure_credentials: self.azure_credentials,
            aws_access_key_id: self.aws_access_key_id,
            aws_secret_access_key: self.aws_secret_access_key,
            aws_region: self.aws_region,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run_command() {
        let cli = Cli::try_parse_from([
            "cloudops",
            "run",
            "--tf-path",
            "infra",
            "--provider",
            "aws",
            "--operation",
            "plan-apply",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { inputs } => {
                assert_eq!(inputs.tf_path, "infra");
                assert_eq!(inputs.provider, "aws");
                assert_eq!(inputs.operation, "plan-apply");
                assert!(inputs.pr_comment);
                assert!(!inputs.force_apply);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_boolean_toggles_take_values() {
        let cli = Cli::try_parse_from([
            "cloudops",
            "run",
            "--tf-path",
            "infra",
            "--pr-comment",
            "false",
            "--strict-fmt",
            "true",
        ])
        .unwrap();

        match cli.command {
            Commands::Run { inputs } => {
                assert!(!inputs.pr_comment);
                assert!(inputs.strict_fmt);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_tf_path_is_required() {
        assert!(Cli::try_parse_from(["cloudops", "check"]).is_err());
    }
}
