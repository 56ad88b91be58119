// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Pipeline orchestration
//!
//! Runs the phases in their fixed order: credential presence check,
//! toolchain install, provider authentication, Terraform lifecycle,
//! reporting. Data flows strictly downward; the first fatal failure
//! stops the run.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use tracing::error;

use crate::auth::{self, CredentialConfigurator};
use crate::config::PipelineConfig;
use crate::errors::{CloudOpsError, CloudOpsResult};
use crate::exec::{CommandRunner, EnvironmentAdapter};
use crate::github::{GithubContext, Reporter};
use crate::terraform::{LifecycleOptions, LifecycleReport, LifecycleRunner};
use crate::toolchain::ToolInstaller;

/// Drives one complete pipeline run
pub struct PipelineRunner {
    config: PipelineConfig,
    runner: Arc<dyn CommandRunner>,
    env: Arc<dyn EnvironmentAdapter>,
    reporter: Reporter,
    install_dir: Option<PathBuf>,
    aws_dir: Option<PathBuf>,
}

impl PipelineRunner {
    pub fn new(
        config: PipelineConfig,
        runner: Arc<dyn CommandRunner>,
        env: Arc<dyn EnvironmentAdapter>,
        github: GithubContext,
    ) -> Self {
        let reporter = Reporter::new(github, runner.clone());

        Self {
            config,
            runner,
            env,
            reporter,
            install_dir: None,
            aws_dir: None,
        }
    }

    /// Override the toolchain install directory
    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_dir = Some(dir.into());
        self
    }

    /// Override the AWS CLI configuration directory
    pub fn with_aws_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.aws_dir = Some(dir.into());
        self
    }

    /// Execute the pipeline to completion
    pub async fn run(&self) -> CloudOpsResult<LifecycleReport> {
        self.print_header();

        // Fail on missing credentials before any external call
        auth::check_required(&self.config)?;

        self.reporter.set_output(
            "tf_working_dir",
            &self.config.relative_working_dir().display().to_string(),
        );

        println!();
        println!("{}:", "Toolchain".bold());
        let mut installer = ToolInstaller::new(self.runner.clone(), self.env.clone())
            .with_github_path(self.reporter.context().path_file.clone());
        if let Some(ref dir) = self.install_dir {
            installer = installer.with_install_dir(dir);
        }
        installer.ensure_all(&self.config).await?;
        println!("  {} toolchain ready", "✓".green());

        println!();
        println!("{}:", "Credentials".bold());
        let mut configurator =
            CredentialConfigurator::new(self.runner.clone(), self.env.clone());
        if let Some(ref dir) = self.aws_dir {
            configurator = configurator.with_aws_dir(dir);
        }
        configurator.configure(&self.config).await?;
        println!("  {} {} session established", "✓".green(), self.config.provider);

        println!();
        println!("{}:", "Terraform".bold());
        let lifecycle =
            LifecycleRunner::new(self.runner.clone(), self.config.working_dir.clone());
        let options = LifecycleOptions {
            operation: self.config.operation,
            backend_config: self.config.backend_config.clone(),
            variables: self.config.tf_vars.clone(),
            strict_fmt: self.config.strict_fmt,
            force_apply: self.config.force_apply,
        };
        let result = lifecycle.run(&options).await;

        configurator.cleanup();

        match result {
            Ok(report) => {
                self.publish_success(&report).await;
                Ok(report)
            }
            Err(err) => {
                self.publish_failure(&err);
                Err(err)
            }
        }
    }

    async fn publish_success(&self, report: &LifecycleReport) {
        if let Some(outcome) = report.plan_outcome() {
            self.reporter.set_output("plan_outcome", outcome.as_str());
        }
        if let Some(outcome) = report.apply_outcome() {
            self.reporter.set_output("apply_outcome", outcome.as_str());
        }

        if let Some(ref plan) = report.plan {
            if self.config.artifact_upload {
                self.reporter
                    .set_output("plan_artifact_path", &plan.path.display().to_string());
            }
            self.reporter
                .post_plan_comment(&self.config, report, &plan.summary)
                .await;
        }

        self.reporter.add_success_summary(&self.config, report);

        println!();
        println!("{}", "Pipeline completed successfully".green());
    }

    fn publish_failure(&self, err: &CloudOpsError) {
        match err.stage() {
            Some("plan") => self.reporter.set_output("plan_outcome", "failure"),
            Some("apply") => self.reporter.set_output("apply_outcome", "failure"),
            _ => {}
        }

        if let Some(stage) = err.stage() {
            error!("Pipeline failed at stage '{}'", stage);
        }
        // The wrapped tool's diagnostics, verbatim
        if let Some(output) = err.tool_output() {
            if !output.is_empty() {
                eprintln!("{}", output.dimmed());
            }
        }

        self.reporter.add_failure_summary(&err.to_string());

        println!();
        println!("{}", "Pipeline failed".red());
    }

    fn print_header(&self) {
        println!();
        println!("{}", "cloudops - Terraform pipeline".bold());
        println!("{}", "═".repeat(50));
        println!(
            "  provider: {}  operation: {}",
            self.config.provider, self.config.operation
        );
        println!(
            "  working directory: {}",
            self.config.relative_working_dir().display()
        );
    }
}
