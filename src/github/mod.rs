// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! GitHub reporting
//!
//! Actions outputs, step summaries, and PR comments. Nothing here can
//! fail the pipeline: by the time reporting runs the infrastructure
//! operation already completed, so every error degrades to a warning.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::errors::CloudOpsResult;
use crate::exec::{command_exists, CommandRunner, CommandSpec};
use crate::terraform::LifecycleReport;

/// GitHub comments are capped at 65536 characters; leave headroom for
/// the surrounding markdown
const MAX_PLAN_CHARS: usize = 65000;

/// Actions environment captured once at startup
#[derive(Debug, Clone, Default)]
pub struct GithubContext {
    pub workspace: PathBuf,
    pub token: String,
    pub repository: String,
    pub event_name: String,
    pub git_ref: String,
    pub output_path: Option<PathBuf>,
    pub step_summary_path: Option<PathBuf>,
    pub path_file: Option<PathBuf>,
}

impl GithubContext {
    /// Build from the standard GITHUB_* variables
    pub fn from_env() -> Self {
        let workspace = std::env::var("GITHUB_WORKSPACE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        Self {
            workspace,
            token: std::env::var("GITHUB_TOKEN").unwrap_or_default(),
            repository: std::env::var("GITHUB_REPOSITORY").unwrap_or_default(),
            event_name: std::env::var("GITHUB_EVENT_NAME").unwrap_or_default(),
            git_ref: std::env::var("GITHUB_REF").unwrap_or_default(),
            output_path: std::env::var("GITHUB_OUTPUT").ok().map(PathBuf::from),
            step_summary_path: std::env::var("GITHUB_STEP_SUMMARY").ok().map(PathBuf::from),
            path_file: std::env::var("GITHUB_PATH").ok().map(PathBuf::from),
        }
    }

    pub fn is_pull_request(&self) -> bool {
        self.event_name == "pull_request"
    }

    /// PR number parsed from `refs/pull/<n>/merge`
    pub fn pr_number(&self) -> Option<String> {
        let re = Regex::new(r"refs/pull/(\d+)/merge").expect("valid PR ref pattern");
        re.captures(&self.git_ref)
            .map(|captures| captures[1].to_string())
    }
}

/// Writes outputs and posts summaries; never escalates failures
pub struct Reporter {
    context: GithubContext,
    runner: Arc<dyn CommandRunner>,
}

impl Reporter {
    pub fn new(context: GithubContext, runner: Arc<dyn CommandRunner>) -> Self {
        Self { context, runner }
    }

    pub fn context(&self) -> &GithubContext {
        &self.context
    }

    /// Append a `name=value` line to the Actions output file
    pub fn set_output(&self, name: &str, value: &str) {
        let Some(ref path) = self.context.output_path else {
            return;
        };

        if let Err(e) = append_line(path, &format!("{}={}", name, value)) {
            warn!("Failed to set output '{}': {}", name, e);
        }
    }

    /// Append markdown to the Actions step summary
    pub fn add_step_summary(&self, summary: &str) {
        let Some(ref path) = self.context.step_summary_path else {
            return;
        };

        if let Err(e) = append_line(path, summary) {
            warn!("Failed to append step summary: {}", e);
        }
    }

    pub fn add_success_summary(&self, config: &PipelineConfig, report: &LifecycleReport) {
        self.add_step_summary(&format!(
            "## ✅ Pipeline Success\n\n\
             - **Working Directory**: `{}`\n\
             - **Cloud Provider**: `{}`\n\
             - **Operation**: `{}`\n\
             - **Changes Detected**: `{}`\n",
            config.relative_working_dir().display(),
            config.provider,
            config.operation,
            report.has_changes(),
        ));
    }

    pub fn add_failure_summary(&self, error: &str) {
        self.add_step_summary(&format!(
            "## ❌ Pipeline Failed\n\n**Error**: {}\n\nSee logs for details.\n",
            error
        ));
    }

    /// Post the plan summary to the originating pull request
    ///
    /// Skipped (with a log line) outside PR context or without a token;
    /// a failed post is a warning, not an error.
    pub async fn post_plan_comment(
        &self,
        config: &PipelineConfig,
        report: &LifecycleReport,
        plan_output: &str,
    ) {
        if !config.pr_comment {
            info!("PR comments disabled, skipping");
            return;
        }
        if !self.context.is_pull_request() {
            info!("Not a pull request event, skipping PR comment");
            return;
        }
        if self.context.token.is_empty() {
            warn!("GITHUB_TOKEN not available, skipping PR comment");
            return;
        }
        let Some(pr_number) = self.context.pr_number() else {
            warn!("Could not determine PR number, skipping comment");
            return;
        };
        if !command_exists("gh") {
            warn!("GitHub CLI not available, skipping PR comment");
            return;
        }

        info!("Posting plan summary to PR #{}...", pr_number);

        let comment = format_plan_comment(report, plan_output, &config.relative_working_dir());

        if let Err(e) = self.post_comment(&pr_number, &comment).await {
            warn!("Failed to post PR comment: {}", e);
        } else {
            info!("✓ PR comment posted successfully");
        }
    }

    async fn post_comment(&self, pr_number: &str, body: &str) -> CloudOpsResult<()> {
        let mut file = tempfile::Builder::new().suffix(".md").tempfile()?;
        file.write_all(body.as_bytes())?;

        let spec = CommandSpec::new("gh")
            .args(["pr", "comment"])
            .arg(pr_number)
            .arg("--body-file")
            .arg(file.path().display().to_string())
            .arg("--repo")
            .arg(&self.context.repository)
            .current_dir(&self.context.workspace);

        let output = self.runner.run(&spec).await?;
        if !output.success() {
            warn!("gh pr comment failed: {}", output.combined_output());
        }

        Ok(())
    }
}

/// Render the PR comment: stage table, change summary, collapsible plan
pub fn format_plan_comment(
    report: &LifecycleReport,
    plan_output: &str,
    working_dir: &Path,
) -> String {
    let mut plan_output = plan_output.to_string();
    if plan_output.len() > MAX_PLAN_CHARS {
        let mut cut = MAX_PLAN_CHARS;
        while !plan_output.is_char_boundary(cut) {
            cut -= 1;
        }
        plan_output.truncate(cut);
        plan_output.push_str("\n\n... (output truncated)");
    }

    let mut stage_rows = String::new();
    for stage in &report.stages {
        stage_rows.push_str(&format!("| {} | {} |\n", stage.stage, stage.outcome));
    }

    format!(
        "## 🏗️ Terraform Plan Summary\n\n\
         {}\n\n\
         | Stage | Outcome |\n\
         |---|---|\n\
         {}\n\
         <details>\n\
         <summary>📋 View Full Plan</summary>\n\n\
         ```terraform\n\
         {}\n\
         ```\n\n\
         </details>\n\n\
         ---\n\
         *Working Directory: `{}`*\n",
        extract_change_summary(&plan_output),
        stage_rows,
        plan_output,
        working_dir.display(),
    )
}

/// Pull the one-line change summary out of terraform's plan output
fn extract_change_summary(plan_output: &str) -> String {
    for line in plan_output.lines() {
        if line.contains("Plan:") {
            return format!("**{}**", line.trim());
        }
        if line.contains("No changes") && line.to_lowercase().contains("infrastructure") {
            return "**No changes detected** - Your infrastructure matches the configuration."
                .to_string();
        }
    }

    "**Changes detected** - Review the full plan below.".to_string()
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{}", line)
}
