// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Lifecycle runner
//!
//! Strictly sequential, forward-only stage machine. The first gating
//! failure halts the run; nothing is retried.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use tracing::{info, warn};

use super::{LifecycleReport, PlanArtifact, Stage, StageOutcome, StageReport};
use crate::config::{KeyValuePairs, Operation};
use crate::errors::{CloudOpsError, CloudOpsResult};
use crate::exec::{CommandRunner, CommandSpec, ProcessOutput};

/// File name of the serialized plan inside the working directory
const PLAN_FILE: &str = "tfplan";

/// Detailed-exitcode value terraform uses for "diff present"
const EXIT_CHANGES: i32 = 2;

/// Options for one lifecycle run
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    pub operation: Operation,
    pub backend_config: KeyValuePairs,
    pub variables: KeyValuePairs,
    /// Treat fmt non-conformance as fatal instead of advisory
    pub strict_fmt: bool,
    /// Run apply even when the plan found no changes
    pub force_apply: bool,
}

/// Runs the Terraform command sequence in a resolved working directory
pub struct LifecycleRunner {
    runner: Arc<dyn CommandRunner>,
    working_dir: PathBuf,
}

impl LifecycleRunner {
    pub fn new(runner: Arc<dyn CommandRunner>, working_dir: PathBuf) -> Self {
        Self { runner, working_dir }
    }

    /// Execute `init → fmt → validate → plan → (apply)`
    pub async fn run(&self, options: &LifecycleOptions) -> CloudOpsResult<LifecycleReport> {
        let mut stages = Vec::new();

        self.init(&options.backend_config).await?;
        stages.push(StageReport { stage: Stage::Init, outcome: StageOutcome::Success });

        let fmt_outcome = self.fmt(options.strict_fmt).await?;
        stages.push(StageReport { stage: Stage::Fmt, outcome: fmt_outcome });

        self.validate().await?;
        stages.push(StageReport { stage: Stage::Validate, outcome: StageOutcome::Success });

        let (plan_outcome, artifact) = self.plan(&options.variables).await?;
        stages.push(StageReport { stage: Stage::Plan, outcome: plan_outcome });

        let should_apply = options.operation.includes_apply()
            && (plan_outcome == StageOutcome::ChangesDetected || options.force_apply);

        if should_apply {
            self.apply(&artifact, &options.variables, options.force_apply)
                .await?;
            stages.push(StageReport { stage: Stage::Apply, outcome: StageOutcome::Success });
        } else {
            info!("Skipping apply (no changes or not requested)");
            stages.push(StageReport { stage: Stage::Apply, outcome: StageOutcome::Skipped });
        }

        Ok(LifecycleReport { stages, plan: Some(artifact) })
    }

    async fn init(&self, backend_config: &KeyValuePairs) -> CloudOpsResult<()> {
        info!("Running terraform init...");

        let mut spec = self.terraform().arg("init").arg("-input=false");
        for assignment in backend_config.as_assignments() {
            spec = spec.arg("-backend-config").arg(assignment);
        }

        let output = self.runner.run(&spec).await?;
        if !output.success() {
            return Err(CloudOpsError::Init { output: output.combined_output() });
        }

        println!("  {} init", "✓".green());
        Ok(())
    }

    async fn fmt(&self, strict: bool) -> CloudOpsResult<StageOutcome> {
        info!("Running terraform fmt check...");

        let check = self.terraform().args(["fmt", "-check", "-recursive"]);
        let output = self.runner.run(&check).await?;

        if output.success() {
            println!("  {} fmt", "✓".green());
            return Ok(StageOutcome::Success);
        }

        if strict {
            println!("  {} fmt", "✗".red());
            return Err(stage_failed(Stage::Fmt, &output));
        }

        // Advisory: report the failed check, fix in place, and move on
        warn!("Terraform formatting issues detected, auto-fixing...");
        let fix = self.terraform().args(["fmt", "-recursive"]);
        let fix_output = self.runner.run(&fix).await?;
        if !fix_output.success() {
            warn!("terraform fmt could not fix formatting: {}", fix_output.combined_output());
        }

        println!("  {} fmt {}", "✗".yellow(), "(advisory)".dimmed());
        Ok(StageOutcome::Failure)
    }

    async fn validate(&self) -> CloudOpsResult<()> {
        info!("Running terraform validate...");

        let spec = self.terraform().arg("validate");
        let output = self.runner.run(&spec).await?;
        if !output.success() {
            println!("  {} validate", "✗".red());
            return Err(CloudOpsError::Validation { output: output.combined_output() });
        }

        println!("  {} validate", "✓".green());
        Ok(())
    }

    async fn plan(&self, variables: &KeyValuePairs) -> CloudOpsResult<(StageOutcome, PlanArtifact)> {
        info!("Running terraform plan...");

        let plan_path = self.working_dir.join(PLAN_FILE);

        let mut spec = self
            .terraform()
            .arg("plan")
            .arg("-out")
            .arg(plan_path.display().to_string())
            .arg("-detailed-exitcode")
            .arg("-input=false");
        for assignment in variables.as_assignments() {
            spec = spec.arg("-var").arg(assignment);
        }

        let output = self.runner.run(&spec).await?;
        let artifact = PlanArtifact {
            path: plan_path,
            summary: output.stdout.clone(),
        };

        // Exit code 0 = no changes, 2 = changes present, anything else = error
        match output.exit_code {
            0 => {
                println!("  {} plan {}", "✓".green(), "(no changes)".dimmed());
                Ok((StageOutcome::Success, artifact))
            }
            EXIT_CHANGES => {
                println!("  {} plan {}", "✓".green(), "(changes detected)".dimmed());
                Ok((StageOutcome::ChangesDetected, artifact))
            }
            _ => {
                println!("  {} plan", "✗".red());
                Err(stage_failed(Stage::Plan, &output))
            }
        }
    }

    async fn apply(
        &self,
        artifact: &PlanArtifact,
        variables: &KeyValuePairs,
        forced: bool,
    ) -> CloudOpsResult<()> {
        info!("Running terraform apply...");

        let spec = if artifact.path.exists() {
            self.terraform()
                .args(["apply", "-input=false", "-auto-approve"])
                .arg(artifact.path.display().to_string())
        } else if forced {
            // Forced apply without a usable plan file applies the
            // configuration directly
            let mut spec = self.terraform().args(["apply", "-input=false", "-auto-approve"]);
            for assignment in variables.as_assignments() {
                spec = spec.arg("-var").arg(assignment);
            }
            spec
        } else {
            return Err(CloudOpsError::PlanArtifactMissing { path: artifact.path.clone() });
        };

        let output = self.runner.run(&spec).await?;
        if !output.success() {
            println!("  {} apply", "✗".red());
            return Err(stage_failed(Stage::Apply, &output));
        }

        println!("  {} apply", "✓".green());
        Ok(())
    }

    fn terraform(&self) -> CommandSpec {
        CommandSpec::new("terraform").current_dir(&self.working_dir)
    }
}

fn stage_failed(stage: Stage, output: &ProcessOutput) -> CloudOpsError {
    CloudOpsError::StageFailed {
        stage: stage.to_string(),
        exit_code: output.exit_code,
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::fake::FakeRunner;

    fn options(operation: Operation) -> LifecycleOptions {
        LifecycleOptions {
            operation,
            backend_config: KeyValuePairs::default(),
            variables: KeyValuePairs::default(),
            strict_fmt: false,
            force_apply: false,
        }
    }

    fn runner_and_dir() -> (Arc<FakeRunner>, tempfile::TempDir) {
        (Arc::new(FakeRunner::new()), tempfile::tempdir().unwrap())
    }

    #[tokio::test]
    async fn test_plan_exit_zero_maps_to_success() {
        let (fake, dir) = runner_and_dir();
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let report = lifecycle.run(&options(Operation::Plan)).await.unwrap();

        assert_eq!(report.plan_outcome(), Some(StageOutcome::Success));
        assert_eq!(report.apply_outcome(), Some(StageOutcome::Skipped));
        assert!(!fake.invoked("terraform", Some("apply")));
    }

    #[tokio::test]
    async fn test_plan_exit_two_maps_to_changes() {
        let (fake, dir) = runner_and_dir();
        fake.respond("terraform", Some("plan"), 2, "Plan: 1 to add", "");
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let report = lifecycle.run(&options(Operation::Plan)).await.unwrap();

        assert_eq!(report.plan_outcome(), Some(StageOutcome::ChangesDetected));
        // Plan-only runs never apply, even with changes
        assert_eq!(report.apply_outcome(), Some(StageOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_plan_other_exit_is_failure() {
        let (fake, dir) = runner_and_dir();
        fake.respond("terraform", Some("plan"), 1, "", "provider error");
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let err = lifecycle.run(&options(Operation::PlanApply)).await.unwrap_err();

        match err {
            CloudOpsError::StageFailed { stage, exit_code, stderr, .. } => {
                assert_eq!(stage, "plan");
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "provider error");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!fake.invoked("terraform", Some("apply")));
    }

    #[tokio::test]
    async fn test_apply_runs_on_changes() {
        let (fake, dir) = runner_and_dir();
        fake.respond("terraform", Some("plan"), 2, "Plan: 2 to add", "");
        std::fs::write(dir.path().join(PLAN_FILE), b"plan").unwrap();
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let report = lifecycle.run(&options(Operation::PlanApply)).await.unwrap();

        assert_eq!(report.plan_outcome(), Some(StageOutcome::ChangesDetected));
        assert_eq!(report.apply_outcome(), Some(StageOutcome::Success));
        assert!(fake.invoked("terraform", Some("apply")));
    }

    #[tokio::test]
    async fn test_apply_skipped_without_changes() {
        let (fake, dir) = runner_and_dir();
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let report = lifecycle.run(&options(Operation::PlanApply)).await.unwrap();

        assert_eq!(report.apply_outcome(), Some(StageOutcome::Skipped));
        assert!(!fake.invoked("terraform", Some("apply")));
    }

    #[tokio::test]
    async fn test_forced_apply_without_changes() {
        let (fake, dir) = runner_and_dir();
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let mut opts = options(Operation::PlanApply);
        opts.force_apply = true;

        let report = lifecycle.run(&opts).await.unwrap();

        assert_eq!(report.plan_outcome(), Some(StageOutcome::Success));
        assert_eq!(report.apply_outcome(), Some(StageOutcome::Success));
        assert!(fake.invoked("terraform", Some("apply")));
    }

    #[tokio::test]
    async fn test_validate_failure_halts_before_plan() {
        let (fake, dir) = runner_and_dir();
        fake.respond("terraform", Some("validate"), 1, "", "invalid block");
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let err = lifecycle.run(&options(Operation::PlanApply)).await.unwrap_err();

        assert!(matches!(err, CloudOpsError::Validation { .. }));
        assert!(!fake.invoked("terraform", Some("plan")));
        assert!(!fake.invoked("terraform", Some("apply")));
    }

    #[tokio::test]
    async fn test_init_failure_is_fatal() {
        let (fake, dir) = runner_and_dir();
        fake.respond("terraform", Some("init"), 1, "", "backend unreachable");
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let err = lifecycle.run(&options(Operation::Plan)).await.unwrap_err();

        match err {
            CloudOpsError::Init { output } => assert!(output.contains("backend unreachable")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!fake.invoked("terraform", Some("validate")));
    }

    #[tokio::test]
    async fn test_fmt_advisory_continues_and_autofixes() {
        let (fake, dir) = runner_and_dir();
        fake.respond("terraform", Some("fmt"), 1, "", "main.tf");
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let report = lifecycle.run(&options(Operation::Plan)).await.unwrap();

        assert_eq!(report.outcome(Stage::Fmt), Some(StageOutcome::Failure));
        assert_eq!(report.plan_outcome(), Some(StageOutcome::Success));

        // Both the check and the auto-fix pass ran
        let fmt_calls: Vec<_> = fake
            .calls()
            .into_iter()
            .filter(|call| call.get(1).map(String::as_str) == Some("fmt"))
            .collect();
        assert_eq!(fmt_calls.len(), 2);
        assert!(fmt_calls[0].contains(&"-check".to_string()));
        assert!(!fmt_calls[1].contains(&"-check".to_string()));
    }

    #[tokio::test]
    async fn test_fmt_strict_halts() {
        let (fake, dir) = runner_and_dir();
        fake.respond("terraform", Some("fmt"), 3, "", "main.tf");
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let mut opts = options(Operation::Plan);
        opts.strict_fmt = true;

        let err = lifecycle.run(&opts).await.unwrap_err();
        match err {
            CloudOpsError::StageFailed { stage, .. } => assert_eq!(stage, "fmt"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!fake.invoked("terraform", Some("validate")));
    }

    #[tokio::test]
    async fn test_backend_config_and_vars_forwarded() {
        let (fake, dir) = runner_and_dir();
        let lifecycle = LifecycleRunner::new(fake.clone(), dir.path().to_path_buf());

        let mut opts = options(Operation::Plan);
        opts.backend_config = KeyValuePairs::parse("backend_config", "key=state.tfstate").unwrap();
        opts.variables = KeyValuePairs::parse("tf_vars", "env=prod").unwrap();

        lifecycle.run(&opts).await.unwrap();

        let calls = fake.calls();
        let init = calls.iter().find(|c| c.get(1).map(String::as_str) == Some("init")).unwrap();
        assert!(init.windows(2).any(|w| w[0] == "-backend-config" && w[1] == "key=state.tfstate"));

        let plan = calls.iter().find(|c| c.get(1).map(String::as_str) == Some("plan")).unwrap();
        assert!(plan.windows(2).any(|w| w[0] == "-var" && w[1] == "env=prod"));
    }
}
