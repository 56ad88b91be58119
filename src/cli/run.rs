// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Run command - execute the full pipeline

use colored::Colorize;
use miette::Result;
use std::sync::Arc;

use super::InputArgs;
use crate::config::PipelineConfig;
use crate::exec::{ProcessEnvironment, SystemRunner};
use crate::github::GithubContext;
use crate::pipeline::PipelineRunner;
use crate::terraform::LifecycleReport;

/// Run the pipeline
pub async fn run(inputs: InputArgs, verbose: bool) -> Result<()> {
    let github = GithubContext::from_env();
    let config = PipelineConfig::from_inputs(&inputs.into_raw(), &github.workspace)?;

    let pipeline = PipelineRunner::new(
        config,
        Arc::new(SystemRunner::new()),
        Arc::new(ProcessEnvironment),
        github,
    );

    let report = pipeline.run().await?;

    print_outcomes(&report, verbose);

    Ok(())
}

fn print_outcomes(report: &LifecycleReport, verbose: bool) {
    println!();
    println!("{}:", "Outcomes".bold());
    for stage in &report.stages {
        let glyph = match stage.outcome {
            crate::terraform::StageOutcome::Success
            | crate::terraform::StageOutcome::ChangesDetected => "✓".green(),
            crate::terraform::StageOutcome::Failure => "✗".yellow(),
            crate::terraform::StageOutcome::Skipped => "○".dimmed(),
        };
        println!("  {} {} - {}", glyph, stage.stage, stage.outcome);
    }

    if verbose {
        if let Some(ref plan) = report.plan {
            if !plan.summary.is_empty() {
                println!();
                println!("{}:", "Plan".bold());
                println!("{}", plan.summary.dimmed());
            }
        }
    }
}
