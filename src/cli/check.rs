// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Check command - validate inputs without running anything

use colored::Colorize;
use miette::Result;

use super::InputArgs;
use crate::config::PipelineConfig;
use crate::github::GithubContext;

/// Validate inputs and resolve the working directory
pub async fn run(inputs: InputArgs, verbose: bool) -> Result<()> {
    let github = GithubContext::from_env();
    let config = PipelineConfig::from_inputs(&inputs.into_raw(), &github.workspace)?;

    println!("{} Inputs are valid", "✓".green());
    println!("  provider: {}", config.provider);
    println!("  operation: {}", config.operation);
    println!("  working directory: {}", config.relative_working_dir().display());

    if verbose {
        println!("  terraform version: {}", config.versions.terraform);
        println!("  backend config entries: {}", config.backend_config.len());
        println!("  variable entries: {}", config.tf_vars.len());
        println!("  strict fmt: {}", config.strict_fmt);
        println!("  force apply: {}", config.force_apply);
    }

    Ok(())
}
