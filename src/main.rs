// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! cloudops - Terraform Pipeline Orchestrator
//!
//! Toolchain install, cloud authentication, and the Terraform lifecycle
//! in one sequential pipeline.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cloudops::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cloudops=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Run { inputs } => cloudops::cli::run::run(inputs, cli.verbose).await,
        Commands::Check { inputs } => cloudops::cli::check::run(inputs, cli.verbose).await,
        Commands::Install {
            provider,
            tf_version,
            gh_cli_version,
        } => cloudops::cli::install::run(provider, tf_version, gh_cli_version, cli.verbose).await,
    }
}
