// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! # cloudops - Terraform Pipeline Orchestrator
//!
//! `cloudops` installs a Terraform/cloud-CLI toolchain, authenticates
//! against Azure and/or AWS, and runs a fixed
//! `init → fmt → validate → plan → apply` sequence with deterministic
//! outcome reporting to GitHub.
//!
//! ## Features
//!
//! - **Input resolution** - validated configuration, file-or-directory
//!   working-directory resolution
//! - **Idempotent toolchain install** - version-checked before any download
//! - **Provider authentication** - Azure service principal, AWS access
//!   keys, or both
//! - **Fail-fast lifecycle** - exit-code driven plan outcomes, no retries
//! - **Reporting** - Actions outputs, step summaries, PR comments
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate inputs and resolve the working directory
//! cloudops check --tf-path infra
//!
//! # Install the toolchain for a provider
//! cloudops install --provider aws
//!
//! # Run the pipeline
//! cloudops run --tf-path infra --provider azure --operation plan
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod github;
pub mod pipeline;
pub mod terraform;
pub mod toolchain;
pub mod utils;

// Re-export commonly used types
pub use config::{Operation, PipelineConfig, Provider};
pub use errors::{CloudOpsError, CloudOpsResult};
pub use pipeline::PipelineRunner;
pub use terraform::{Stage, StageOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
