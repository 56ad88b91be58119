// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 cloudops contributors

//! Terraform lifecycle
//!
//! Stage and outcome types, plus the runner that drives the fixed
//! `init → fmt → validate → plan → apply` sequence.

mod lifecycle;

pub use lifecycle::{LifecycleOptions, LifecycleRunner};

use std::fmt;
use std::path::PathBuf;

/// One discrete step of the lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Fmt,
    Validate,
    Plan,
    Apply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Fmt => "fmt",
            Self::Validate => "validate",
            Self::Plan => "plan",
            Self::Apply => "apply",
        };
        write!(f, "{}", name)
    }
}

/// Result of one executed (or skipped) stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Failure,
    ChangesDetected,
    Skipped,
}

impl StageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::ChangesDetected => "changes-detected",
            Self::Skipped => "skipped",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome attached to a stage, produced once per non-skipped stage
#[derive(Debug, Clone, Copy)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

/// The serialized plan produced by the plan stage
///
/// Owned by the lifecycle runner until handed to reporting; not persisted
/// beyond the run.
#[derive(Debug, Clone)]
pub struct PlanArtifact {
    pub path: PathBuf,
    /// Human-readable plan output, kept for the PR comment
    pub summary: String,
}

/// Per-stage outcomes of a completed lifecycle run
#[derive(Debug, Clone, Default)]
pub struct LifecycleReport {
    pub stages: Vec<StageReport>,
    pub plan: Option<PlanArtifact>,
}

impl LifecycleReport {
    pub fn outcome(&self, stage: Stage) -> Option<StageOutcome> {
        self.stages
            .iter()
            .find(|report| report.stage == stage)
            .map(|report| report.outcome)
    }

    pub fn plan_outcome(&self) -> Option<StageOutcome> {
        self.outcome(Stage::Plan)
    }

    pub fn apply_outcome(&self) -> Option<StageOutcome> {
        self.outcome(Stage::Apply)
    }

    pub fn has_changes(&self) -> bool {
        self.plan_outcome() == Some(StageOutcome::ChangesDetected)
    }
}
