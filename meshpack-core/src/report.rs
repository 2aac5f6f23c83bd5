//! Per-package outcomes of a run.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Why a package never ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A package it (transitively) depends on failed.
    UpstreamFailed { culprit: String },
    /// The run was bailed or interrupted before the package was dispatched.
    Aborted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UpstreamFailed { culprit } => write!(f, "{} failed", culprit),
            SkipReason::Aborted => write!(f, "run aborted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed(String),
    Skipped(SkipReason),
}

impl Outcome {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped(_))
    }
}

/// Result of a [`TaskRunner`](crate::TaskRunner) run, handed to the caller
/// for presentation.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Description of the task that was run.
    pub task: String,
    /// Outcome of every selected package, keyed by name.
    pub outcomes: BTreeMap<String, Outcome>,
    /// Packages in the order they were dispatched.
    pub dispatch_order: Vec<String>,
    pub elapsed: Duration,
}

impl RunReport {
    /// `true` iff no package failed.
    pub fn success(&self) -> bool {
        !self.outcomes.values().any(Outcome::is_failure)
    }

    pub fn outcome(&self, package: &str) -> Option<&Outcome> {
        self.outcomes.get(package)
    }

    pub fn succeeded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                Outcome::Failed(message) => Some((name.as_str(), message.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<(&str, &SkipReason)> {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                Outcome::Skipped(reason) => Some((name.as_str(), reason)),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
