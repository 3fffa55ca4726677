//! Per-hint and run-wide counters, plus the text report.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::orchestrator::{TrialOutcome, TrialStatus};

/// Counters for a single hint slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintStats {
    pub runs: u64,
    pub successes: u64,
}

/// Counters across every trial of a run.
///
/// `total_errors` is the sum of the generation, deployment and probe
/// buckets. Readiness timeouts are counted as deployment errors and also
/// tallied on their own in `readiness_timeouts`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_trials: u64,
    pub total_errors: u64,
    pub generation_errors: u64,
    pub deployment_errors: u64,
    pub readiness_timeouts: u64,
    pub probe_errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsAggregator {
    run: RunStats,
    hints: Vec<HintStats>,
}

impl StatsAggregator {
    /// One slot per loaded hint.
    pub fn new(hint_count: usize) -> Self {
        Self {
            run: RunStats::default(),
            hints: vec![HintStats::default(); hint_count],
        }
    }

    pub fn record(&mut self, outcome: &TrialOutcome) {
        self.run.total_trials += 1;
        if let Some(slot) = self.hints.get_mut(outcome.hint_index) {
            slot.runs += 1;
            if outcome.status.is_success() {
                slot.successes += 1;
            }
        }

        match &outcome.status {
            TrialStatus::Success { .. } => return,
            TrialStatus::GenerationFailed(_) => self.run.generation_errors += 1,
            TrialStatus::DeploymentFailed(_) => self.run.deployment_errors += 1,
            TrialStatus::ReadinessTimeout { .. } => {
                self.run.deployment_errors += 1;
                self.run.readiness_timeouts += 1;
            }
            TrialStatus::ProbeFailed(_) => self.run.probe_errors += 1,
        }
        self.run.total_errors += 1;
    }

    pub fn run(&self) -> &RunStats {
        &self.run
    }

    pub fn hints(&self) -> &[HintStats] {
        &self.hints
    }

    /// Render the running summary. Hints are numbered from 1.
    pub fn report(&self) -> String {
        let run = &self.run;
        let total = run.total_trials;
        let mut out = String::from("---\n");
        let _ = writeln!(out, "Run number: {total}");
        for (label, count) in [
            ("Total Errors", run.total_errors),
            ("Generation Errors", run.generation_errors),
            ("Failed Pod Creations", run.deployment_errors),
            ("Readiness Timeouts", run.readiness_timeouts),
            ("Ping Errors", run.probe_errors),
        ] {
            let _ = writeln!(out, "{label}: {count} ({:.2}%)", percent(count, total));
        }
        out.push_str("Stats Array:\n");
        for (i, hint) in self.hints.iter().enumerate() {
            let _ = writeln!(
                out,
                "  Hint {}: Runs: {}, Successes: {}",
                i + 1,
                hint.runs,
                hint.successes
            );
        }
        out
    }
}

fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}
