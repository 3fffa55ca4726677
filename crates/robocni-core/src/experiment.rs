//! The outer loop: N sequential trials with a running report.

use std::io::Write;

use tracing::{info, Instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::obs::trial_span;
use crate::orchestrator::{RunState, TrialOrchestrator};
use crate::stats::{RunStats, StatsAggregator};

/// One experiment run. Trial failures are counted, never fatal.
pub struct Experiment {
    id: String,
    orchestrator: TrialOrchestrator,
    state: RunState,
}

impl Experiment {
    pub fn new(orchestrator: TrialOrchestrator) -> Self {
        let state = orchestrator.new_state();
        Self {
            id: Uuid::new_v4().to_string(),
            orchestrator,
            state,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.state.stats
    }

    /// Run `runs` trials, writing the report to `out` before every trial
    /// after the first and once more at the end.
    ///
    /// Only a failure to write the report is returned as an error.
    pub async fn run<W: Write>(&mut self, runs: u64, out: &mut W) -> Result<RunStats> {
        info!(
            experiment_id = %self.id,
            runs,
            hints = self.orchestrator.hints().len(),
            "Starting experiment"
        );

        for i in 0..runs {
            if i > 0 {
                out.write_all(self.state.stats.report().as_bytes())?;
                out.flush()?;
            }
            let span = trial_span(&self.id, self.state.trials_started() + 1);
            let outcome = self
                .orchestrator
                .run_trial(&mut self.state)
                .instrument(span)
                .await;
            self.state.stats.record(&outcome);
        }

        out.write_all(self.state.stats.report().as_bytes())?;
        out.flush()?;

        let run = *self.state.stats.run();
        info!(
            experiment_id = %self.id,
            trials = run.total_trials,
            errors = run.total_errors,
            "Experiment finished"
        );
        Ok(run)
    }
}
