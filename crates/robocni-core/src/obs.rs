//! Structured observability hooks for the experiment loop.
//!
//! - `trial_span` scoping every log line of a trial
//! - emission functions for trial and generation lifecycle events
//!
//! Events are emitted at `info!`/`warn!` level and filtered through
//! `ROBOCNI_LOG` (see [`crate::telemetry`]).

use tracing::{info, warn};

/// Span scoping every log line of one trial.
///
/// Attach it with `tracing::Instrument` rather than entering it, since the
/// trial future is held across awaits:
///
/// ```ignore
/// orchestrator.run_trial(&mut state).instrument(trial_span(&id, 3)).await;
/// ```
pub fn trial_span(experiment_id: &str, trial: u64) -> tracing::Span {
    tracing::info_span!("trial", experiment_id = %experiment_id, trial = trial)
}

/// Emit event: a trial selected its hint.
pub fn emit_trial_started(trial: u64, hint_index: usize, hint: &str) {
    info!(event = "trial.started", trial, hint_index, hint = %hint);
}

/// Emit event: a trial reached its terminal outcome.
pub fn emit_trial_finished(trial: u64, hint_index: usize, outcome: &str, duration_ms: u64) {
    info!(
        event = "trial.finished",
        trial,
        hint_index,
        outcome = %outcome,
        duration_ms,
    );
}

/// Emit event: one generation attempt was discarded.
pub fn emit_attempt_failed(attempt: u32, max_attempts: u32, reason: &dyn std::fmt::Display) {
    warn!(
        event = "generation.attempt_failed",
        attempt,
        max_attempts,
        reason = %reason,
        "Attempt {attempt}/{max_attempts} failed",
    );
}

/// Emit event: a best-effort delete failed and was ignored.
pub fn emit_cleanup_ignored(what: &str, error: &dyn std::fmt::Display) {
    tracing::debug!(event = "cleanup.ignored", what = %what, error = %error);
}
