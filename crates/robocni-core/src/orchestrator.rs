//! One trial: generate → deploy config → deploy workloads → readiness → probe.
//!
//! Steps run strictly in order and the first failure ends the trial with the
//! matching [`TrialStatus`]. Nothing inside a trial is retried except model
//! generation, which the [`ConfigGenerator`] bounds on its own.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DeploymentError, GenerationError, ProbeError, ReadinessError};
use crate::generator::ConfigGenerator;
use crate::hints::HintSet;
use crate::manifest::{render_network_attachment, render_test_pods};
use crate::obs::{emit_cleanup_ignored, emit_trial_finished, emit_trial_started};
use crate::probe::probe_connectivity;
use crate::prompt::HostContext;
use crate::readiness::wait_until_running;
use crate::settings::TrialSettings;
use crate::stats::StatsAggregator;
use crate::traits::{ClusterControl, ModelQuery};

/// Which test workload a readiness timeout refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// Terminal state of a trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialStatus {
    Success { config_name: String, address: String },
    GenerationFailed(GenerationError),
    DeploymentFailed(DeploymentError),
    ReadinessTimeout { side: Side, error: ReadinessError },
    ProbeFailed(ProbeError),
}

impl TrialStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TrialStatus::Success { .. })
    }

    /// Short machine-friendly label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            TrialStatus::Success { .. } => "success",
            TrialStatus::GenerationFailed(_) => "generation_failed",
            TrialStatus::DeploymentFailed(_) => "deployment_failed",
            TrialStatus::ReadinessTimeout { side: Side::Left, .. } => "readiness_timeout_left",
            TrialStatus::ReadinessTimeout { side: Side::Right, .. } => "readiness_timeout_right",
            TrialStatus::ProbeFailed(_) => "probe_failed",
        }
    }
}

/// Result of one trial, attributed to the hint that seeded it.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    /// 1-based trial number within the run.
    pub trial: u64,
    pub hint_index: usize,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: TrialStatus,
}

/// Manifests created by the latest trial, deleted before the next one.
#[derive(Debug, Default)]
struct DeployedObjects {
    config: Option<String>,
    workloads: Option<String>,
}

/// Process state threaded through every trial of a run.
#[derive(Debug)]
pub struct RunState {
    pub stats: StatsAggregator,
    deployed: DeployedObjects,
    trials_started: u64,
}

impl RunState {
    pub fn new(hint_count: usize) -> Self {
        Self {
            stats: StatsAggregator::new(hint_count),
            deployed: DeployedObjects::default(),
            trials_started: 0,
        }
    }

    pub fn trials_started(&self) -> u64 {
        self.trials_started
    }

    /// Whether a configuration object from the latest trial is still tracked.
    pub fn has_deployed_config(&self) -> bool {
        self.deployed.config.is_some()
    }
}

/// Drives single trials against the model and the cluster.
pub struct TrialOrchestrator {
    generator: ConfigGenerator,
    cluster: Arc<dyn ClusterControl>,
    hints: HintSet,
    context: HostContext,
    settings: TrialSettings,
    rng: StdRng,
}

impl TrialOrchestrator {
    pub fn new(
        model: Arc<dyn ModelQuery>,
        cluster: Arc<dyn ClusterControl>,
        hints: HintSet,
        settings: TrialSettings,
    ) -> Self {
        let generator = ConfigGenerator::new(model).with_max_attempts(settings.max_attempts);
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            generator,
            cluster,
            hints,
            context: HostContext::default(),
            settings,
            rng,
        }
    }

    /// Offer host network introspection output to the model.
    pub fn with_context(mut self, context: HostContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_reply_logging(mut self, enabled: bool) -> Self {
        self.generator = self.generator.with_reply_logging(enabled);
        self
    }

    pub fn hints(&self) -> &HintSet {
        &self.hints
    }

    /// Fresh state sized for this orchestrator's hints.
    pub fn new_state(&self) -> RunState {
        RunState::new(self.hints.len())
    }

    /// Run one trial to its terminal outcome.
    pub async fn run_trial(&mut self, state: &mut RunState) -> TrialOutcome {
        state.trials_started += 1;
        let trial = state.trials_started;
        let started_at = Utc::now();
        let start = Instant::now();

        self.cleanup(state).await;

        let hint_index = self.rng.gen_range(0..self.hints.len());
        let hint = self.hints.get(hint_index).unwrap_or_default().to_string();
        emit_trial_started(trial, hint_index, &hint);

        let status = self.execute(state, &hint).await;

        let duration_ms = start.elapsed().as_millis() as u64;
        emit_trial_finished(trial, hint_index, status.label(), duration_ms);

        TrialOutcome {
            trial,
            hint_index,
            started_at,
            duration_ms,
            status,
        }
    }

    async fn execute(&self, state: &mut RunState, hint: &str) -> TrialStatus {
        let cluster = self.cluster.as_ref();

        let config = match self.generator.generate(hint, &self.context).await {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Error generating net-attach-def");
                return TrialStatus::GenerationFailed(e);
            }
        };

        let config_manifest = render_network_attachment(&config.name, &config.config_text);
        delete_best_effort(cluster, &config_manifest, "configuration").await;
        if let Err(source) = cluster.apply(&config_manifest).await {
            warn!(name = %config.name, error = %source, "Error creating net-attach-def");
            return TrialStatus::DeploymentFailed(DeploymentError::ConfigRejected {
                name: config.name,
                source,
            });
        }
        state.deployed.config = Some(config_manifest);

        info!(name = %config.name, "Spinning up pods");
        let workloads = &self.settings.workloads;
        let pods_manifest = render_test_pods(&config.name, workloads);
        delete_best_effort(cluster, &pods_manifest, "test workloads").await;
        // Tracked before creation: a multi-object create can fail half way.
        state.deployed.workloads = Some(pods_manifest.clone());
        if let Err(source) = cluster.apply(&pods_manifest).await {
            warn!(error = %source, "Error creating test pods");
            return TrialStatus::DeploymentFailed(DeploymentError::WorkloadsRejected { source });
        }

        let readiness = &self.settings.readiness;
        for (side, pod, deadline) in [
            (Side::Left, &workloads.left, readiness.left_deadline),
            (Side::Right, &workloads.right, readiness.right_deadline),
        ] {
            if let Err(error) =
                wait_until_running(cluster, pod, readiness.poll_interval, deadline).await
            {
                warn!(side = %side, error = %error, "Pod never became ready");
                return TrialStatus::ReadinessTimeout { side, error };
            }
        }

        match probe_connectivity(cluster, &self.settings.probe, &workloads.left, &workloads.right)
            .await
        {
            Ok(address) => {
                info!(address = %address, "Ping succeeded");
                TrialStatus::Success {
                    config_name: config.name,
                    address,
                }
            }
            Err(e) => {
                warn!(error = %e, "Probe failed");
                TrialStatus::ProbeFailed(e)
            }
        }
    }

    /// Remove what the previous trial left behind, workloads first since
    /// they reference the configuration object.
    async fn cleanup(&self, state: &mut RunState) {
        let cluster = self.cluster.as_ref();
        if let Some(pods) = state.deployed.workloads.take() {
            delete_best_effort(cluster, &pods, "previous test workloads").await;
        }
        if let Some(config) = state.deployed.config.take() {
            delete_best_effort(cluster, &config, "previous configuration").await;
        }
    }
}

/// Delete `manifest` and discard the error.
///
/// An object that does not exist is not a failure here; one that lingers
/// for another reason makes the following create fail.
async fn delete_best_effort(cluster: &dyn ClusterControl, manifest: &str, what: &str) {
    if let Err(e) = cluster.delete(manifest).await {
        emit_cleanup_ignored(what, &e);
    }
}
