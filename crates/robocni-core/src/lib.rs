//! robocni core library
//!
//! Runs repeated trials of LLM-generated CNI configurations against a
//! Kubernetes cluster and keeps per-hint success statistics.
//!
//! ## Key Components
//!
//! - `extract`: pulls the fenced JSON configuration out of a model reply
//! - `ConfigGenerator`: bounded query/extract retries for one hint
//! - `TrialOrchestrator`: one generate → deploy → ready → probe trial
//! - `StatsAggregator`: per-hint and run-wide counters with a text report
//! - `Experiment`: the outer loop over N trials
//!
//! The model server and the cluster sit behind the [`ModelQuery`] and
//! [`ClusterControl`] traits; in-memory implementations live in [`fakes`].

mod error;
pub mod experiment;
pub mod extract;
pub mod fakes;
pub mod generator;
pub mod hints;
pub mod manifest;
pub mod obs;
pub mod orchestrator;
pub mod probe;
pub mod prompt;
pub mod readiness;
pub mod settings;
pub mod stats;
pub mod telemetry;
pub mod traits;

pub use error::{
    AttemptFailure, ClusterError, DeploymentError, ExtractError, GenerationError, ProbeError,
    ReadinessError, Result, RobocniError, TransportError,
};
pub use experiment::Experiment;
pub use extract::{extract, ExtractedConfig};
pub use generator::{ConfigGenerator, ValidatedConfig};
pub use hints::HintSet;
pub use manifest::{render_network_attachment, render_test_pods};
pub use orchestrator::{RunState, Side, TrialOrchestrator, TrialOutcome, TrialStatus};
pub use prompt::{render_prompt, HostContext};
pub use settings::{
    ProbeSettings, ReadinessPolicy, TrialSettings, WorkloadSettings, DEFAULT_MAX_ATTEMPTS,
    NETWORKS_ANNOTATION, NETWORK_STATUS_ANNOTATION,
};
pub use stats::{HintStats, RunStats, StatsAggregator};
pub use telemetry::init_tracing;
pub use traits::{ClusterControl, ClusterResult, ModelQuery, PodPhase};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
