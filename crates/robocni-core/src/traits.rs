//! Collaborator seams consumed by the trial pipeline.
//!
//! - `ModelQuery`: one prompt in, one fully decoded reply out
//! - `ClusterControl`: point-in-time control-plane operations
//!
//! Production adapters live in `robocni-llm` and `robocni-kube`; in-memory
//! fakes are provided by the `fakes` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, TransportError};

/// Result type for control-plane operations
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;

/// Text generation service.
#[async_trait]
pub trait ModelQuery: Send + Sync {
    /// Send `prompt` and return the concatenated reply text.
    async fn query(&self, prompt: &str) -> std::result::Result<String, TransportError>;
}

/// Lifecycle phase of a pod as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown(String),
}

impl PodPhase {
    /// Parse the raw `.status.phase` value; surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            other => PodPhase::Unknown(other.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, PodPhase::Running)
    }
}

impl std::fmt::Display for PodPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PodPhase::Pending => write!(f, "Pending"),
            PodPhase::Running => write!(f, "Running"),
            PodPhase::Succeeded => write!(f, "Succeeded"),
            PodPhase::Failed => write!(f, "Failed"),
            PodPhase::Unknown(raw) if raw.is_empty() => write!(f, "<none>"),
            PodPhase::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}

/// Cluster control plane.
///
/// Manifests are passed as raw text; objects are identified by the names
/// inside them. None of the operations retry.
#[async_trait]
pub trait ClusterControl: Send + Sync {
    /// Create every object in `manifest`. An object that already exists is an error.
    async fn apply(&self, manifest: &str) -> ClusterResult<()>;

    /// Delete every object in `manifest`.
    async fn delete(&self, manifest: &str) -> ClusterResult<()>;

    /// Current phase of pod `pod`.
    async fn pod_phase(&self, pod: &str) -> ClusterResult<PodPhase>;

    /// Value of annotation `key` on pod `pod` (empty if unset).
    async fn annotation(&self, pod: &str, key: &str) -> ClusterResult<String>;

    /// Run `command` inside pod `pod` and return its combined output.
    async fn exec(&self, pod: &str, command: &[String]) -> ClusterResult<String>;
}
