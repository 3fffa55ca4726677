//! Tunables for a trial.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generation attempts per trial.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Annotation Multus writes with the attached networks of a pod.
pub const NETWORK_STATUS_ANNOTATION: &str = "k8s.v1.cni.cncf.io/network-status";

/// Annotation requesting secondary networks for a pod.
pub const NETWORKS_ANNOTATION: &str = "k8s.v1.cni.cncf.io/networks";

/// Readiness polling for the two test workloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessPolicy {
    pub poll_interval: Duration,
    pub left_deadline: Duration,
    /// The right pod is scheduled together with the left one, so it gets a shorter wait.
    pub right_deadline: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            left_deadline: Duration::from_secs(30),
            right_deadline: Duration::from_secs(15),
        }
    }
}

/// Reachability probe issued from the left workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// Interface name the injected network shows up as inside the pod.
    pub interface: String,
    pub annotation_key: String,
    pub count: u32,
    pub interval_secs: f32,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            interface: "net1".to_string(),
            annotation_key: NETWORK_STATUS_ANNOTATION.to_string(),
            count: 3,
            interval_secs: 0.5,
        }
    }
}

impl ProbeSettings {
    /// Ping command run inside the left pod.
    pub fn command(&self, address: &str) -> Vec<String> {
        vec![
            "ping".to_string(),
            "-i".to_string(),
            self.interval_secs.to_string(),
            "-c".to_string(),
            self.count.to_string(),
            address.to_string(),
        ]
    }
}

/// Fixed test workload slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSettings {
    pub left: String,
    pub right: String,
    pub image: String,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            left: "testpod-left".to_string(),
            right: "testpod-right".to_string(),
            image: "alpine".to_string(),
        }
    }
}

/// Everything a trial needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSettings {
    pub max_attempts: u32,
    pub readiness: ReadinessPolicy,
    pub probe: ProbeSettings,
    pub workloads: WorkloadSettings,
    /// Seed for hint selection; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TrialSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            readiness: ReadinessPolicy::default(),
            probe: ProbeSettings::default(),
            workloads: WorkloadSettings::default(),
            seed: None,
        }
    }
}

impl TrialSettings {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
