//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `ScriptedModel` and `FakeCluster`, which satisfy the trait
//! contracts without a model server or a cluster and record every call.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{ClusterError, TransportError};
use crate::settings::NETWORK_STATUS_ANNOTATION;
use crate::traits::*;

// ---------------------------------------------------------------------------
// ScriptedModel
// ---------------------------------------------------------------------------

/// Model fake that replays a script of replies, then repeats a fallback.
#[derive(Debug)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, TransportError>>>,
    fallback: Result<String, TransportError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Replay `script` in order; once exhausted every call fails with
    /// `TransportError::Unreachable`.
    pub fn new(script: Vec<Result<String, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Err(TransportError::Unreachable("script exhausted".to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer `reply`.
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(reply.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with `error`.
    pub fn failing(error: TransportError) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of queries received so far.
    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelQuery for ScriptedModel {
    async fn query(&self, prompt: &str) -> Result<String, TransportError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

// ---------------------------------------------------------------------------
// FakeCluster
// ---------------------------------------------------------------------------

/// A control-plane call observed by [`FakeCluster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterCall {
    Apply(String),
    Delete(String),
    PodPhase(String),
    Annotation { pod: String, key: String },
    Exec { pod: String, command: Vec<String> },
}

/// Cluster fake where every operation succeeds unless configured otherwise.
///
/// Pods report `Running`, and every pod's network-status annotation lists
/// `net1` with address `192.168.50.3`.
#[derive(Debug, Default)]
pub struct FakeCluster {
    calls: Mutex<Vec<ClusterCall>>,
    reject_apply: Mutex<Vec<String>>,
    fail_delete: Mutex<bool>,
    never_ready: Mutex<HashSet<String>>,
    annotations: Mutex<HashMap<(String, String), String>>,
    exec_error: Mutex<Option<String>>,
}

/// Annotation value returned when none was configured.
pub const DEFAULT_NETWORK_STATUS: &str = r#"[{"name":"cbr0","interface":"eth0","ips":["10.244.1.7"],"default":true},{"name":"default/cfg1","interface":"net1","ips":["192.168.50.3"]}]"#;

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject `apply` for any manifest containing `needle`.
    pub fn reject_apply_containing(self, needle: impl Into<String>) -> Self {
        self.reject_apply.lock().unwrap().push(needle.into());
        self
    }

    /// Make every `delete` fail (as if the objects did not exist).
    pub fn failing_deletes(self) -> Self {
        *self.fail_delete.lock().unwrap() = true;
        self
    }

    /// Keep `pod` in `Pending` forever.
    pub fn never_ready(self, pod: impl Into<String>) -> Self {
        self.never_ready.lock().unwrap().insert(pod.into());
        self
    }

    /// Serve `value` for annotation `key` on `pod`.
    pub fn with_annotation(
        self,
        pod: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.annotations
            .lock()
            .unwrap()
            .insert((pod.into(), key.into()), value.into());
        self
    }

    /// Make every `exec` fail with `output`.
    pub fn failing_exec(self, output: impl Into<String>) -> Self {
        *self.exec_error.lock().unwrap() = Some(output.into());
        self
    }

    /// All calls received, in order.
    pub fn calls(&self) -> Vec<ClusterCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Manifests passed to `apply`, in order.
    pub fn applied(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ClusterCall::Apply(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Manifests passed to `delete`, in order.
    pub fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ClusterCall::Delete(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    /// Number of phase queries for `pod`.
    pub fn phase_queries(&self, pod: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ClusterCall::PodPhase(p) if p == pod))
            .count()
    }

    /// Number of `exec` calls.
    pub fn exec_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ClusterCall::Exec { .. }))
            .count()
    }

    /// Forget recorded calls, keeping the configured behaviour.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: ClusterCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ClusterControl for FakeCluster {
    async fn apply(&self, manifest: &str) -> ClusterResult<()> {
        self.record(ClusterCall::Apply(manifest.to_string()));
        let rejected = self
            .reject_apply
            .lock()
            .unwrap()
            .iter()
            .any(|needle| manifest.contains(needle.as_str()));
        if rejected {
            return Err(ClusterError::CommandFailed {
                command: "create -f manifest.yml".to_string(),
                output: "admission webhook denied the request".to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, manifest: &str) -> ClusterResult<()> {
        self.record(ClusterCall::Delete(manifest.to_string()));
        if *self.fail_delete.lock().unwrap() {
            return Err(ClusterError::CommandFailed {
                command: "delete -f manifest.yml".to_string(),
                output: "NotFound".to_string(),
            });
        }
        Ok(())
    }

    async fn pod_phase(&self, pod: &str) -> ClusterResult<PodPhase> {
        self.record(ClusterCall::PodPhase(pod.to_string()));
        if self.never_ready.lock().unwrap().contains(pod) {
            Ok(PodPhase::Pending)
        } else {
            Ok(PodPhase::Running)
        }
    }

    async fn annotation(&self, pod: &str, key: &str) -> ClusterResult<String> {
        self.record(ClusterCall::Annotation {
            pod: pod.to_string(),
            key: key.to_string(),
        });
        let configured = self
            .annotations
            .lock()
            .unwrap()
            .get(&(pod.to_string(), key.to_string()))
            .cloned();
        match configured {
            Some(value) => Ok(value),
            None if key == NETWORK_STATUS_ANNOTATION => Ok(DEFAULT_NETWORK_STATUS.to_string()),
            None => Ok(String::new()),
        }
    }

    async fn exec(&self, pod: &str, command: &[String]) -> ClusterResult<String> {
        self.record(ClusterCall::Exec {
            pod: pod.to_string(),
            command: command.to_vec(),
        });
        if let Some(output) = self.exec_error.lock().unwrap().clone() {
            return Err(ClusterError::CommandFailed {
                command: format!("exec -i {pod} -- {}", command.join(" ")),
                output,
            });
        }
        Ok("3 packets transmitted, 3 received, 0% packet loss".to_string())
    }
}
