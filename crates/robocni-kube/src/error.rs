//! Error types for robocni-kube

use robocni_core::{ClusterError, ReadinessError};
use thiserror::Error;

/// Errors raised while introspecting a worker node's network
#[derive(Error, Debug)]
pub enum IntrospectError {
    /// Every listed node carries the control-plane role
    #[error("no worker node found")]
    NoWorkerNode,

    /// `kubectl debug` output did not name a debugger pod
    #[error("could not find debugger pod name in output: {0}")]
    DebuggerPodNotFound(String),

    /// The debugger pod never reached `Running`
    #[error("debugger pod not ready: {0}")]
    NotReady(#[from] ReadinessError),

    /// Underlying kubectl failure
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// Result type for robocni-kube operations
pub type Result<T> = std::result::Result<T, IntrospectError>;
