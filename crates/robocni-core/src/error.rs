//! Error taxonomy for the trial pipeline.
//!
//! Generation-side errors (`TransportError`, `ExtractError`) are retryable and
//! absorbed by the generator. Everything from deployment onwards ends the
//! trial that produced it but never the run.

use std::time::Duration;

/// The generation service could not be reached or answered badly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("error performing POST request: {0}")]
    Unreachable(String),

    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("error reading response body: {0}")]
    Body(String),

    #[error("error decoding response fragment: {0}")]
    MalformedFragment(String),
}

/// The model reply did not contain a usable configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no valid backtick-enclosed text found")]
    NoCodeBlock,

    #[error("invalid JSON: {0}")]
    InvalidPayload(String),

    #[error("name field not found or not a string")]
    MissingName,
}

/// Why a single generation attempt was discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure {
    #[error("query failed: {0}")]
    Transport(#[from] TransportError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

/// Terminal failure of the generator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no valid configuration after {attempts} attempts, last failure: {last}")]
    ExhaustedRetries { attempts: u32, last: AttemptFailure },
}

/// Failure reported by the cluster control-plane adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    #[error("failed to launch {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("command '{command}' failed: {output}")]
    CommandFailed { command: String, output: String },

    #[error("failed to stage manifest: {0}")]
    Manifest(String),

    #[error("command '{command}' timed out after {after:?}")]
    TimedOut { command: String, after: Duration },
}

/// A manifest was rejected by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeploymentError {
    #[error("configuration '{name}' rejected: {source}")]
    ConfigRejected {
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("test workloads rejected: {source}")]
    WorkloadsRejected {
        #[source]
        source: ClusterError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadinessError {
    #[error("timeout waiting for pod '{pod}' to be ready after {waited:?}")]
    Timeout { pod: String, waited: Duration },
}

/// The connectivity probe between the two workloads failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("could not read network-status of '{pod}': {source}")]
    AnnotationUnavailable {
        pod: String,
        #[source]
        source: ClusterError,
    },

    #[error("failed to parse network-status JSON of '{pod}': {reason}")]
    InvalidAnnotation { pod: String, reason: String },

    #[error("no IP found for {interface} on '{pod}'")]
    AddressNotFound { pod: String, interface: String },

    #[error("failed to ping {address}: {source}")]
    Unreachable {
        address: String,
        #[source]
        source: ClusterError,
    },
}

/// Errors outside of a single trial (setup and report output).
#[derive(Debug, thiserror::Error)]
pub enum RobocniError {
    #[error("hint source '{0}' contains no hints")]
    NoHints(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RobocniError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_retries_carries_last_failure() {
        let err = GenerationError::ExhaustedRetries {
            attempts: 5,
            last: AttemptFailure::Extract(ExtractError::MissingName),
        };
        let msg = err.to_string();
        assert!(msg.contains("5 attempts"));
        assert!(msg.contains("name field not found"));
    }

    #[test]
    fn test_probe_error_variants_are_distinct() {
        let missing = ProbeError::AddressNotFound {
            pod: "testpod-right".to_string(),
            interface: "net1".to_string(),
        };
        let invalid = ProbeError::InvalidAnnotation {
            pod: "testpod-right".to_string(),
            reason: "expected value".to_string(),
        };
        assert_ne!(missing, invalid);
        assert!(missing.to_string().contains("no IP found for net1"));
        assert!(invalid.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_deployment_error_exposes_source() {
        use std::error::Error as _;

        let err = DeploymentError::ConfigRejected {
            name: "cfg1".to_string(),
            source: ClusterError::CommandFailed {
                command: "create -f /tmp/x.yml".to_string(),
                output: "already exists".to_string(),
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("cfg1"));
    }
}
