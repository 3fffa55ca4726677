//! robocni-kube: cluster access through kubectl
//!
//! ## Key Components
//!
//! - `Kubectl`: implements `robocni_core::ClusterControl` with `tokio::process`
//! - `introspect_node_network`: captures a worker node's routes and links

mod error;
pub mod introspect;
pub mod kubectl;

pub use error::{IntrospectError, Result};
pub use introspect::{
    debugger_pod_name, introspect_node_network, select_worker_node, IntrospectionSettings,
};
pub use kubectl::{annotation_jsonpath, CommandOutput, Kubectl, DEFAULT_COMMAND_TIMEOUT};
