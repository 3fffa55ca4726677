//! Capture a worker node's routes and links for the generation prompt.
//!
//! A node debugger pod is launched on the first worker node; the host's
//! `ip route` and `ip link show` are read through `chroot /host`.

use std::time::Duration;

use regex::Regex;
use robocni_core::readiness::wait_until_running;
use robocni_core::{ClusterControl, HostContext};
use tracing::{debug, info};

use crate::error::{IntrospectError, Result};
use crate::kubectl::Kubectl;

/// Debugger pod parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrospectionSettings {
    pub image: String,
    /// Lifetime of the debugger pod's `sleep`
    pub lifetime_secs: u64,
    pub ready_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for IntrospectionSettings {
    fn default() -> Self {
        IntrospectionSettings {
            image: "fedora".to_string(),
            lifetime_secs: 500,
            ready_timeout: Duration::from_secs(5 * 60),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// First node in `kubectl get nodes --no-headers` output without the control-plane role.
pub fn select_worker_node(listing: &str) -> Option<String> {
    listing
        .lines()
        .filter(|line| !line.contains("control-plane"))
        .find_map(|line| line.split_whitespace().next())
        .map(str::to_string)
}

/// Debugger pod name announced by `kubectl debug node/...`.
pub fn debugger_pod_name(output: &str) -> Option<String> {
    let re = Regex::new(r"node-debugger-\S+").ok()?;
    re.find(output).map(|m| m.as_str().to_string())
}

/// Introspect the first worker node's host network.
///
/// The debugger pod is removed afterwards on a best-effort basis; it also
/// exits on its own after `lifetime_secs`.
pub async fn introspect_node_network(
    kubectl: &Kubectl,
    settings: &IntrospectionSettings,
) -> Result<HostContext> {
    let listing = kubectl
        .run_checked(&["get".to_string(), "nodes".to_string(), "--no-headers".to_string()])
        .await?;
    let node = select_worker_node(&listing).ok_or(IntrospectError::NoWorkerNode)?;
    info!(node = %node, "Launching debugger pod");

    let launched = kubectl
        .run_checked(&[
            "debug".to_string(),
            format!("node/{node}"),
            format!("--image={}", settings.image),
            "--".to_string(),
            "sleep".to_string(),
            settings.lifetime_secs.to_string(),
        ])
        .await?;
    let pod = debugger_pod_name(&launched)
        .ok_or_else(|| IntrospectError::DebuggerPodNotFound(launched.trim().to_string()))?;
    info!(pod = %pod, "Debugger pod launched");

    let captured = capture_host_network(kubectl, &pod, settings).await;

    let cleanup = kubectl
        .run_checked(&[
            "delete".to_string(),
            "pod".to_string(),
            pod.clone(),
            "--wait=false".to_string(),
        ])
        .await;
    if let Err(e) = cleanup {
        debug!(pod = %pod, error = %e, "Debugger pod cleanup failed");
    }

    captured
}

async fn capture_host_network(
    kubectl: &Kubectl,
    pod: &str,
    settings: &IntrospectionSettings,
) -> Result<HostContext> {
    wait_until_running(kubectl, pod, settings.poll_interval, settings.ready_timeout).await?;

    let host_command = |cmd: &[&str]| -> Vec<String> {
        ["chroot", "/host"]
            .iter()
            .chain(cmd.iter())
            .map(|s| s.to_string())
            .collect()
    };
    let routes = kubectl.exec(pod, &host_command(&["ip", "route"])).await?;
    let links = kubectl
        .exec(pod, &host_command(&["ip", "link", "show"]))
        .await?;
    info!(
        route_bytes = routes.len(),
        link_bytes = links.len(),
        "Captured host network"
    );

    Ok(HostContext::new(Some(routes), Some(links)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODES: &str = "\
kind-control-plane   Ready    control-plane   12d   v1.29.2
kind-worker          Ready    <none>          12d   v1.29.2
kind-worker2         Ready    <none>          12d   v1.29.2
";

    #[test]
    fn test_select_first_worker() {
        assert_eq!(select_worker_node(NODES).as_deref(), Some("kind-worker"));
    }

    #[test]
    fn test_no_worker() {
        let only_cp = "kind-control-plane   Ready    control-plane   12d   v1.29.2\n";
        assert_eq!(select_worker_node(only_cp), None);
        assert_eq!(select_worker_node(""), None);
        assert_eq!(select_worker_node("\n\n"), None);
    }

    #[test]
    fn test_debugger_pod_name() {
        let output = "Creating debugging pod node-debugger-kind-worker-x7k2p with container debugger on node kind-worker.\n";
        assert_eq!(
            debugger_pod_name(output).as_deref(),
            Some("node-debugger-kind-worker-x7k2p")
        );
        assert_eq!(debugger_pod_name("error: nodes \"x\" not found"), None);
    }

    #[test]
    fn test_default_settings() {
        let settings = IntrospectionSettings::default();
        assert_eq!(settings.image, "fedora");
        assert_eq!(settings.lifetime_secs, 500);
        assert_eq!(settings.ready_timeout, Duration::from_secs(300));
    }
}
