//! Manifest rendering for the configuration object and the test workloads.

use crate::settings::{WorkloadSettings, NETWORKS_ANNOTATION};

/// Render a NetworkAttachmentDefinition carrying `config_text` as its CNI config.
pub fn render_network_attachment(name: &str, config_text: &str) -> String {
    let mut manifest = format!(
        "apiVersion: \"k8s.cni.cncf.io/v1\"\n\
         kind: NetworkAttachmentDefinition\n\
         metadata:\n  name: {name}\n\
         spec:\n  config: |\n"
    );
    for line in config_text.trim().lines() {
        manifest.push_str("    ");
        manifest.push_str(line);
        manifest.push('\n');
    }
    manifest
}

/// Render the left and right test pods attached to network `config_name`.
pub fn render_test_pods(config_name: &str, workloads: &WorkloadSettings) -> String {
    [&workloads.left, &workloads.right]
        .iter()
        .map(|pod| render_pod(pod, config_name, &workloads.image))
        .collect::<Vec<_>>()
        .join("")
}

fn render_pod(pod: &str, config_name: &str, image: &str) -> String {
    format!(
        "---\n\
         apiVersion: v1\n\
         kind: Pod\n\
         metadata:\n  name: {pod}\n  annotations:\n    {NETWORKS_ANNOTATION}: {config_name}\n\
         spec:\n  containers:\n  - name: {pod}\n    image: {image}\n    \
         command: [\"/bin/sh\", \"-c\", \"trap : TERM INT; sleep infinity & wait\"]\n"
    )
}
