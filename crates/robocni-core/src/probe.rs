//! Connectivity probe between the two test workloads.

use serde::Deserialize;
use tracing::info;

use crate::error::ProbeError;
use crate::settings::ProbeSettings;
use crate::traits::ClusterControl;

/// One entry of the Multus network-status annotation.
#[derive(Debug, Deserialize)]
struct NetworkStatus {
    #[serde(default, alias = "Interface")]
    interface: Option<String>,
    #[serde(default)]
    ips: Vec<String>,
}

/// First address of `interface` in a network-status annotation value.
///
/// Only the first entry for the interface is considered; if it carries no
/// address the lookup fails even when a later entry would match.
pub fn secondary_address(
    pod: &str,
    annotation: &str,
    interface: &str,
) -> Result<String, ProbeError> {
    let statuses: Vec<NetworkStatus> =
        serde_json::from_str(annotation).map_err(|e| ProbeError::InvalidAnnotation {
            pod: pod.to_string(),
            reason: e.to_string(),
        })?;

    statuses
        .into_iter()
        .find(|s| s.interface.as_deref() == Some(interface))
        .and_then(|s| s.ips.into_iter().next())
        .ok_or_else(|| ProbeError::AddressNotFound {
            pod: pod.to_string(),
            interface: interface.to_string(),
        })
}

/// Resolve `target`'s secondary address and ping it from `source`.
///
/// Returns the probed address.
pub async fn probe_connectivity(
    cluster: &dyn ClusterControl,
    settings: &ProbeSettings,
    source: &str,
    target: &str,
) -> Result<String, ProbeError> {
    let annotation = cluster
        .annotation(target, &settings.annotation_key)
        .await
        .map_err(|source| ProbeError::AnnotationUnavailable {
            pod: target.to_string(),
            source,
        })?;

    let address = secondary_address(target, &annotation, &settings.interface)?;
    info!(pod = %target, interface = %settings.interface, address = %address, "Resolved probe target");

    cluster
        .exec(source, &settings.command(&address))
        .await
        .map_err(|source| ProbeError::Unreachable {
            address: address.clone(),
            source,
        })?;

    Ok(address)
}
