//! Readiness polling for test workloads.
//!
//! The control plane only answers point-in-time status queries, so readiness
//! is a poll on a fixed interval raced against a deadline. The first poll
//! happens one interval after the wait starts.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::ReadinessError;
use crate::traits::ClusterControl;

/// Block until `pod` reports `Running` or `deadline` elapses.
///
/// A failed status query counts as "not ready yet".
pub async fn wait_until_running(
    cluster: &dyn ClusterControl,
    pod: &str,
    poll_interval: Duration,
    deadline: Duration,
) -> Result<(), ReadinessError> {
    let poll = async {
        let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match cluster.pod_phase(pod).await {
                Ok(phase) if phase.is_running() => return,
                Ok(phase) => debug!(pod = %pod, phase = %phase, "Pod not ready yet"),
                Err(e) => warn!(pod = %pod, error = %e, "Error getting pod status"),
            }
        }
    };

    match tokio::time::timeout(deadline, poll).await {
        Ok(()) => {
            info!(pod = %pod, "Pod is ready");
            Ok(())
        }
        Err(_) => Err(ReadinessError::Timeout {
            pod: pod.to_string(),
            waited: deadline,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::FakeCluster;

    #[tokio::test(start_paused = true)]
    async fn test_ready_pod_returns_after_first_interval() {
        let cluster = FakeCluster::new();
        let start = Instant::now();
        wait_until_running(&cluster, "p", Duration::from_secs(5), Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(cluster.phase_queries("p"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_ready_times_out_at_deadline() {
        let cluster = FakeCluster::new().never_ready("p");
        let start = Instant::now();
        let err = wait_until_running(&cluster, "p", Duration::from_secs(5), Duration::from_secs(15))
            .await
            .unwrap_err();
        assert_eq!(start.elapsed(), Duration::from_secs(15));
        assert_eq!(
            err,
            ReadinessError::Timeout {
                pod: "p".to_string(),
                waited: Duration::from_secs(15),
            }
        );
        // polls at 5s and 10s, possibly also at 15s
        let polls = cluster.phase_queries("p");
        assert!((2..=3).contains(&polls), "unexpected poll count {polls}");
    }
}
