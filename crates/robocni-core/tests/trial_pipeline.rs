//! End-to-end trial scenarios against the in-memory model and cluster.

use std::sync::Arc;
use std::time::Duration;

use robocni_core::fakes::{ClusterCall, FakeCluster, ScriptedModel};
use robocni_core::{
    render_network_attachment, render_test_pods, DeploymentError, Experiment, HintSet, Side,
    TrialOrchestrator, TrialSettings, TrialStatus, WorkloadSettings,
};
use tokio::time::Instant;

const REPLY: &str = "```{\"name\":\"cfg1\"}```";

fn hints() -> HintSet {
    HintSet::from_lines(["A", "B"]).unwrap()
}

fn orchestrator(model: Arc<ScriptedModel>, cluster: Arc<FakeCluster>) -> TrialOrchestrator {
    TrialOrchestrator::new(model, cluster, hints(), TrialSettings::default().with_seed(7))
}

fn config_manifest() -> String {
    render_network_attachment("cfg1", "{\"name\":\"cfg1\"}")
}

fn pods_manifest() -> String {
    render_test_pods("cfg1", &WorkloadSettings::default())
}

#[tokio::test(start_paused = true)]
async fn successful_trial_updates_used_hint() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster = Arc::new(FakeCluster::new());
    let mut orch = orchestrator(model.clone(), cluster.clone());
    let mut state = orch.new_state();

    let outcome = orch.run_trial(&mut state).await;
    state.stats.record(&outcome);

    assert_eq!(outcome.trial, 1);
    assert_eq!(
        outcome.status,
        TrialStatus::Success {
            config_name: "cfg1".to_string(),
            address: "192.168.50.3".to_string(),
        }
    );
    assert_eq!(model.calls(), 1);

    let used = &state.stats.hints()[outcome.hint_index];
    assert_eq!((used.runs, used.successes), (1, 1));
    let other = &state.stats.hints()[1 - outcome.hint_index];
    assert_eq!((other.runs, other.successes), (0, 0));
    assert_eq!(state.stats.run().total_errors, 0);

    assert_eq!(cluster.applied(), vec![config_manifest(), pods_manifest()]);
    assert_eq!(cluster.exec_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn left_pod_never_ready_times_out_without_probe() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster = Arc::new(FakeCluster::new().never_ready("testpod-left"));
    let mut orch = orchestrator(model, cluster.clone());
    let mut state = orch.new_state();

    let start = Instant::now();
    let outcome = orch.run_trial(&mut state).await;
    let waited = start.elapsed();
    state.stats.record(&outcome);

    assert!(
        matches!(outcome.status, TrialStatus::ReadinessTimeout { side: Side::Left, .. }),
        "unexpected outcome {:?}",
        outcome.status
    );
    assert!(waited >= Duration::from_secs(30) && waited < Duration::from_secs(31));

    let run = state.stats.run();
    assert_eq!(run.deployment_errors, 1);
    assert_eq!(run.readiness_timeouts, 1);
    assert_eq!(run.total_errors, 1);

    assert_eq!(cluster.phase_queries("testpod-right"), 0);
    assert!(!cluster
        .calls()
        .iter()
        .any(|c| matches!(c, ClusterCall::Annotation { .. } | ClusterCall::Exec { .. })));
}

#[tokio::test(start_paused = true)]
async fn right_pod_uses_its_own_deadline() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster = Arc::new(FakeCluster::new().never_ready("testpod-right"));
    let mut orch = orchestrator(model, cluster.clone());
    let mut state = orch.new_state();

    let start = Instant::now();
    let outcome = orch.run_trial(&mut state).await;

    assert!(matches!(
        outcome.status,
        TrialStatus::ReadinessTimeout { side: Side::Right, .. }
    ));
    // left is ready at the first poll (5s), then 15s for the right pod
    let waited = start.elapsed();
    assert!(waited >= Duration::from_secs(20) && waited < Duration::from_secs(21));
    assert_eq!(cluster.exec_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn rejected_config_stops_trial_and_is_not_cleaned_up() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster =
        Arc::new(FakeCluster::new().reject_apply_containing("kind: NetworkAttachmentDefinition"));
    let mut orch = orchestrator(model, cluster.clone());
    let mut state = orch.new_state();

    let outcome = orch.run_trial(&mut state).await;
    assert!(matches!(
        outcome.status,
        TrialStatus::DeploymentFailed(DeploymentError::ConfigRejected { ref name, .. }) if name == "cfg1"
    ));
    // defensive delete, then the rejected create; nothing after
    assert_eq!(
        cluster.calls(),
        vec![
            ClusterCall::Delete(config_manifest()),
            ClusterCall::Apply(config_manifest()),
        ]
    );
    assert!(!state.has_deployed_config());

    cluster.clear_calls();
    let outcome = orch.run_trial(&mut state).await;
    assert_eq!(outcome.trial, 2);
    // no pre-trial cleanup delete ahead of the defensive one
    assert_eq!(
        cluster.calls(),
        vec![
            ClusterCall::Delete(config_manifest()),
            ClusterCall::Apply(config_manifest()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn next_trial_removes_previous_workloads_then_config() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster = Arc::new(FakeCluster::new().failing_deletes());
    let mut orch = orchestrator(model, cluster.clone());
    let mut state = orch.new_state();

    let first = orch.run_trial(&mut state).await;
    assert!(first.status.is_success(), "delete failures must be ignored");
    assert!(state.has_deployed_config());

    cluster.clear_calls();
    let second = orch.run_trial(&mut state).await;
    assert!(second.status.is_success());

    let calls = cluster.calls();
    assert_eq!(calls[0], ClusterCall::Delete(pods_manifest()));
    assert_eq!(calls[1], ClusterCall::Delete(config_manifest()));
    assert_eq!(calls[2], ClusterCall::Delete(config_manifest()));
    assert_eq!(calls[3], ClusterCall::Apply(config_manifest()));
}

#[tokio::test(start_paused = true)]
async fn rejected_workloads_are_still_cleaned_up() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster = Arc::new(FakeCluster::new().reject_apply_containing("kind: Pod"));
    let mut orch = orchestrator(model, cluster.clone());
    let mut state = orch.new_state();

    let outcome = orch.run_trial(&mut state).await;
    assert!(matches!(
        outcome.status,
        TrialStatus::DeploymentFailed(DeploymentError::WorkloadsRejected { .. })
    ));
    assert_eq!(cluster.phase_queries("testpod-left"), 0);

    cluster.clear_calls();
    orch.run_trial(&mut state).await;
    let deleted = cluster.deleted();
    assert_eq!(deleted[0], pods_manifest());
    assert_eq!(deleted[1], config_manifest());
}

#[tokio::test(start_paused = true)]
async fn exhausted_generation_touches_no_cluster_state() {
    let model = Arc::new(ScriptedModel::always("I cannot help with that."));
    let cluster = Arc::new(FakeCluster::new());
    let mut orch = orchestrator(model.clone(), cluster.clone());
    let mut state = orch.new_state();

    let outcome = orch.run_trial(&mut state).await;
    state.stats.record(&outcome);

    assert!(matches!(outcome.status, TrialStatus::GenerationFailed(_)));
    assert_eq!(model.calls(), 5);
    assert!(cluster.calls().is_empty());
    assert_eq!(state.stats.run().generation_errors, 1);
    assert_eq!(state.stats.hints()[outcome.hint_index].runs, 1);
    assert_eq!(state.stats.hints()[outcome.hint_index].successes, 0);
}

#[tokio::test(start_paused = true)]
async fn probe_failure_is_counted_as_ping_error() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster = Arc::new(FakeCluster::new().failing_exec("3 packets transmitted, 0 received"));
    let mut orch = orchestrator(model, cluster);
    let mut state = orch.new_state();

    let outcome = orch.run_trial(&mut state).await;
    state.stats.record(&outcome);

    assert!(matches!(outcome.status, TrialStatus::ProbeFailed(_)));
    assert_eq!(state.stats.run().probe_errors, 1);
    assert_eq!(state.stats.run().total_errors, 1);
}

#[tokio::test(start_paused = true)]
async fn same_seed_selects_same_hints() {
    let mut picks = Vec::new();
    for _ in 0..2 {
        let model = Arc::new(ScriptedModel::always("nothing fenced"));
        let cluster = Arc::new(FakeCluster::new());
        let mut orch = TrialOrchestrator::new(
            model,
            cluster,
            HintSet::from_lines(["A", "B", "C", "D"]).unwrap(),
            TrialSettings::default().with_max_attempts(1).with_seed(42),
        );
        let mut state = orch.new_state();
        let mut run = Vec::new();
        for _ in 0..8 {
            run.push(orch.run_trial(&mut state).await.hint_index);
        }
        picks.push(run);
    }
    assert_eq!(picks[0], picks[1]);
    assert!(picks[0].iter().all(|&i| i < 4));
}

#[tokio::test(start_paused = true)]
async fn experiment_reports_between_trials_and_at_end() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster = Arc::new(FakeCluster::new());
    let mut experiment = Experiment::new(orchestrator(model, cluster));

    let mut out = Vec::new();
    let run = experiment.run(3, &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(run.total_trials, 3);
    assert_eq!(run.total_errors, 0);
    assert_eq!(text.matches("Run number:").count(), 3);
    assert!(text.contains("Run number: 1\n"));
    assert!(text.contains("Run number: 2\n"));
    assert!(text.contains("Run number: 3\n"));
    let last = text.rsplit("---\n").next().unwrap();
    assert!(last.starts_with("Run number: 3\n"));
    assert!(last.contains("Stats Array:\n"));

    let hints = experiment.stats().hints();
    assert_eq!(hints.iter().map(|h| h.runs).sum::<u64>(), 3);
    assert_eq!(hints.iter().map(|h| h.successes).sum::<u64>(), 3);
}

#[tokio::test]
async fn experiment_with_zero_runs_prints_empty_report() {
    let model = Arc::new(ScriptedModel::always(REPLY));
    let cluster = Arc::new(FakeCluster::new());
    let mut experiment = Experiment::new(orchestrator(model.clone(), cluster));

    let mut out = Vec::new();
    experiment.run(0, &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(text.matches("Run number:").count(), 1);
    assert!(text.contains("Total Errors: 0 (0.00%)"));
    assert_eq!(model.calls(), 0);
}
