//! `ClusterControl` implemented by shelling out to `kubectl`.
//!
//! Manifests are staged in a temporary file and submitted with
//! `create -f` / `delete -f`, so creating an object that already exists is
//! an error rather than an update.

use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use robocni_core::{ClusterControl, ClusterError, ClusterResult, PodPhase};
use tokio::process::Command;
use tracing::debug;

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Result of one kubectl invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code (-1 when killed by a signal).
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout and stderr joined, for error reports.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }
}

/// kubectl wrapper
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: String,
    namespace: Option<String>,
    timeout: Duration,
}

impl Default for Kubectl {
    fn default() -> Self {
        Kubectl {
            binary: "kubectl".to_string(),
            namespace: None,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}

impl Kubectl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable (e.g. `oc` or a wrapper script).
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn full_args(&self, args: &[String]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(ns) = &self.namespace {
            full.push("-n".to_string());
            full.push(ns.clone());
        }
        full.extend(args.iter().cloned());
        full
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    /// Run kubectl with `args` and capture its output, whatever the exit code.
    pub async fn run(&self, args: &[String]) -> ClusterResult<CommandOutput> {
        let args = self.full_args(args);
        let start = Instant::now();
        debug!(command = %self.describe(&args), "Running kubectl");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClusterError::Spawn {
                program: self.binary.clone(),
                reason: e.to_string(),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ClusterError::TimedOut {
                command: self.describe(&args),
                after: self.timeout,
            })?
            .map_err(|e| ClusterError::Spawn {
                program: self.binary.clone(),
                reason: e.to_string(),
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Run kubectl and return stdout, failing on a non-zero exit.
    pub async fn run_checked(&self, args: &[String]) -> ClusterResult<String> {
        let output = self.run(args).await?;
        if !output.success() {
            return Err(ClusterError::CommandFailed {
                command: self.describe(&self.full_args(args)),
                output: output.combined(),
            });
        }
        Ok(output.stdout)
    }

    async fn submit_manifest(&self, verb: &str, manifest: &str) -> ClusterResult<()> {
        let mut file = tempfile::Builder::new()
            .prefix("robocni-")
            .suffix(".yml")
            .tempfile()
            .map_err(|e| ClusterError::Manifest(e.to_string()))?;
        file.write_all(manifest.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| ClusterError::Manifest(e.to_string()))?;

        let path = file.path().display().to_string();
        self.run_checked(&args([verb, "-f", &path])).await?;
        Ok(())
    }
}

/// JSONPath selecting annotation `key`; dots inside the key are escaped.
pub fn annotation_jsonpath(key: &str) -> String {
    format!("{{.metadata.annotations.{}}}", key.replace('.', "\\."))
}

fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl ClusterControl for Kubectl {
    async fn apply(&self, manifest: &str) -> ClusterResult<()> {
        self.submit_manifest("create", manifest).await
    }

    async fn delete(&self, manifest: &str) -> ClusterResult<()> {
        self.submit_manifest("delete", manifest).await
    }

    async fn pod_phase(&self, pod: &str) -> ClusterResult<PodPhase> {
        let stdout = self
            .run_checked(&args(["get", "pod", pod, "-o", "jsonpath={.status.phase}"]))
            .await?;
        Ok(PodPhase::parse(&stdout))
    }

    async fn annotation(&self, pod: &str, key: &str) -> ClusterResult<String> {
        let jsonpath = format!("jsonpath={}", annotation_jsonpath(key));
        self.run_checked(&args(["get", "pod", pod, "-o", &jsonpath]))
            .await
    }

    async fn exec(&self, pod: &str, command: &[String]) -> ClusterResult<String> {
        let mut full = args(["exec", "-i", pod, "--"]);
        full.extend(command.iter().cloned());
        self.run_checked(&full).await
    }
}
