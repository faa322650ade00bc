use crate::classify::{classify, stderr_tail, Classification};
use forgent_core::ForgentResult;
use forgent_tools::SafetyKit;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Ports tried when the original one is taken.
const PORT_CANDIDATES: &[u16] = &[3001, 3456, 4000, 5001, 8001, 8081, 9000];

/// How a healed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The process exited zero.
    Success,
    /// The failure was classified as unrecoverable.
    Fatal,
    /// Remedies kept failing until the attempt cap.
    Exhausted,
}

/// The outcome of [`HealingRunner::run_with_healing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Final status.
    pub status: RunStatus,
    /// Launch attempts made (≥ 1).
    pub attempts: u32,
    /// Remedies applied between attempts, in order.
    pub remedies: Vec<String>,
    /// Structured diagnostics for the caller.
    pub diagnostics: Vec<String>,
}

/// Launches a user-project process, watches its output, and applies
/// surgical remedies between attempts.
///
/// Remedies run under the same command denylist as every other shell
/// invocation. Port rebinding is deterministic per run id.
pub struct HealingRunner {
    safety: Arc<SafetyKit>,
    run_id: Uuid,
}

impl HealingRunner {
    /// Creates a runner bound to a run id (the port-selection seed).
    pub fn new(safety: Arc<SafetyKit>, run_id: Uuid) -> Self {
        Self { safety, run_id }
    }

    /// Runs `command`, classifying each non-zero exit and healing when
    /// a remedy exists, up to `max_attempts` launches.
    pub async fn run_with_healing(
        &self,
        command: &str,
        env: &BTreeMap<String, String>,
        max_attempts: u32,
    ) -> ForgentResult<RunResult> {
        let mut env = env.clone();
        let mut remedies = Vec::new();
        let mut diagnostics = Vec::new();
        let mut unknown_retried = false;

        if let Err(reason) = self.safety.commands.check(command) {
            return Ok(RunResult {
                status: RunStatus::Fatal,
                attempts: 0,
                remedies,
                diagnostics: vec![format!("command blocked: {reason}")],
            });
        }

        for attempt in 1..=max_attempts.max(1) {
            info!(attempt, command = %command, "Launching process");
            let output = tokio::process::Command::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(&self.safety.workspace)
                .envs(&env)
                .output()
                .await?;

            if output.status.success() {
                return Ok(RunResult {
                    status: RunStatus::Success,
                    attempts: attempt,
                    remedies,
                    diagnostics,
                });
            }

            let stderr = String::from_utf8_lossy(&output.stderr);
            let classification = classify(&stderr);
            warn!(attempt, classification = ?classification, "Process failed");

            match classification {
                Classification::MissingPyModule(module) => {
                    let remedy = format!("pip install {module}");
                    self.apply_remedy(&remedy, &env, &mut diagnostics).await;
                    remedies.push(remedy);
                }
                Classification::MissingNodeModule(module) => {
                    let remedy = format!("npm install {module}");
                    self.apply_remedy(&remedy, &env, &mut diagnostics).await;
                    remedies.push(remedy);
                }
                Classification::PortInUse => {
                    let port = self.pick_port(remedies.len());
                    diagnostics.push(format!("rebinding to port {port}"));
                    remedies.push(format!("rebind-port:{port}"));
                    env.insert("PORT".to_string(), port.to_string());
                }
                Classification::SyntaxError => {
                    diagnostics.push(format!(
                        "syntax error is not retryable: {}",
                        stderr_tail(&stderr).lines().last().unwrap_or("")
                    ));
                    return Ok(RunResult {
                        status: RunStatus::Fatal,
                        attempts: attempt,
                        remedies,
                        diagnostics,
                    });
                }
                Classification::Unknown => {
                    if unknown_retried {
                        diagnostics.push("unclassified failure persisted after retry".to_string());
                        return Ok(RunResult {
                            status: RunStatus::Fatal,
                            attempts: attempt,
                            remedies,
                            diagnostics,
                        });
                    }
                    unknown_retried = true;
                    diagnostics.push("unclassified failure, retrying once".to_string());
                }
            }
        }

        diagnostics.push(format!(
            "gave up after {} attempts; remedies applied: [{}]",
            max_attempts.max(1),
            remedies.join(", ")
        ));
        Ok(RunResult {
            status: RunStatus::Exhausted,
            attempts: max_attempts.max(1),
            remedies,
            diagnostics,
        })
    }

    /// Runs a remedy command, best effort. The relaunch still happens
    /// when the remedy itself fails; the failure is recorded.
    async fn apply_remedy(
        &self,
        remedy: &str,
        env: &BTreeMap<String, String>,
        diagnostics: &mut Vec<String>,
    ) {
        if let Err(reason) = self.safety.commands.check(remedy) {
            diagnostics.push(format!("remedy blocked: {reason}"));
            return;
        }
        info!(remedy = %remedy, "Applying remedy");
        match tokio::process::Command::new("sh")
            .arg("-c")
            .arg(remedy)
            .current_dir(&self.safety.workspace)
            .envs(env)
            .output()
            .await
        {
            Ok(output) if output.status.success() => {}
            Ok(output) => diagnostics.push(format!(
                "remedy '{remedy}' exited {}",
                output.status.code().unwrap_or(-1)
            )),
            Err(e) => diagnostics.push(format!("remedy '{remedy}' failed to spawn: {e}")),
        }
    }

    /// Deterministically picks a free candidate port. The starting
    /// index is seeded by the run id; `offset` advances on repeated
    /// rebinds.
    fn pick_port(&self, offset: usize) -> u16 {
        let mut hasher = Sha256::new();
        hasher.update(self.run_id.as_bytes());
        let digest = hasher.finalize();
        let seed = usize::from(digest[0]);

        for probe in 0..PORT_CANDIDATES.len() {
            let idx = (seed + offset + probe) % PORT_CANDIDATES.len();
            let port = PORT_CANDIDATES[idx];
            if std::net::TcpListener::bind(("127.0.0.1", port)).is_ok() {
                return port;
            }
        }
        PORT_CANDIDATES[seed % PORT_CANDIDATES.len()]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use forgent_security::{CommandGuard, PathGuard, RateLimiter};
    use tempfile::TempDir;

    fn runner() -> (HealingRunner, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let safety = Arc::new(SafetyKit {
            paths: PathGuard::new(dir.path()).unwrap(),
            commands: CommandGuard::new(),
            limiter: RateLimiter::new(),
            workspace: dir.path().to_path_buf(),
        });
        (HealingRunner::new(safety, Uuid::new_v4()), dir)
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let (runner, _dir) = runner();
        let result = runner
            .run_with_healing("true", &BTreeMap::new(), 5)
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.attempts, 1);
        assert!(result.remedies.is_empty());
    }

    #[tokio::test]
    async fn test_missing_module_healed() {
        let (runner, dir) = runner();

        // A fake `pip` on PATH drops a marker; the main script fails
        // with a module error until the marker exists.
        let bin = dir.path().join("fakebin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("pip"), "#!/bin/sh\ntouch installed\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(bin.join("pip"), std::fs::Permissions::from_mode(0o755))
                .unwrap();
        }
        std::fs::write(
            dir.path().join("main.sh"),
            "if [ -f installed ]; then exit 0; fi\n\
             echo \"ModuleNotFoundError: No module named 'requests'\" >&2\n\
             exit 1\n",
        )
        .unwrap();

        let mut env = BTreeMap::new();
        let path = std::env::var("PATH").unwrap_or_default();
        env.insert("PATH".to_string(), format!("{}:{path}", bin.display()));

        let result = runner
            .run_with_healing("sh main.sh", &env, 5)
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Success, "{:?}", result.diagnostics);
        assert_eq!(result.attempts, 2);
        assert_eq!(result.remedies, vec!["pip install requests".to_string()]);
    }

    #[tokio::test]
    async fn test_port_conflict_rebinds() {
        let (runner, dir) = runner();
        // Fails until PORT is injected.
        std::fs::write(
            dir.path().join("serve.sh"),
            "if [ -n \"$PORT\" ]; then exit 0; fi\n\
             echo 'Error: listen EADDRINUSE :::3000' >&2\n\
             exit 1\n",
        )
        .unwrap();

        let result = runner
            .run_with_healing("sh serve.sh", &BTreeMap::new(), 5)
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.attempts, 2);
        assert!(result.remedies[0].starts_with("rebind-port:"));
    }

    #[tokio::test]
    async fn test_syntax_error_fatal() {
        let (runner, _dir) = runner();
        let result = runner
            .run_with_healing(
                "echo 'SyntaxError: invalid syntax' >&2; exit 1",
                &BTreeMap::new(),
                5,
            )
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Fatal);
        assert_eq!(result.attempts, 1);
        assert!(result.remedies.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_retried_once_then_fatal() {
        let (runner, _dir) = runner();
        let result = runner
            .run_with_healing("exit 7", &BTreeMap::new(), 5)
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Fatal);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_attempt_cap() {
        let (runner, dir) = runner();

        // A fake `npm` that never helps, so every relaunch fails the
        // same way until the cap.
        let bin = dir.path().join("fakebin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("npm"), "#!/bin/sh\nexit 1\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(bin.join("npm"), std::fs::Permissions::from_mode(0o755))
                .unwrap();
        }
        let mut env = BTreeMap::new();
        let path = std::env::var("PATH").unwrap_or_default();
        env.insert("PATH".to_string(), format!("{}:{path}", bin.display()));

        let result = runner
            .run_with_healing("echo \"Cannot find module 'ghost'\" >&2; exit 1", &env, 3)
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Exhausted);
        assert_eq!(result.attempts, 3);
        assert_eq!(result.remedies.len(), 3);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| d.contains("gave up after 3 attempts")));
    }

    #[tokio::test]
    async fn test_blocked_command_never_launches() {
        let (runner, _dir) = runner();
        let result = runner
            .run_with_healing("rm -rf /", &BTreeMap::new(), 5)
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Fatal);
        assert_eq!(result.attempts, 0);
    }

    #[test]
    fn test_port_choice_deterministic_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let safety = Arc::new(SafetyKit {
            paths: PathGuard::new(dir.path()).unwrap(),
            commands: CommandGuard::new(),
            limiter: RateLimiter::new(),
            workspace: dir.path().to_path_buf(),
        });
        let run_id = Uuid::new_v4();
        let a = HealingRunner::new(safety.clone(), run_id).pick_port(0);
        let b = HealingRunner::new(safety, run_id).pick_port(0);
        assert_eq!(a, b);
    }
}
