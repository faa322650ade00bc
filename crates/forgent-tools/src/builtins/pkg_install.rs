use crate::tool::{require_str, truncate_output, DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

#[allow(clippy::unwrap_used)]
fn package_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9@][A-Za-z0-9_@/.+-]*$").unwrap()
    })
}

/// Installs a package through a known package manager.
pub struct PkgInstallTool {
    spec: ToolSpec,
}

impl PkgInstallTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "pkg_install".to_string(),
                category: ToolCategory::Pkg,
                description: "Install a package with npm, pip, or cargo.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "manager": {"type": "string", "enum": ["npm", "pip", "cargo"]},
                        "package": {"type": "string", "description": "Package name"}
                    },
                    "required": ["manager", "package"]
                }),
                rate_limit: 10,
                danger_level: DangerLevel::Modify,
                timeout_secs: 120,
            },
        }
    }
}

impl Default for PkgInstallTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for PkgInstallTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome {
        let manager = match require_str(args, "manager") {
            Ok(manager) => manager,
            Err(e) => return ToolOutcome::err(ToolErrorKind::InvalidArgs, e),
        };
        let package = match require_str(args, "package") {
            Ok(package) => package,
            Err(e) => return ToolOutcome::err(ToolErrorKind::InvalidArgs, e),
        };

        if !package_name_re().is_match(package) {
            return ToolOutcome::err(
                ToolErrorKind::InvalidArgs,
                format!("suspicious package name '{package}'"),
            );
        }

        let command = match manager {
            "npm" => format!("npm install {package}"),
            "pip" => format!("pip install {package}"),
            "cargo" => format!("cargo add {package}"),
            other => {
                return ToolOutcome::err(
                    ToolErrorKind::InvalidArgs,
                    format!("unknown package manager '{other}'"),
                )
            }
        };

        if let Err(reason) = safety.commands.check(&command) {
            return ToolOutcome::err(ToolErrorKind::SafetyBlocked, reason);
        }

        info!(manager = %manager, package = %package, "Installing package");

        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(&safety.workspace)
            .output()
            .await;

        match output {
            Ok(output) => ToolOutcome::ok(serde_json::json!({
                "command": command,
                "exit_code": output.status.code().unwrap_or(-1),
                "stdout": truncate_output(&String::from_utf8_lossy(&output.stdout), 10_000),
                "stderr": truncate_output(&String::from_utf8_lossy(&output.stderr), 10_000),
            })),
            Err(e) => ToolOutcome::err(ToolErrorKind::Io, format!("cannot spawn installer: {e}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builtins::tests::test_safety;

    #[tokio::test]
    async fn test_rejects_shell_metacharacters() {
        let (safety, _dir) = test_safety();
        let tool = PkgInstallTool::new();
        let outcome = tool
            .execute(
                &serde_json::json!({"manager": "pip", "package": "requests; rm -rf /"}),
                &safety,
            )
            .await;
        match outcome {
            ToolOutcome::Err { kind, .. } => assert_eq!(kind, ToolErrorKind::InvalidArgs),
            other => panic!("expected invalid args, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_unknown_manager() {
        let (safety, _dir) = test_safety();
        let tool = PkgInstallTool::new();
        let outcome = tool
            .execute(
                &serde_json::json!({"manager": "brew", "package": "requests"}),
                &safety,
            )
            .await;
        assert!(!outcome.is_ok());
    }
}
