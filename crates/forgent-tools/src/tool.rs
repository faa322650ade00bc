use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolOutcome};
use forgent_security::{CommandGuard, PathGuard, RateLimiter};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How much damage a tool can do when misused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerLevel {
    /// Read-only.
    Safe,
    /// Writes inside the workspace.
    Modify,
    /// Runs arbitrary processes or installs packages.
    Destructive,
}

/// Static description of a registered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name.
    pub name: String,
    /// Category, checked against the caller's allowlist.
    pub category: ToolCategory,
    /// Human-readable description shown to the reasoning backend.
    pub description: String,
    /// JSON schema of the accepted arguments.
    pub arg_schema: serde_json::Value,
    /// Per-session invocation limit.
    pub rate_limit: u32,
    /// Damage classification.
    pub danger_level: DangerLevel,
    /// Timeout applied by the registry.
    pub timeout_secs: u64,
}

/// Safety guards shared by every tool invocation.
pub struct SafetyKit {
    /// Workspace path confinement.
    pub paths: PathGuard,
    /// Shell-command denylist.
    pub commands: CommandGuard,
    /// Per-session invocation counters.
    pub limiter: RateLimiter,
    /// The workspace root commands run in.
    pub workspace: PathBuf,
}

/// A callable tool. Implementations return tool-surface failures as
/// [`ToolOutcome::Err`] values; the native error channel is reserved
/// for infrastructure faults.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's static description.
    fn spec(&self) -> &ToolSpec;

    /// Executes the tool. Validation failures must not leave partial
    /// effects.
    async fn execute(&self, args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome;
}

/// Extracts a required string argument.
pub(crate) fn require_str<'a>(
    args: &'a serde_json::Value,
    key: &str,
) -> Result<&'a str, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing required string argument '{key}'"))
}

/// Truncates tool output so observations stay bounded.
pub(crate) fn truncate_output(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} total bytes]", &s[..end], s.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_str() {
        let args = serde_json::json!({"path": "a.txt", "empty": ""});
        assert_eq!(require_str(&args, "path"), Ok("a.txt"));
        assert!(require_str(&args, "missing").is_err());
        assert!(require_str(&args, "empty").is_err());
    }

    #[test]
    fn test_truncate_output() {
        assert_eq!(truncate_output("short", 10), "short");
        let truncated = truncate_output(&"x".repeat(100), 10);
        assert!(truncated.starts_with("xxxxxxxxxx..."));
        assert!(truncated.contains("100 total bytes"));
    }
}
