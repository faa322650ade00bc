use serde::{Deserialize, Serialize};

/// The category a tool belongs to. Agents receive a category allowlist;
/// tools outside it are invisible to the reasoning loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    /// File access, command execution, and task termination.
    Core,
    /// Version-control operations.
    Git,
    /// Package-manager operations.
    Pkg,
    /// Test execution.
    Test,
    /// Search, environment reads, directory creation.
    Utility,
}

impl std::str::FromStr for ToolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "core" => Ok(ToolCategory::Core),
            "git" => Ok(ToolCategory::Git),
            "pkg" => Ok(ToolCategory::Pkg),
            "test" => Ok(ToolCategory::Test),
            "utility" => Ok(ToolCategory::Utility),
            other => Err(format!("unknown tool category: {other}")),
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ToolCategory::Core => "core",
            ToolCategory::Git => "git",
            ToolCategory::Pkg => "pkg",
            ToolCategory::Test => "test",
            ToolCategory::Utility => "utility",
        };
        write!(f, "{s}")
    }
}

/// A request to invoke a specific tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke.
    pub name: String,
    /// JSON arguments to pass to the tool.
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Creates a tool call.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The kind of a tool-surface failure.
///
/// These never travel on the [`crate::ForgentError`] channel — the
/// reasoning loop receives them as observations and continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolErrorKind {
    /// The tool is outside the caller's category allowlist.
    Denied,
    /// Arguments failed schema validation.
    InvalidArgs,
    /// The per-session rate limit was exhausted.
    RateLimitExceeded,
    /// A safety filter blocked the invocation.
    SafetyBlocked,
    /// The underlying I/O operation failed.
    Io,
    /// The tool exceeded its timeout.
    Timeout,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ToolErrorKind::Denied => "tool-denied",
            ToolErrorKind::InvalidArgs => "tool-invalid-args",
            ToolErrorKind::RateLimitExceeded => "tool-rate-limit-exceeded",
            ToolErrorKind::SafetyBlocked => "tool-safety-blocked",
            ToolErrorKind::Io => "tool-io",
            ToolErrorKind::Timeout => "tool-timeout",
        };
        write!(f, "{s}")
    }
}

/// The result of a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    /// The tool ran to completion.
    Ok {
        /// The tool's JSON output.
        value: serde_json::Value,
    },
    /// The invocation failed. No partial effects were applied on
    /// validation failures.
    Err {
        /// The failure kind.
        kind: ToolErrorKind,
        /// Human-readable detail.
        message: String,
    },
}

impl ToolOutcome {
    /// Creates a successful outcome.
    pub fn ok(value: serde_json::Value) -> Self {
        Self::Ok { value }
    }

    /// Creates a failed outcome.
    pub fn err(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self::Err {
            kind,
            message: message.into(),
        }
    }

    /// Whether the invocation succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Renders the outcome as observation text for the reasoning loop.
    pub fn as_observation(&self) -> String {
        match self {
            Self::Ok { value } => value.to_string(),
            Self::Err { kind, message } => format!("{kind}: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_round_trip() {
        for name in ["core", "git", "pkg", "test", "utility"] {
            let cat = ToolCategory::from_str(name).unwrap();
            assert_eq!(cat.to_string(), name);
        }
        assert!(ToolCategory::from_str("network").is_err());
    }

    #[test]
    fn test_outcome_observation() {
        let ok = ToolOutcome::ok(serde_json::json!({"lines": 3}));
        assert!(ok.is_ok());
        assert!(ok.as_observation().contains("lines"));

        let err = ToolOutcome::err(ToolErrorKind::RateLimitExceeded, "read_file exhausted");
        assert!(!err.is_ok());
        assert!(err.as_observation().starts_with("tool-rate-limit-exceeded"));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ToolErrorKind::Denied.to_string(), "tool-denied");
        assert_eq!(ToolErrorKind::SafetyBlocked.to_string(), "tool-safety-blocked");
    }
}
