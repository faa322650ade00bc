use crate::tool::{require_str, DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};
use forgent_security::EnvGuard;

/// Reads a non-sensitive environment variable.
pub struct EnvReadTool {
    spec: ToolSpec,
}

impl EnvReadTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "env_read".to_string(),
                category: ToolCategory::Utility,
                description: "Read an environment variable. Secret-bearing names are refused.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Variable name"}
                    },
                    "required": ["name"]
                }),
                rate_limit: 20,
                danger_level: DangerLevel::Safe,
                timeout_secs: 30,
            },
        }
    }
}

impl Default for EnvReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for EnvReadTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &serde_json::Value, _safety: &SafetyKit) -> ToolOutcome {
        let name = match require_str(args, "name") {
            Ok(name) => name,
            Err(e) => return ToolOutcome::err(ToolErrorKind::InvalidArgs, e),
        };

        if let Err(reason) = EnvGuard::check(name) {
            return ToolOutcome::err(ToolErrorKind::SafetyBlocked, reason);
        }

        match std::env::var(name) {
            Ok(value) => ToolOutcome::ok(serde_json::json!({"name": name, "value": value})),
            Err(_) => ToolOutcome::ok(serde_json::json!({"name": name, "value": null})),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builtins::tests::test_safety;

    #[tokio::test]
    async fn test_blocks_secret_names() {
        let (safety, _dir) = test_safety();
        let tool = EnvReadTool::new();
        let outcome = tool
            .execute(&serde_json::json!({"name": "AWS_SECRET_ACCESS_KEY"}), &safety)
            .await;
        match outcome {
            ToolOutcome::Err { kind, .. } => assert_eq!(kind, ToolErrorKind::SafetyBlocked),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unset_variable_is_null() {
        let (safety, _dir) = test_safety();
        let tool = EnvReadTool::new();
        match tool
            .execute(
                &serde_json::json!({"name": "FORGENT_DEFINITELY_UNSET_VAR"}),
                &safety,
            )
            .await
        {
            ToolOutcome::Ok { value } => assert!(value["value"].is_null()),
            other => panic!("expected ok, got {other:?}"),
        }
    }
}
