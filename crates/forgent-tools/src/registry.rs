use crate::tool::{SafetyKit, Tool, ToolSpec};
use forgent_core::{ToolCall, ToolCategory, ToolErrorKind, ToolOutcome};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Keyed registry mapping tool names to implementations.
///
/// Invocation applies, in order: allowlist visibility, rate limiting,
/// execution under the tool's timeout. Tools outside the caller's
/// category allowlist behave exactly like unregistered tools.
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    safety: Arc<SafetyKit>,
}

impl ToolRegistry {
    /// Creates an empty registry sharing the given safety kit.
    pub fn new(safety: Arc<SafetyKit>) -> Self {
        Self {
            tools: BTreeMap::new(),
            safety,
        }
    }

    /// Registers a tool, replacing any previous tool of the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.spec().name.clone();
        info!(tool = %name, category = %tool.spec().category, "Registered tool");
        self.tools.insert(name, tool);
    }

    /// The shared safety kit.
    pub fn safety(&self) -> &Arc<SafetyKit> {
        &self.safety
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry holds no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool specs visible under `allowlist`, sorted by name.
    pub fn catalogue(&self, allowlist: &BTreeSet<ToolCategory>) -> Vec<ToolSpec> {
        self.tools
            .values()
            .filter(|t| allowlist.contains(&t.spec().category))
            .map(|t| t.spec().clone())
            .collect()
    }

    /// Invokes a tool on behalf of a session.
    pub async fn invoke(
        &self,
        call: &ToolCall,
        allowlist: &BTreeSet<ToolCategory>,
        session: Uuid,
    ) -> ToolOutcome {
        let tool = match self.tools.get(&call.name) {
            Some(tool) if allowlist.contains(&tool.spec().category) => tool,
            _ => {
                warn!(tool = %call.name, "Tool invisible to caller");
                return ToolOutcome::err(
                    ToolErrorKind::Denied,
                    format!("tool '{}' is not available to this agent", call.name),
                );
            }
        };

        let spec = tool.spec();
        if !self
            .safety
            .limiter
            .try_acquire(session, &spec.name, spec.rate_limit)
        {
            return ToolOutcome::err(
                ToolErrorKind::RateLimitExceeded,
                format!(
                    "tool '{}' exhausted its per-session limit of {}",
                    spec.name, spec.rate_limit
                ),
            );
        }

        let timeout = Duration::from_secs(spec.timeout_secs);
        match tokio::time::timeout(timeout, tool.execute(&call.arguments, &self.safety)).await {
            Ok(outcome) => outcome,
            Err(_) => ToolOutcome::err(
                ToolErrorKind::Timeout,
                format!("tool '{}' exceeded {}s", spec.name, spec.timeout_secs),
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::tool::DangerLevel;
    use async_trait::async_trait;
    use forgent_security::{CommandGuard, PathGuard, RateLimiter};

    struct EchoTool {
        spec: ToolSpec,
    }

    impl EchoTool {
        fn new(category: ToolCategory, rate_limit: u32) -> Self {
            Self {
                spec: ToolSpec {
                    name: "echo".to_string(),
                    category,
                    description: "Echoes its arguments".to_string(),
                    arg_schema: serde_json::json!({}),
                    rate_limit,
                    danger_level: DangerLevel::Safe,
                    timeout_secs: 5,
                },
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> &ToolSpec {
            &self.spec
        }
        async fn execute(&self, args: &serde_json::Value, _safety: &SafetyKit) -> ToolOutcome {
            ToolOutcome::ok(args.clone())
        }
    }

    fn registry_with(tool: EchoTool) -> ToolRegistry {
        let dir = tempfile::tempdir().unwrap();
        let safety = Arc::new(SafetyKit {
            paths: PathGuard::new(dir.path()).unwrap(),
            commands: CommandGuard::new(),
            limiter: RateLimiter::new(),
            workspace: dir.path().to_path_buf(),
        });
        // Leak the tempdir so the guard's canonical root stays valid
        // for the duration of the test.
        std::mem::forget(dir);
        let mut registry = ToolRegistry::new(safety);
        registry.register(Arc::new(tool));
        registry
    }

    fn allow(categories: &[ToolCategory]) -> BTreeSet<ToolCategory> {
        categories.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_invoke_allowed_tool() {
        let registry = registry_with(EchoTool::new(ToolCategory::Utility, 5));
        let call = ToolCall::new("echo", serde_json::json!({"x": 1}));
        let outcome = registry
            .invoke(&call, &allow(&[ToolCategory::Utility]), Uuid::new_v4())
            .await;
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn test_tool_outside_allowlist_denied() {
        let registry = registry_with(EchoTool::new(ToolCategory::Pkg, 5));
        let call = ToolCall::new("echo", serde_json::json!({}));
        let outcome = registry
            .invoke(&call, &allow(&[ToolCategory::Core]), Uuid::new_v4())
            .await;
        match outcome {
            ToolOutcome::Err { kind, .. } => assert_eq!(kind, ToolErrorKind::Denied),
            other => panic!("expected denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_denied() {
        let registry = registry_with(EchoTool::new(ToolCategory::Core, 5));
        let call = ToolCall::new("nonexistent", serde_json::json!({}));
        let outcome = registry
            .invoke(&call, &allow(&[ToolCategory::Core]), Uuid::new_v4())
            .await;
        assert!(!outcome.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limit_exhaustion() {
        let registry = registry_with(EchoTool::new(ToolCategory::Core, 2));
        let call = ToolCall::new("echo", serde_json::json!({}));
        let session = Uuid::new_v4();
        let allowlist = allow(&[ToolCategory::Core]);

        assert!(registry.invoke(&call, &allowlist, session).await.is_ok());
        assert!(registry.invoke(&call, &allowlist, session).await.is_ok());
        match registry.invoke(&call, &allowlist, session).await {
            ToolOutcome::Err { kind, .. } => {
                assert_eq!(kind, ToolErrorKind::RateLimitExceeded);
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_catalogue_filtered_by_allowlist() {
        let registry = registry_with(EchoTool::new(ToolCategory::Utility, 5));
        assert_eq!(registry.catalogue(&allow(&[ToolCategory::Utility])).len(), 1);
        assert!(registry.catalogue(&allow(&[ToolCategory::Git])).is_empty());
    }
}
