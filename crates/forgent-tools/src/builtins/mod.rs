//! Builtin tools registered by default.

/// Environment variable reads.
pub mod env_read;
/// File reading.
pub mod file_read;
/// File writing.
pub mod file_write;
/// Task completion signal.
pub mod finish_task;
/// Git working-tree status.
pub mod git_status;
/// Directory listing.
pub mod list_dir;
/// Directory creation.
pub mod make_dir;
/// Package installation.
pub mod pkg_install;
/// Shell command execution.
pub mod run_command;
/// Regex search over workspace files.
pub mod search_text;

pub use env_read::EnvReadTool;
pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use finish_task::FinishTaskTool;
pub use git_status::GitStatusTool;
pub use list_dir::ListDirTool;
pub use make_dir::MakeDirTool;
pub use pkg_install::PkgInstallTool;
pub use run_command::RunCommandTool;
pub use run_tests::RunTestsTool;
pub use search_text::SearchTextTool;

use crate::registry::ToolRegistry;
use crate::tool::SafetyKit;
use forgent_core::{ForgentError, ForgentResult};
use forgent_security::{CommandGuard, PathGuard, RateLimiter};
use std::path::Path;
use std::sync::Arc;

/// Builds a registry with every builtin tool, guarded by a fresh
/// safety kit rooted at `workspace`.
pub fn default_registry(workspace: &Path) -> ForgentResult<ToolRegistry> {
    let safety = Arc::new(SafetyKit {
        paths: PathGuard::new(workspace)
            .map_err(|e| ForgentError::Security(format!("cannot guard workspace: {e}")))?,
        commands: CommandGuard::new(),
        limiter: RateLimiter::new(),
        workspace: workspace.to_path_buf(),
    });

    let mut registry = ToolRegistry::new(safety);
    registry.register(Arc::new(FileReadTool::new()));
    registry.register(Arc::new(FileWriteTool::new()));
    registry.register(Arc::new(ListDirTool::new()));
    registry.register(Arc::new(RunCommandTool::new()));
    registry.register(Arc::new(FinishTaskTool::new()));
    registry.register(Arc::new(GitStatusTool::new()));
    registry.register(Arc::new(PkgInstallTool::new()));
    registry.register(Arc::new(RunTestsTool::new()));
    registry.register(Arc::new(SearchTextTool::new()));
    registry.register(Arc::new(EnvReadTool::new()));
    registry.register(Arc::new(MakeDirTool::new()));
    Ok(registry)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A safety kit rooted in a fresh temp workspace, returned with the
    /// tempdir so it outlives the test body.
    pub(crate) fn test_safety() -> (SafetyKit, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let safety = SafetyKit {
            paths: PathGuard::new(dir.path()).unwrap(),
            commands: CommandGuard::new(),
            limiter: RateLimiter::new(),
            workspace: dir.path().to_path_buf(),
        };
        (safety, dir)
    }

    #[test]
    fn test_default_registry_has_all_builtins() {
        let dir = tempfile::tempdir().unwrap();
        let registry = default_registry(dir.path()).unwrap();
        assert_eq!(registry.len(), 11);
    }
}
