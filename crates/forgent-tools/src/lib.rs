//! Permissioned tool registry for Forgent agents.
//!
//! Tools are keyed by name and grouped into categories; the
//! orchestrator supplies each agent's category allowlist at invocation
//! time and tools outside it are invisible. Every invocation passes
//! the safety guards (path confinement, command denylist, env secret
//! filter) and a per-session rate limiter, and runs under the tool's
//! timeout.
//!
//! Tool-surface failures are returned as [`forgent_core::ToolOutcome`]
//! values so the reasoning loop can observe them and continue.

/// Builtin tools and the default registry constructor.
pub mod builtins;
/// The tool registry.
pub mod registry;
/// The tool trait and shared invocation types.
pub mod tool;

pub use builtins::default_registry;
pub use registry::ToolRegistry;
pub use tool::{DangerLevel, SafetyKit, Tool, ToolSpec};
