//! Safety primitives for the Forgent tool surface.
//!
//! Provides workspace path confinement, a shell-command denylist, an
//! environment secret filter, and per-session rate limiting. Every
//! tool invocation passes through these guards before touching the
//! filesystem or spawning a process.
//!
//! # Main types
//!
//! - [`PathGuard`] — Rejects paths that resolve outside the workspace.
//! - [`CommandGuard`] — Regex denylist over shell command lines.
//! - [`EnvGuard`] — Refuses reads of secret-bearing variable names.
//! - [`RateLimiter`] — Per-session, per-tool invocation counters.

/// Shell-command denylist.
pub mod command_guard;
/// Environment secret filter.
pub mod env_guard;
/// Workspace path confinement.
pub mod path_guard;
/// Per-session invocation counting.
pub mod rate_limit;

pub use command_guard::CommandGuard;
pub use env_guard::EnvGuard;
pub use path_guard::PathGuard;
pub use rate_limit::RateLimiter;
