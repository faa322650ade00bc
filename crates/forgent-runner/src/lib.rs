//! Self-healing subprocess runner.
//!
//! Launches a user-project process, inspects the stderr tail of each
//! non-zero exit against an ordered classification table, applies the
//! matching remedy (package install or deterministic port rebind)
//! through the shared command denylist, and relaunches up to the
//! attempt cap. Syntax errors are fatal immediately; unclassified
//! failures get exactly one retry.

/// Failure classification over the stderr tail.
pub mod classify;
/// The launch/heal/relaunch loop.
pub mod runner;

pub use classify::{classify, Classification, STDERR_TAIL_LINES};
pub use runner::{HealingRunner, RunResult, RunStatus};
