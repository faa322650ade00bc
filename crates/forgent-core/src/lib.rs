//! Core types and error definitions for the Forgent orchestrator.
//!
//! This crate provides the foundational types shared across all Forgent
//! crates: the unified error enum, the task model, the deterministic
//! intent parser, tool invocation primitives, and runtime configuration.
//!
//! # Main types
//!
//! - [`ForgentError`] — Unified error enum for all Forgent subsystems.
//! - [`ForgentResult`] — Convenience alias for `Result<T, ForgentError>`.
//! - [`Task`] / [`TaskType`] — A classified user request.
//! - [`ToolCall`] / [`ToolOutcome`] — Tool invocation request and result.
//! - [`ForgentConfig`] — Thresholds and budgets, with environment overrides.

/// Runtime configuration: thresholds, budgets, and environment overrides.
pub mod config;
/// Error types shared by every subsystem.
pub mod error;
/// Deterministic natural-language → task classification.
pub mod intent;
/// The task model: task types, parameters, destructiveness.
pub mod task;
/// Tool invocation primitives shared by the registry and the engine.
pub mod tool;

pub use config::ForgentConfig;
pub use error::{ForgentError, ForgentResult};
pub use intent::parse_intent;
pub use task::{Task, TaskType};
pub use tool::{ToolCall, ToolCategory, ToolErrorKind, ToolOutcome};
