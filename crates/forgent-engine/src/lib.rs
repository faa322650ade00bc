//! The ReAct reasoning engine.
//!
//! Executes agent work as a bounded loop of think/act/observe triples:
//! the backend produces a thought plus either a tool invocation or a
//! terminal decision, tool results come back as observations, and the
//! loop ends on completion, step-budget exhaustion, or three identical
//! consecutive tool calls.
//!
//! History is bounded: once it exceeds the configured maximum, the
//! oldest half is compacted into a single marked summary step that is
//! never itself re-compressed.

/// The reasoning backend trait and the scripted test policy.
pub mod backend;
/// The loop itself.
pub mod react;

pub use backend::{Directive, Reasoning, ReasoningBackend, ScriptedBackend};
pub use react::{EngineOutcome, ReactEngine, ReactStep};
