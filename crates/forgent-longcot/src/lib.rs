//! Long chain-of-thought project analyzer.
//!
//! Builds a confidence-scored understanding of a codebase in four
//! phases: architecture hypothesis selection over a closed taxonomy,
//! per-module deep reasoning, critical-path identification over the
//! module import graph, and a reflection pass whose rubric rewards can
//! trigger one bounded backtrack with the losing hypothesis' cues
//! masked.
//!
//! The analyzer consumes scan summaries, never raw file bytes, and it
//! never fails: degraded inputs produce an `unknown` hypothesis with
//! zero confidence.

/// The four reasoning phases and the reflection reward model.
pub mod analyzer;
/// Insight and report types.
pub mod insight;

pub use analyzer::Analyzer;
pub use insight::{
    Architecture, Complexity, CriticalReason, Insight, InsightDetail, LongCotReport, ReportStats,
};
