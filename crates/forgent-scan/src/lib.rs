//! Project scanner for the Forgent orchestrator.
//!
//! Enumerates workspace files, classifies languages and roles, detects
//! entry points and framework markers, and extracts line-oriented import
//! edges per stack. The output — a [`ProjectFingerprint`] plus a list of
//! [`FileRecord`]s — feeds the Long-CoT analyzer.
//!
//! Per-file I/O errors degrade to warning risk flags; only a missing
//! workspace root is fatal.

/// The recursive walker and per-stack classifiers.
pub mod scanner;
/// Scan output types.
pub mod types;

pub use scanner::{Scanner, MAX_FILES};
pub use types::{
    FileRecord, FileRole, Language, PackageManager, ProjectFingerprint, RiskFlag, RiskSeverity,
    ScanDepth, ScanResult,
};
