//! Persistent state for the Forgent orchestrator.
//!
//! Everything lives under `<workspace>/.state/`: the committed
//! snapshot (`state.json`), the append-only human-readable session log
//! (`session_context.md`), the autonomy decision audit log
//! (`audit.log`, JSONL), run metrics (`metrics.jsonl`), full analyzer
//! report snapshots (`longcot/`), and per-run artifact manifests with
//! pre-write backups (`artifacts/<run_id>/`).
//!
//! The store is single-writer: all appends are serialized through one
//! lock, and replaying `audit.log` reconstructs every gate decision.

/// Artifact manifests, backups, and rollback.
pub mod artifact;
/// Snapshot, session log, audit log, metrics.
pub mod store;

pub use artifact::{sha256_hex, ArtifactEntry, ArtifactRegistry, RollbackReport};
pub use store::{Decision, DecisionEntry, StateSnapshot, StateStore};
