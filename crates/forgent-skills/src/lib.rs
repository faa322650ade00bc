//! Skill registry and relevance scoring for the Forgent orchestrator.
//!
//! Skills are knowledge packs loaded from a directory at startup: a
//! YAML frontmatter header (category, keywords, optional per-agent
//! affinity) followed by an opaque body. At each pipeline step the
//! registry ranks skills for the acting agent and query using a
//! deterministic weighted formula whose terms are individually
//! testable pure functions.

/// Descriptor parsing.
pub mod descriptor;
/// Directory loader.
pub mod loader;
/// The skill registry and top-K selection.
pub mod registry;
/// The relevance formula, term by term.
pub mod scoring;

pub use descriptor::SkillDescriptor;
pub use loader::SkillLoader;
pub use registry::{SkillRegistry, SkillSelection};
