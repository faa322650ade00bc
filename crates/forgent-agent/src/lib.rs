//! Agent descriptor loading.
//!
//! Agents are text documents in an agents directory, keyed by the
//! two-digit id prefix of the filename (`02_builder.md` → id `02`).
//! An optional YAML frontmatter header declares the role, the tool
//! category allowlist, and skill-category affinities; the body is an
//! opaque prompt that the orchestrator never parses. Files without a
//! header get a conservative default allowlist.

use forgent_core::{ForgentError, ForgentResult, ToolCategory};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Optional YAML header of an agent document.
#[derive(Debug, Clone, Default, Deserialize)]
struct AgentFrontmatter {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    tool_categories: Vec<String>,
    #[serde(default)]
    skill_affinity: BTreeMap<String, f64>,
}

/// A loaded agent: id, role, opaque prompt body, and policy tables.
#[derive(Debug, Clone)]
pub struct AgentDescriptor {
    /// Two-digit id from the filename prefix.
    pub id: String,
    /// Declared role, or the filename remainder.
    pub role: String,
    /// The prompt body. Never parsed by the orchestrator.
    pub content: String,
    /// Tool categories this agent may use.
    pub tool_categories: BTreeSet<ToolCategory>,
    /// Skill-category weights declared by the agent.
    pub skill_affinity: BTreeMap<String, f64>,
}

/// The conservative allowlist applied when no header is present.
fn default_allowlist() -> BTreeSet<ToolCategory> {
    [ToolCategory::Core, ToolCategory::Utility]
        .into_iter()
        .collect()
}

impl AgentDescriptor {
    /// Parses an agent document. `id` and `fallback_role` come from
    /// the filename.
    pub fn parse(raw: &str, id: &str, fallback_role: &str) -> ForgentResult<Self> {
        let (front, content) = split_optional_frontmatter(raw)?;

        let tool_categories = if front.tool_categories.is_empty() {
            default_allowlist()
        } else {
            let mut categories = BTreeSet::new();
            for name in &front.tool_categories {
                match ToolCategory::from_str(name) {
                    Ok(cat) => {
                        categories.insert(cat);
                    }
                    Err(e) => warn!(agent = %id, error = %e, "Skipping unknown tool category"),
                }
            }
            if categories.is_empty() {
                default_allowlist()
            } else {
                categories
            }
        };

        Ok(Self {
            id: id.to_string(),
            role: front
                .role
                .unwrap_or_else(|| fallback_role.to_string())
                .trim()
                .to_string(),
            content,
            tool_categories,
            skill_affinity: front.skill_affinity,
        })
    }
}

fn split_optional_frontmatter(raw: &str) -> ForgentResult<(AgentFrontmatter, String)> {
    let trimmed = raw.trim_start();
    if !trimmed.starts_with("---") {
        return Ok((AgentFrontmatter::default(), raw.trim().to_string()));
    }

    let after_open = &trimmed[3..];
    let close = after_open.find("\n---").ok_or_else(|| {
        ForgentError::Agent("unterminated frontmatter in agent document".to_string())
    })?;

    let yaml = &after_open[..close];
    let body = after_open[close + 4..].trim().to_string();
    let front: AgentFrontmatter = serde_yaml_ng::from_str(yaml)
        .map_err(|e| ForgentError::Agent(format!("invalid agent frontmatter: {e}")))?;
    Ok((front, body))
}

/// All loaded agents, keyed by id.
pub struct AgentRegistry {
    agents: BTreeMap<String, AgentDescriptor>,
}

impl AgentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            agents: BTreeMap::new(),
        }
    }

    /// Registers an agent, replacing any previous agent with the id.
    pub fn register(&mut self, agent: AgentDescriptor) {
        self.agents.insert(agent.id.clone(), agent);
    }

    /// Looks up an agent by id.
    pub fn get(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.get(id)
    }

    /// Number of loaded agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry holds no agents.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Loads `NN_name.md` files from a directory. Files that fail to
    /// parse are skipped with a warning; a missing directory yields an
    /// empty registry.
    pub fn load_dir(dir: &std::path::Path) -> Self {
        let mut registry = Self::new();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                info!(dir = %dir.display(), "Agents directory not found, skipping");
                return registry;
            }
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let file_name = path
                .file_stem()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let (id, rest) = match file_name.split_at_checked(2) {
                Some((id, rest)) if id.chars().all(|c| c.is_ascii_digit()) => (id, rest),
                _ => {
                    warn!(file = %file_name, "Agent filename lacks a two-digit id prefix, skipping");
                    continue;
                }
            };
            let fallback_role = rest.trim_start_matches(['_', '-']).to_string();

            let raw = match std::fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Cannot read agent file, skipping");
                    continue;
                }
            };

            match AgentDescriptor::parse(&raw, id, &fallback_role) {
                Ok(agent) => {
                    info!(id = %agent.id, role = %agent.role, "Loaded agent");
                    registry.register(agent);
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Cannot parse agent file, skipping");
                }
            }
        }

        registry
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const WITH_HEADER: &str = r#"---
role: Builder
tool_categories: [core, pkg, test]
skill_affinity:
  backend: 0.8
---

You are the builder. Implement features end to end.
"#;

    #[test]
    fn test_parse_with_header() {
        let agent = AgentDescriptor::parse(WITH_HEADER, "02", "builder").unwrap();
        assert_eq!(agent.id, "02");
        assert_eq!(agent.role, "Builder");
        assert!(agent.tool_categories.contains(&ToolCategory::Pkg));
        assert!(agent.tool_categories.contains(&ToolCategory::Test));
        assert_eq!(agent.skill_affinity.get("backend"), Some(&0.8));
        assert!(agent.content.contains("Implement features"));
    }

    #[test]
    fn test_parse_without_header_gets_defaults() {
        let agent = AgentDescriptor::parse("Just a prompt body.", "00", "forensic").unwrap();
        assert_eq!(agent.role, "forensic");
        assert!(agent.tool_categories.contains(&ToolCategory::Core));
        assert!(agent.tool_categories.contains(&ToolCategory::Utility));
        assert!(!agent.tool_categories.contains(&ToolCategory::Pkg));
    }

    #[test]
    fn test_unknown_categories_fall_back() {
        let raw = "---\ntool_categories: [warp_drive]\n---\nBody";
        let agent = AgentDescriptor::parse(raw, "05", "integrator").unwrap();
        assert!(agent.tool_categories.contains(&ToolCategory::Core));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("00_forensic.md"), "Analyze the project.").unwrap();
        std::fs::write(dir.path().join("02_builder.md"), WITH_HEADER).unwrap();
        // Bad prefix, skipped.
        std::fs::write(dir.path().join("notes.md"), "not an agent").unwrap();
        // Non-markdown, skipped.
        std::fs::write(dir.path().join("02_builder.txt"), "ignored").unwrap();

        let registry = AgentRegistry::load_dir(dir.path());
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("00").unwrap().role, "forensic");
        assert_eq!(registry.get("02").unwrap().role, "Builder");
    }

    #[test]
    fn test_missing_dir_yields_empty() {
        let registry = AgentRegistry::load_dir(std::path::Path::new("/nonexistent/agents"));
        assert!(registry.is_empty());
    }
}
