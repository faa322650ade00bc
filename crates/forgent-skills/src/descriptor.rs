use forgent_core::{ForgentError, ForgentResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// YAML frontmatter parsed from a skill descriptor file.
#[derive(Debug, Clone, Deserialize)]
struct SkillFrontmatter {
    #[serde(default)]
    name: Option<String>,
    category: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    agent_affinity: BTreeMap<String, f64>,
}

/// A named, categorized knowledge pack supplied as extra context to an
/// agent step.
///
/// File format (`SKILL.md` inside the skill's directory):
/// ```markdown
/// ---
/// category: security
/// keywords: [jwt, oauth, session]
/// agent_affinity:
///   "02": 0.9
/// ---
///
/// When implementing authentication flows...
/// ```
///
/// `name` defaults to the directory name when the header omits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDescriptor {
    /// Unique skill name.
    pub name: String,
    /// Declared category, matched against the task-type category map.
    pub category: String,
    /// Declared keywords plus tokens extracted from body headings.
    pub keywords: BTreeSet<String>,
    /// The knowledge text handed to agents.
    pub body: String,
    /// Optional per-agent weights, normalized during scoring.
    pub agent_affinity: BTreeMap<String, f64>,
}

impl SkillDescriptor {
    /// Parses a descriptor from raw `SKILL.md` content.
    pub fn parse(raw: &str, default_name: &str) -> ForgentResult<Self> {
        let (front, body) = split_frontmatter(raw)?;

        let mut keywords: BTreeSet<String> = front
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        keywords.extend(heading_tokens(&body));

        Ok(Self {
            name: front
                .name
                .unwrap_or_else(|| default_name.to_string())
                .trim()
                .to_lowercase(),
            category: front.category.trim().to_lowercase(),
            keywords,
            body,
            agent_affinity: front.agent_affinity,
        })
    }

    /// Tokens of the skill name, split on `-` and `_`.
    pub fn name_tokens(&self) -> Vec<&str> {
        self.name
            .split(['-', '_'])
            .filter(|t| !t.is_empty())
            .collect()
    }
}

fn split_frontmatter(raw: &str) -> ForgentResult<(SkillFrontmatter, String)> {
    let trimmed = raw.trim_start();
    if !trimmed.starts_with("---") {
        return Err(ForgentError::Skill(
            "skill-parse: descriptor must start with YAML frontmatter (---)".to_string(),
        ));
    }

    let after_open = &trimmed[3..];
    let close = after_open.find("\n---").ok_or_else(|| {
        ForgentError::Skill(
            "skill-parse: missing closing frontmatter delimiter (---)".to_string(),
        )
    })?;

    let yaml = &after_open[..close];
    let body = after_open[close + 4..].trim().to_string();

    let front: SkillFrontmatter = serde_yaml_ng::from_str(yaml)
        .map_err(|e| ForgentError::Skill(format!("skill-parse: invalid frontmatter: {e}")))?;

    Ok((front, body))
}

/// Extracts lower-case keyword tokens from markdown headings in the body.
fn heading_tokens(body: &str) -> BTreeSet<String> {
    body.lines()
        .filter(|line| line.trim_start().starts_with('#'))
        .flat_map(|line| {
            line.trim_start_matches(['#', ' '])
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| t.len() >= 3)
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"---
name: auth-flows
category: security
keywords: [jwt, oauth, session]
agent_affinity:
  "02": 0.9
  "04": 0.3
---

# Token Handling

Always validate token expiry before trusting claims.
"#;

    #[test]
    fn test_parse_full_descriptor() {
        let skill = SkillDescriptor::parse(SAMPLE, "fallback").unwrap();
        assert_eq!(skill.name, "auth-flows");
        assert_eq!(skill.category, "security");
        assert!(skill.keywords.contains("jwt"));
        // Heading words are folded into the keyword set.
        assert!(skill.keywords.contains("token"));
        assert_eq!(skill.agent_affinity.get("02"), Some(&0.9));
        assert!(skill.body.contains("token expiry"));
    }

    #[test]
    fn test_name_defaults_to_directory() {
        let raw = "---\ncategory: testing\n---\nBody";
        let skill = SkillDescriptor::parse(raw, "unit-testing").unwrap();
        assert_eq!(skill.name, "unit-testing");
        assert_eq!(skill.name_tokens(), vec!["unit", "testing"]);
    }

    #[test]
    fn test_missing_frontmatter_rejected() {
        assert!(SkillDescriptor::parse("no header at all", "x").is_err());
    }

    #[test]
    fn test_unclosed_frontmatter_rejected() {
        assert!(SkillDescriptor::parse("---\ncategory: a\nbody", "x").is_err());
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let raw = "---\n[not yaml\n---\nBody";
        assert!(SkillDescriptor::parse(raw, "x").is_err());
    }
}
