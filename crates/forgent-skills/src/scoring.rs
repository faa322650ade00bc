//! Relevance scoring for skill selection.
//!
//! Each term of the formula is a named pure function so the overall
//! score is reproducible and unit-testable:
//!
//! ```text
//! score = 0.40·keyword_overlap + 0.25·category_match
//!       + 0.20·agent_affinity  + 0.15·name_token_match
//! ```

use crate::descriptor::SkillDescriptor;
use forgent_core::TaskType;
use std::collections::{BTreeMap, BTreeSet};

const W_KEYWORDS: f64 = 0.40;
const W_CATEGORY: f64 = 0.25;
const W_AFFINITY: f64 = 0.20;
const W_NAME: f64 = 0.15;

/// Pre-declared task-type → skill-category map.
const TASK_CATEGORIES: &[(TaskType, &[&str])] = &[
    (TaskType::BuildFeature, &["feature", "frontend", "backend", "api"]),
    (TaskType::FixBug, &["debugging", "diagnostics"]),
    (TaskType::Refactor, &["architecture", "quality"]),
    (TaskType::Optimize, &["performance"]),
    (TaskType::Scan, &["analysis"]),
    (TaskType::Design, &["design", "architecture"]),
    (TaskType::Test, &["testing"]),
    (TaskType::Review, &["quality", "security"]),
    (TaskType::Document, &["documentation"]),
    (TaskType::Deploy, &["devops"]),
    (TaskType::Explain, &["documentation", "analysis"]),
    (TaskType::Plan, &["planning", "architecture"]),
    (TaskType::Install, &["devops"]),
];

/// Lower-case alphanumeric tokens of a query string.
pub fn tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(std::string::ToString::to_string)
        .collect()
}

/// `|keywords ∩ query|` over `|keywords|`, capped at 1. Empty keyword
/// sets score 0.
pub fn keyword_overlap(keywords: &BTreeSet<String>, query_tokens: &[String]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let query: BTreeSet<&str> = query_tokens.iter().map(String::as_str).collect();
    let hits = keywords.iter().filter(|k| query.contains(k.as_str())).count();
    (hits as f64 / keywords.len() as f64).min(1.0)
}

/// 1 when the skill category appears in the task type's pre-declared
/// category list, else 0.
pub fn category_match(category: &str, task_type: TaskType) -> f64 {
    TASK_CATEGORIES
        .iter()
        .find(|(tt, _)| *tt == task_type)
        .map(|(_, cats)| cats.contains(&category))
        .unwrap_or(false) as u8 as f64
}

/// The skill's weight for this agent, normalized by the table maximum.
/// 0 when the table is empty or the agent is absent.
pub fn agent_affinity(affinity: &BTreeMap<String, f64>, agent_id: &str) -> f64 {
    let max = affinity.values().copied().fold(0.0f64, f64::max);
    if max <= 0.0 {
        return 0.0;
    }
    (affinity.get(agent_id).copied().unwrap_or(0.0) / max).clamp(0.0, 1.0)
}

/// 1 when any token of the skill name occurs among the query tokens.
pub fn name_token_match(name_tokens: &[&str], query_tokens: &[String]) -> f64 {
    let query: BTreeSet<&str> = query_tokens.iter().map(String::as_str).collect();
    name_tokens.iter().any(|t| query.contains(t)) as u8 as f64
}

/// The full relevance score, bounded to [0,1].
pub fn score(
    skill: &SkillDescriptor,
    query_tokens: &[String],
    task_type: TaskType,
    agent_id: &str,
) -> f64 {
    let total = W_KEYWORDS * keyword_overlap(&skill.keywords, query_tokens)
        + W_CATEGORY * category_match(&skill.category, task_type)
        + W_AFFINITY * agent_affinity(&skill.agent_affinity, agent_id)
        + W_NAME * name_token_match(&skill.name_tokens(), query_tokens);
    total.clamp(0.0, 1.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn keyword_set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_keyword_overlap() {
        let keywords = keyword_set(&["jwt", "oauth", "session", "login"]);
        let query = tokens("add jwt login support");
        assert_eq!(keyword_overlap(&keywords, &query), 0.5);
        assert_eq!(keyword_overlap(&keywords, &tokens("nothing relevant")), 0.0);
        assert_eq!(keyword_overlap(&BTreeSet::new(), &query), 0.0);
    }

    #[test]
    fn test_category_match() {
        assert_eq!(category_match("security", TaskType::Review), 1.0);
        assert_eq!(category_match("security", TaskType::Test), 0.0);
        assert_eq!(category_match("testing", TaskType::Test), 1.0);
        // Generic maps to no categories.
        assert_eq!(category_match("testing", TaskType::Generic), 0.0);
    }

    #[test]
    fn test_agent_affinity_normalization() {
        let mut table = BTreeMap::new();
        table.insert("02".to_string(), 0.5);
        table.insert("04".to_string(), 1.0);
        assert_eq!(agent_affinity(&table, "02"), 0.5);
        assert_eq!(agent_affinity(&table, "04"), 1.0);
        assert_eq!(agent_affinity(&table, "09"), 0.0);
        assert_eq!(agent_affinity(&BTreeMap::new(), "02"), 0.0);
    }

    #[test]
    fn test_name_token_match() {
        let query = tokens("improve auth flows");
        assert_eq!(name_token_match(&["auth", "flows"], &query), 1.0);
        assert_eq!(name_token_match(&["database"], &query), 0.0);
    }

    #[test]
    fn test_score_bounded() {
        let skill = SkillDescriptor {
            name: "auth-flows".to_string(),
            category: "security".to_string(),
            keywords: keyword_set(&["auth"]),
            body: String::new(),
            agent_affinity: [("02".to_string(), 1.0)].into_iter().collect(),
        };
        let query = tokens("review auth flows");
        let s = score(&skill, &query, TaskType::Review, "02");
        assert!(s > 0.0 && s <= 1.0);
        // All four terms maximal: 0.40 + 0.25 + 0.20 + 0.15 = 1.0.
        assert!((s - 1.0).abs() < 1e-9);
    }
}
