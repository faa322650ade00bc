use crate::descriptor::SkillDescriptor;
use crate::scoring;
use forgent_core::TaskType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// One selected skill with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSelection {
    /// Skill name.
    pub name: String,
    /// Relevance score in [0,1].
    pub score: f64,
}

/// Central registry for all loaded skills.
pub struct SkillRegistry {
    skills: BTreeMap<String, SkillDescriptor>,
}

impl SkillRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            skills: BTreeMap::new(),
        }
    }

    /// Registers a skill, replacing any previous skill of the same name.
    pub fn register(&mut self, skill: SkillDescriptor) {
        info!(skill = %skill.name, category = %skill.category, "Registered skill");
        self.skills.insert(skill.name.clone(), skill);
    }

    /// Looks up a skill by name.
    pub fn get(&self, name: &str) -> Option<&SkillDescriptor> {
        self.skills.get(name)
    }

    /// Number of registered skills.
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Whether the registry holds no skills.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Selects the top `k` skills for an agent × query pair.
    ///
    /// Only skills with a positive score are returned; ties break by
    /// (score DESC, name ASC). An empty registry yields an empty
    /// selection.
    pub fn select(
        &self,
        query: &str,
        task_type: TaskType,
        agent_id: &str,
        k: usize,
    ) -> Vec<SkillSelection> {
        let query_tokens = scoring::tokens(query);

        let mut scored: Vec<SkillSelection> = self
            .skills
            .values()
            .map(|skill| SkillSelection {
                name: skill.name.clone(),
                score: scoring::score(skill, &query_tokens, task_type, agent_id),
            })
            .filter(|s| s.score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        scored.truncate(k);
        scored
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new()
    }
}
