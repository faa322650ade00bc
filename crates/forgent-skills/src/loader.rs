use crate::descriptor::SkillDescriptor;
use crate::registry::SkillRegistry;
use std::path::PathBuf;
use tracing::{info, warn};

/// Loads skill descriptors from a directory of skill subdirectories.
///
/// Layout: `<skills_dir>/<skill-name>/SKILL.md`. A descriptor that
/// fails to parse is skipped with a warning; loading never fails.
pub struct SkillLoader {
    skills_dir: PathBuf,
}

impl SkillLoader {
    /// Creates a loader rooted at `skills_dir`.
    pub fn new(skills_dir: PathBuf) -> Self {
        Self { skills_dir }
    }

    /// Scans the directory and returns a populated registry.
    pub fn load_all(&self) -> SkillRegistry {
        let mut registry = SkillRegistry::new();

        let entries = match std::fs::read_dir(&self.skills_dir) {
            Ok(entries) => entries,
            Err(_) => {
                info!(dir = %self.skills_dir.display(), "Skills directory not found, skipping");
                return registry;
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.path())
            .collect();
        dirs.sort();

        for dir in dirs {
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let descriptor_path = dir.join("SKILL.md");

            let raw = match std::fs::read_to_string(&descriptor_path) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(skill = %name, error = %e, "Skill missing SKILL.md, skipping");
                    continue;
                }
            };

            match SkillDescriptor::parse(&raw, &name) {
                Ok(skill) => registry.register(skill),
                Err(e) => {
                    warn!(skill = %name, error = %e, "Failed to parse skill, skipping");
                }
            }
        }

        info!(count = registry.len(), "Skills loaded");
        registry
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn write_skill(root: &std::path::Path, name: &str, content: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("SKILL.md"), content).unwrap();
    }

    #[test]
    fn test_missing_directory_yields_empty_registry() {
        let loader = SkillLoader::new(PathBuf::from("/nonexistent/skills"));
        assert!(loader.load_all().is_empty());
    }

    #[test]
    fn test_loads_valid_skills() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(
            dir.path(),
            "auth-flows",
            "---\ncategory: security\nkeywords: [jwt]\n---\nGuidance.",
        );
        write_skill(
            dir.path(),
            "unit-testing",
            "---\ncategory: testing\n---\nTest guidance.",
        );

        let registry = SkillLoader::new(dir.path().to_path_buf()).load_all();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("auth-flows").is_some());
        assert!(registry.get("unit-testing").is_some());
    }

    #[test]
    fn test_malformed_skill_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "good", "---\ncategory: testing\n---\nOk.");
        write_skill(dir.path(), "bad", "no frontmatter here");

        let registry = SkillLoader::new(dir.path().to_path_buf()).load_all();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("good").is_some());
        assert!(registry.get("bad").is_none());
    }

    #[test]
    fn test_directory_without_descriptor_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("empty-skill")).unwrap();

        let registry = SkillLoader::new(dir.path().to_path_buf()).load_all();
        assert!(registry.is_empty());
    }
}
