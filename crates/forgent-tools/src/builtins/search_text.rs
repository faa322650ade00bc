use crate::tool::{require_str, DangerLevel, SafetyKit, Tool, ToolSpec};
use async_trait::async_trait;
use forgent_core::{ToolCategory, ToolErrorKind, ToolOutcome};
use regex::Regex;

const MAX_MATCHES: usize = 100;
const MAX_SEARCH_FILES: usize = 2_000;

/// Searches workspace files for a regex pattern.
pub struct SearchTextTool {
    spec: ToolSpec,
}

impl SearchTextTool {
    /// Creates the tool with its default spec.
    pub fn new() -> Self {
        Self {
            spec: ToolSpec {
                name: "search_text".to_string(),
                category: ToolCategory::Utility,
                description: "Search workspace files for a regex pattern.".to_string(),
                arg_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "pattern": {"type": "string", "description": "Regex pattern"},
                        "path": {"type": "string", "description": "Subdirectory to search (default: .)"}
                    },
                    "required": ["pattern"]
                }),
                rate_limit: 30,
                danger_level: DangerLevel::Safe,
                timeout_secs: 30,
            },
        }
    }
}

impl Default for SearchTextTool {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_files(
    dir: &std::path::Path,
    out: &mut Vec<std::path::PathBuf>,
) {
    if out.len() >= MAX_SEARCH_FILES {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if path.is_dir() {
            if !matches!(name.as_str(), ".git" | "node_modules" | "target" | ".state") {
                collect_files(&path, out);
            }
        } else if out.len() < MAX_SEARCH_FILES {
            out.push(path);
        }
    }
}

#[async_trait]
impl Tool for SearchTextTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: &serde_json::Value, safety: &SafetyKit) -> ToolOutcome {
        let pattern = match require_str(args, "pattern") {
            Ok(pattern) => pattern,
            Err(e) => return ToolOutcome::err(ToolErrorKind::InvalidArgs, e),
        };
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                return ToolOutcome::err(
                    ToolErrorKind::InvalidArgs,
                    format!("invalid pattern: {e}"),
                )
            }
        };

        let sub = args.get("path").and_then(|v| v.as_str()).unwrap_or(".");
        let root = match safety.paths.resolve(sub) {
            Ok(root) => root,
            Err(e) => return ToolOutcome::err(ToolErrorKind::SafetyBlocked, e),
        };

        let mut files = Vec::new();
        collect_files(&root, &mut files);

        let mut matches = Vec::new();
        'outer: for file in &files {
            let Ok(content) = std::fs::read_to_string(file) else {
                continue;
            };
            for (idx, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    let rel = file
                        .strip_prefix(safety.paths.root())
                        .unwrap_or(file)
                        .to_string_lossy()
                        .replace('\\', "/");
                    matches.push(serde_json::json!({
                        "file": rel,
                        "line": idx + 1,
                        "text": line.trim(),
                    }));
                    if matches.len() >= MAX_MATCHES {
                        break 'outer;
                    }
                }
            }
        }

        ToolOutcome::ok(serde_json::json!({
            "pattern": pattern,
            "match_count": matches.len(),
            "matches": matches,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::builtins::tests::test_safety;

    #[tokio::test]
    async fn test_finds_matches() {
        let (safety, dir) = test_safety();
        std::fs::write(dir.path().join("a.txt"), "hello world\nfoo\n").unwrap();
        std::fs::write(dir.path().join("b.txt"), "another hello\n").unwrap();

        let tool = SearchTextTool::new();
        match tool
            .execute(&serde_json::json!({"pattern": "hello"}), &safety)
            .await
        {
            ToolOutcome::Ok { value } => assert_eq!(value["match_count"], 2),
            other => panic!("expected ok, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_pattern_rejected() {
        let (safety, _dir) = test_safety();
        let tool = SearchTextTool::new();
        let outcome = tool
            .execute(&serde_json::json!({"pattern": "[unclosed"}), &safety)
            .await;
        assert!(!outcome.is_ok());
    }
}
