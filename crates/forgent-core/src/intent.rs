use crate::task::{Task, TaskType};
use regex::Regex;
use std::sync::OnceLock;

/// Slash commands in resolution order. First match wins.
const SLASH_COMMANDS: &[(&str, TaskType)] = &[
    ("/scan", TaskType::Scan),
    ("/build", TaskType::BuildFeature),
    ("/plan", TaskType::Plan),
    ("/fix", TaskType::FixBug),
    ("/refactor", TaskType::Refactor),
    ("/optimize", TaskType::Optimize),
    ("/test", TaskType::Test),
    ("/design", TaskType::Design),
    ("/review", TaskType::Review),
    ("/doc", TaskType::Document),
    ("/ship", TaskType::Deploy),
];

/// Keyword sets per task type, in declaration order. Ties between task
/// types are broken by this order.
const KEYWORD_SETS: &[(TaskType, &[&str])] = &[
    (
        TaskType::BuildFeature,
        &["build", "create", "implement", "add", "develop", "make"],
    ),
    (
        TaskType::FixBug,
        &["fix", "bug", "error", "crash", "broken", "issue", "repair"],
    ),
    (
        TaskType::Refactor,
        &["refactor", "restructure", "cleanup", "reorganize", "rewrite"],
    ),
    (
        TaskType::Optimize,
        &["optimize", "performance", "speed", "faster", "slow"],
    ),
    (TaskType::Scan, &["scan", "analyze", "inspect", "audit"]),
    (
        TaskType::Design,
        &["design", "architecture", "wireframe", "layout"],
    ),
    (TaskType::Test, &["test", "tests", "coverage", "verify"]),
    (TaskType::Review, &["review", "critique", "assess"]),
    (
        TaskType::Document,
        &["document", "docs", "documentation", "readme"],
    ),
    (
        TaskType::Deploy,
        &["deploy", "ship", "release", "publish"],
    ),
    (
        TaskType::Explain,
        &["explain", "what", "how", "why", "describe"],
    ),
    (
        TaskType::Plan,
        &["plan", "roadmap", "outline", "strategy"],
    ),
    (
        TaskType::Install,
        &["install", "setup", "configure", "init"],
    ),
];

/// Filler words stripped before the remainder becomes the subject.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "app", "application", "code", "codebase", "project", "please", "my", "our",
    "this", "that", "for", "to", "of", "in", "on", "with", "and", "it", "some", "new", "me",
];

#[allow(clippy::unwrap_used)]
fn quoted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Double- or single-quoted substring; the first match wins.
        Regex::new(r#""([^"]+)"|'([^']+)'"#).unwrap()
    })
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(std::string::ToString::to_string)
        .collect()
}

/// Looks up an explicit slash-command prefix. Returns `None` when the
/// text does not start with `/` or the command is unknown.
pub fn match_slash(text: &str) -> Option<TaskType> {
    let first = text.trim().split_whitespace().next()?;
    if !first.starts_with('/') {
        return None;
    }
    SLASH_COMMANDS
        .iter()
        .find(|(cmd, _)| *cmd == first)
        .map(|(_, tt)| *tt)
}

/// Whether the text starts with a slash that matches no known command.
pub fn is_unknown_slash(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with('/') && match_slash(trimmed).is_none()
}

fn classify_keywords(tokens: &[String]) -> TaskType {
    let mut best = TaskType::Generic;
    let mut best_score = 0u32;

    for (task_type, keywords) in KEYWORD_SETS {
        let mut score = 0u32;
        for (i, token) in tokens.iter().enumerate() {
            if keywords.contains(&token.as_str()) {
                // A verb at sentence start is weighted double.
                score += if i == 0 { 2 } else { 1 };
            }
        }
        if score > best_score {
            best_score = score;
            best = *task_type;
        }
    }

    best
}

fn extract_subject(text: &str, tokens: &[String]) -> Option<String> {
    if let Some(caps) = quoted_re().captures(text) {
        let quoted = caps.get(1).or_else(|| caps.get(2));
        if let Some(m) = quoted {
            return Some(m.as_str().to_string());
        }
    }

    let keyword_tokens: Vec<&str> = KEYWORD_SETS
        .iter()
        .flat_map(|(_, kws)| kws.iter().copied())
        .collect();

    let remainder: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !STOPWORDS.contains(t) && !keyword_tokens.contains(t))
        .collect();

    if remainder.is_empty() {
        None
    } else {
        Some(remainder.join(" "))
    }
}

/// Classifies user text into a [`Task`]. This is a total function:
/// unparseable input yields [`TaskType::Generic`].
///
/// Resolution order: explicit slash command, then keyword scoring with
/// the leading verb weighted double, then `Generic`.
pub fn parse_intent(text: &str) -> Task {
    let trimmed = text.trim();

    let (task_type, subject_source) = match match_slash(trimmed) {
        Some(tt) => {
            // Drop the command token; the rest feeds subject extraction.
            let rest = trimmed
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest)
                .unwrap_or("");
            (tt, rest.to_string())
        }
        None => {
            let tokens = tokenize(trimmed);
            (classify_keywords(&tokens), trimmed.to_string())
        }
    };

    let mut task = Task::new(task_type, text);
    let tokens = tokenize(&subject_source);
    if let Some(subject) = extract_subject(&subject_source, &tokens) {
        task.params.insert("subject".to_string(), subject);
    }
    task
}
