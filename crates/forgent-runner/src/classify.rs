use regex::Regex;
use std::sync::OnceLock;

/// Number of trailing stderr lines inspected.
pub const STDERR_TAIL_LINES: usize = 200;

/// What the crash looks like. Variants are checked in declaration
/// order; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Python import failure. Carries the missing module name.
    MissingPyModule(String),
    /// Node import failure. Carries the missing module name.
    MissingNodeModule(String),
    /// The listen port is already bound.
    PortInUse,
    /// A syntax error. Not retryable.
    SyntaxError,
    /// Nothing recognized.
    Unknown,
}

#[allow(clippy::unwrap_used)]
fn py_module_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"ModuleNotFoundError: No module named '([^']+)'").unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn node_module_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Cannot find module '([^']+)'").unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn port_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)EADDRINUSE|port\s+\S+\s+(?:is\s+)?(?:already\s+)?in use").unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn syntax_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"SyntaxError|Unexpected token|error: expected").unwrap()
    })
}

/// The last [`STDERR_TAIL_LINES`] lines of stderr.
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Classifies a non-zero exit from its stderr tail.
pub fn classify(stderr: &str) -> Classification {
    let tail = stderr_tail(stderr);

    if let Some(caps) = py_module_re().captures(&tail) {
        if let Some(module) = caps.get(1) {
            return Classification::MissingPyModule(module.as_str().to_string());
        }
    }
    if let Some(caps) = node_module_re().captures(&tail) {
        if let Some(module) = caps.get(1) {
            return Classification::MissingNodeModule(module.as_str().to_string());
        }
    }
    if port_re().is_match(&tail) {
        return Classification::PortInUse;
    }
    if syntax_re().is_match(&tail) {
        return Classification::SyntaxError;
    }
    Classification::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_module() {
        let stderr = "Traceback (most recent call last):\nModuleNotFoundError: No module named 'requests'";
        assert_eq!(
            classify(stderr),
            Classification::MissingPyModule("requests".to_string())
        );
    }

    #[test]
    fn test_node_module() {
        let stderr = "Error: Cannot find module 'express'\n    at Function.Module";
        assert_eq!(
            classify(stderr),
            Classification::MissingNodeModule("express".to_string())
        );
    }

    #[test]
    fn test_port_in_use() {
        assert_eq!(
            classify("Error: listen EADDRINUSE: address already in use :::3000"),
            Classification::PortInUse
        );
        assert_eq!(
            classify("OSError: port 8000 is already in use"),
            Classification::PortInUse
        );
    }

    #[test]
    fn test_syntax_error() {
        assert_eq!(
            classify("  File \"app.py\", line 3\nSyntaxError: invalid syntax"),
            Classification::SyntaxError
        );
    }

    #[test]
    fn test_first_match_wins() {
        // Both a module error and a syntax error: classification order
        // picks the module error.
        let stderr = "SyntaxError mention\nModuleNotFoundError: No module named 'flask'";
        assert_eq!(
            classify(stderr),
            Classification::MissingPyModule("flask".to_string())
        );
    }

    #[test]
    fn test_unknown() {
        assert_eq!(classify("segmentation fault"), Classification::Unknown);
    }

    #[test]
    fn test_tail_bounds() {
        let long: String = (0..500).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&long);
        assert_eq!(tail.lines().count(), STDERR_TAIL_LINES);
        assert!(tail.starts_with("line 300"));
    }
}
