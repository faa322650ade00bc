use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Programming language inferred for a scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// `.js`, `.jsx`, `.mjs`, `.cjs`
    JavaScript,
    /// `.ts`, `.tsx`
    TypeScript,
    /// `.py`
    Python,
    /// `.rs`
    Rust,
    /// `.go`
    Go,
    /// `.java`
    Java,
    /// `.rb`
    Ruby,
    /// `.html`, `.css` and friends
    Markup,
    /// `.json`, `.toml`, `.yaml`, `.ini`
    Config,
    /// `.sh`, `.bash`
    Shell,
    /// `.md`, `.txt`
    Doc,
    /// Anything else
    Unknown,
}

impl Language {
    /// Infers a language from a file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "py" => Language::Python,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "java" => Language::Java,
            "rb" => Language::Ruby,
            "html" | "htm" | "css" | "scss" | "vue" | "svelte" => Language::Markup,
            "json" | "toml" | "yaml" | "yml" | "ini" | "env" => Language::Config,
            "sh" | "bash" | "zsh" => Language::Shell,
            "md" | "txt" | "rst" => Language::Doc,
            _ => Language::Unknown,
        }
    }

    /// Whether files of this language count as source code.
    pub fn is_source(self) -> bool {
        matches!(
            self,
            Language::JavaScript
                | Language::TypeScript
                | Language::Python
                | Language::Rust
                | Language::Go
                | Language::Java
                | Language::Ruby
        )
    }

    /// Lower-case display name used in the fingerprint language set.
    pub fn name(self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Ruby => "ruby",
            Language::Markup => "markup",
            Language::Config => "config",
            Language::Shell => "shell",
            Language::Doc => "doc",
            Language::Unknown => "unknown",
        }
    }
}

/// The detected role of a file within the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    /// A program entry point (`main.*`, `index.*`, …).
    Entrypoint,
    /// A regular source module.
    Module,
    /// A test file.
    Test,
    /// Build or runtime configuration.
    Config,
}

/// One scanned file. Immutable per scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the workspace root, `/`-separated.
    pub path: String,
    /// Inferred language.
    pub language: Language,
    /// Size in lines.
    pub lines: usize,
    /// Detected role.
    pub role: FileRole,
    /// Outgoing import edges: resolved relative paths or dangling
    /// specifiers that did not match a scanned file.
    pub imports: BTreeSet<String>,
}

/// Detected package manager for the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// `package-lock.json` or bare `package.json`
    Npm,
    /// `pnpm-lock.yaml`
    Pnpm,
    /// `yarn.lock`
    Yarn,
    /// `requirements.txt`
    Pip,
    /// `poetry.lock` / `pyproject.toml`
    Poetry,
    /// `Cargo.toml`
    Cargo,
    /// `go.mod`
    Go,
    /// Nothing detected
    None,
}

/// Severity of a scanner risk flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskSeverity {
    /// Must be addressed before shipping.
    Critical,
    /// Should be reviewed.
    Warning,
    /// Informational only.
    Info,
}

/// A single finding from the scanner's risk pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFlag {
    /// Finding severity.
    pub severity: RiskSeverity,
    /// File the finding applies to, when file-scoped.
    pub file: String,
    /// Short machine-stable issue label.
    pub issue: String,
    /// Suggested remediation.
    pub recommendation: String,
}

/// Structural summary of a scanned project. Immutable per scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFingerprint {
    /// Languages present in source files.
    pub languages: BTreeSet<String>,
    /// Framework markers found in manifests.
    pub frameworks: BTreeSet<String>,
    /// Detected package manager.
    pub package_manager: PackageManager,
    /// Entry points ordered by rank (shallower wins, ties lexicographic).
    pub entrypoints: Vec<String>,
    /// Risk findings in emission order.
    pub risk_flags: Vec<RiskFlag>,
}

impl ProjectFingerprint {
    /// An empty fingerprint, as produced for an empty workspace.
    pub fn empty() -> Self {
        Self {
            languages: BTreeSet::new(),
            frameworks: BTreeSet::new(),
            package_manager: PackageManager::None,
            entrypoints: Vec::new(),
            risk_flags: Vec::new(),
        }
    }
}

/// How deep the scanner walks and whether imports are extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanDepth {
    /// Two directory levels, no import extraction.
    Shallow,
    /// Full walk with import extraction.
    Deep,
}

/// The output of one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Structural summary.
    pub fingerprint: ProjectFingerprint,
    /// All scanned file records, sorted by path.
    pub files: Vec<FileRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_extension("ts"), Language::TypeScript);
        assert_eq!(Language::from_extension("RS"), Language::Rust);
        assert_eq!(Language::from_extension("xyz"), Language::Unknown);
    }

    #[test]
    fn test_is_source() {
        assert!(Language::Python.is_source());
        assert!(!Language::Config.is_source());
        assert!(!Language::Doc.is_source());
    }

    #[test]
    fn test_empty_fingerprint() {
        let fp = ProjectFingerprint::empty();
        assert!(fp.languages.is_empty());
        assert_eq!(fp.package_manager, PackageManager::None);
    }
}
