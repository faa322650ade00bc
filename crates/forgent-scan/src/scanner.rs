use crate::types::{
    FileRecord, FileRole, Language, PackageManager, ProjectFingerprint, RiskFlag, RiskSeverity,
    ScanDepth, ScanResult,
};
use forgent_core::{ForgentError, ForgentResult};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Hard cap on the number of files classified per scan.
pub const MAX_FILES: usize = 50_000;

/// Files larger than this are recorded but not content-parsed.
const MAX_PARSE_BYTES: u64 = 1_048_576;

/// Directory names skipped by default.
const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".state",
    ".idea",
    ".vscode",
];

/// Entry point stems recognized across stacks.
const ENTRYPOINT_STEMS: &[&str] = &["main", "index", "app"];

/// Framework markers looked up in manifest dependency tables.
const JS_FRAMEWORKS: &[&str] = &["react", "vue", "angular", "express", "next", "svelte", "fastify"];
const PY_FRAMEWORKS: &[&str] = &["django", "flask", "fastapi"];
const RS_FRAMEWORKS: &[&str] = &["axum", "actix-web", "rocket"];

#[allow(clippy::unwrap_used)]
fn js_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?:import\s+[^'"]*?from\s+['"]([^'"]+)['"]|import\s+['"]([^'"]+)['"]|require\(\s*['"]([^'"]+)['"]\s*\))"#,
        )
        .unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn py_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:from\s+([\w\.]+)\s+import|import\s+([\w\.]+))").unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn rs_mod_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:pub\s+)?mod\s+(\w+)\s*;").unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn rs_use_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*use\s+crate::(\w+)").unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn go_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*(?:import\s+)?"([^"]+)""#).unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn secret_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)(secret|token|password|api_key|credential)\s*[:=]\s*["'][^"']{8,}["']"#)
            .unwrap()
    })
}

#[allow(clippy::unwrap_used)]
fn eval_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\beval\s*\(").unwrap()
    })
}

/// Walks a workspace and produces a [`ScanResult`].
///
/// The fingerprint is a pure function of the filesystem snapshot, the
/// ignore list, and the depth: files are visited in sorted order and
/// every emitted collection is either sorted or order-stable.
pub struct Scanner {
    ignores: BTreeSet<String>,
}

impl Scanner {
    /// Creates a scanner with the default ignore list.
    pub fn new() -> Self {
        Self {
            ignores: DEFAULT_IGNORES.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Adds extra directory names to the ignore list.
    pub fn with_ignores<I: IntoIterator<Item = String>>(mut self, extra: I) -> Self {
        self.ignores.extend(extra);
        self
    }

    /// Scans the workspace rooted at `root`.
    ///
    /// A missing root is the only fatal failure; per-file I/O errors
    /// degrade to `warning` risk flags.
    pub fn scan(&self, root: &Path, depth: ScanDepth) -> ForgentResult<ScanResult> {
        if !root.is_dir() {
            return Err(ForgentError::Scan(format!(
                "scan-missing-root: {}",
                root.display()
            )));
        }

        let max_level = match depth {
            ScanDepth::Shallow => 2,
            ScanDepth::Deep => usize::MAX,
        };

        let mut flags = Vec::new();
        let mut rel_paths = Vec::new();
        self.walk(root, PathBuf::new(), 1, max_level, &mut rel_paths, &mut flags);
        rel_paths.sort();

        if rel_paths.len() > MAX_FILES {
            rel_paths.truncate(MAX_FILES);
            flags.push(RiskFlag {
                severity: RiskSeverity::Info,
                file: String::new(),
                issue: "file-cap-reached".to_string(),
                recommendation: format!(
                    "Classification truncated at {MAX_FILES} files; narrow the scan root or extend the ignore list"
                ),
            });
        }

        let known: BTreeSet<String> = rel_paths.iter().cloned().collect();
        let mut files = Vec::with_capacity(rel_paths.len());

        for rel in &rel_paths {
            let abs = root.join(rel);
            let language = abs
                .extension()
                .and_then(|e| e.to_str())
                .map(Language::from_extension)
                .unwrap_or(Language::Unknown);

            let content = match self.read_for_parse(&abs) {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %rel, error = %e, "Unreadable file during scan");
                    flags.push(RiskFlag {
                        severity: RiskSeverity::Warning,
                        file: rel.clone(),
                        issue: "file-unreadable".to_string(),
                        recommendation: format!("Check permissions: {e}"),
                    });
                    None
                }
            };

            let lines = content.as_deref().map(count_lines).unwrap_or(0);

            let imports = match (depth, &content) {
                (ScanDepth::Deep, Some(text)) if language.is_source() => {
                    extract_imports(rel, language, text, &known)
                }
                _ => BTreeSet::new(),
            };

            if let Some(text) = &content {
                scan_risks(rel, language, text, &mut flags);
            }

            files.push(FileRecord {
                path: rel.clone(),
                language,
                lines,
                role: classify_role(rel, language),
                imports,
            });
        }

        let entrypoints = rank_entrypoints(&files);
        let entry_set: BTreeSet<&str> = entrypoints.iter().map(String::as_str).collect();
        for file in &mut files {
            if entry_set.contains(file.path.as_str()) {
                file.role = FileRole::Entrypoint;
            }
        }

        let mut languages: BTreeSet<String> = files
            .iter()
            .filter(|f| f.language.is_source())
            .map(|f| f.language.name().to_string())
            .collect();
        apply_signature_overrides(root, &files, &mut languages);

        let fingerprint = ProjectFingerprint {
            languages,
            frameworks: detect_frameworks(root),
            package_manager: detect_package_manager(root),
            entrypoints,
            risk_flags: flags,
        };

        debug!(
            files = files.len(),
            languages = fingerprint.languages.len(),
            entrypoints = fingerprint.entrypoints.len(),
            "Scan complete"
        );

        Ok(ScanResult { fingerprint, files })
    }

    fn read_for_parse(&self, abs: &Path) -> std::io::Result<Option<String>> {
        let meta = std::fs::metadata(abs)?;
        if meta.len() > MAX_PARSE_BYTES {
            return Ok(None);
        }
        let bytes = std::fs::read(abs)?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn walk(
        &self,
        root: &Path,
        rel: PathBuf,
        level: usize,
        max_level: usize,
        out: &mut Vec<String>,
        flags: &mut Vec<RiskFlag>,
    ) {
        let dir = root.join(&rel);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Unreadable directory during scan");
                flags.push(RiskFlag {
                    severity: RiskSeverity::Warning,
                    file: rel.to_string_lossy().replace('\\', "/"),
                    issue: "dir-unreadable".to_string(),
                    recommendation: format!("Check permissions: {e}"),
                });
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let child_rel = rel.join(name.as_ref());

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(_) => continue,
            };

            if file_type.is_dir() {
                if self.ignores.contains(name.as_ref()) {
                    continue;
                }
                if level < max_level {
                    self.walk(root, child_rel, level + 1, max_level, out, flags);
                }
            } else if file_type.is_file() {
                out.push(child_rel.to_string_lossy().replace('\\', "/"));
            }
            // Symlinks are skipped: the scanner never follows them out of
            // the workspace.
        }
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        0
    } else {
        text.lines().count()
    }
}

fn classify_role(path: &str, language: Language) -> FileRole {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let lower = file_name.to_lowercase();

    let in_test_dir = path.split('/').any(|seg| {
        matches!(seg, "tests" | "test" | "__tests__" | "spec")
    });
    if in_test_dir
        || lower.contains(".test.")
        || lower.contains(".spec.")
        || lower.starts_with("test_")
        || lower.ends_with("_test.py")
        || lower.ends_with("_test.go")
    {
        return FileRole::Test;
    }

    if language == Language::Config {
        return FileRole::Config;
    }

    FileRole::Module
}

#[allow(clippy::unwrap_used)]
fn rank_entrypoints(files: &[FileRecord]) -> Vec<String> {
    static GO_CMD_RE: OnceLock<Regex> = OnceLock::new();
    let go_cmd = GO_CMD_RE.get_or_init(|| {
        Regex::new(r"^cmd/[^/]+/main\.go$").unwrap()
    });

    let mut candidates: Vec<&FileRecord> = files
        .iter()
        .filter(|f| f.language.is_source())
        .filter(|f| {
            let file_name = f.path.rsplit('/').next().unwrap_or(&f.path);
            let stem = file_name.rsplit_once('.').map(|(s, _)| s).unwrap_or(file_name);
            ENTRYPOINT_STEMS.contains(&stem)
                || f.path == "src/main.rs"
                || go_cmd.is_match(&f.path)
        })
        .collect();

    // Shallower wins; ties lexicographic.
    candidates.sort_by(|a, b| {
        let depth_a = a.path.matches('/').count();
        let depth_b = b.path.matches('/').count();
        depth_a.cmp(&depth_b).then_with(|| a.path.cmp(&b.path))
    });

    candidates.into_iter().map(|f| f.path.clone()).collect()
}

fn extract_imports(
    rel: &str,
    language: Language,
    text: &str,
    known: &BTreeSet<String>,
) -> BTreeSet<String> {
    let mut edges = BTreeSet::new();
    let dir = rel.rsplit_once('/').map(|(d, _)| d).unwrap_or("");

    match language {
        Language::JavaScript | Language::TypeScript => {
            for caps in js_import_re().captures_iter(text) {
                let spec = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str());
                if let Some(spec) = spec {
                    edges.insert(resolve_js(dir, spec, known));
                }
            }
        }
        Language::Python => {
            for line in text.lines() {
                if let Some(caps) = py_import_re().captures(line) {
                    if let Some(module) =
                        caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())
                    {
                        edges.insert(resolve_py(module, known));
                    }
                }
            }
        }
        Language::Rust => {
            for line in text.lines() {
                if let Some(caps) = rs_mod_re().captures(line) {
                    if let Some(name) = caps.get(1).map(|m| m.as_str()) {
                        edges.insert(resolve_rs(dir, name, known));
                    }
                } else if let Some(caps) = rs_use_re().captures(line) {
                    if let Some(name) = caps.get(1).map(|m| m.as_str()) {
                        edges.insert(resolve_rs("src", name, known));
                    }
                }
            }
        }
        Language::Go => {
            for line in text.lines() {
                if let Some(caps) = go_import_re().captures(line) {
                    if let Some(pkg) = caps.get(1).map(|m| m.as_str()) {
                        edges.insert(pkg.to_string());
                    }
                }
            }
        }
        _ => {}
    }

    // A module importing itself carries no information.
    edges.remove(rel);
    edges
}

fn join_rel(dir: &str, spec: &str) -> String {
    let mut parts: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    for seg in spec.split('/') {
        match seg {
            "." | "" => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn resolve_js(dir: &str, spec: &str, known: &BTreeSet<String>) -> String {
    if !spec.starts_with('.') {
        // Bare specifier: a package import, kept as a dangling edge.
        return spec.to_string();
    }
    let base = join_rel(dir, spec);
    let candidates = [
        base.clone(),
        format!("{base}.ts"),
        format!("{base}.tsx"),
        format!("{base}.js"),
        format!("{base}.jsx"),
        format!("{base}/index.ts"),
        format!("{base}/index.js"),
    ];
    for candidate in &candidates {
        if known.contains(candidate) {
            return candidate.clone();
        }
    }
    base
}

fn resolve_py(module: &str, known: &BTreeSet<String>) -> String {
    let base = module.trim_start_matches('.').replace('.', "/");
    let candidates = [format!("{base}.py"), format!("{base}/__init__.py")];
    for candidate in &candidates {
        if known.contains(candidate) {
            return candidate.clone();
        }
    }
    module.to_string()
}

fn resolve_rs(dir: &str, name: &str, known: &BTreeSet<String>) -> String {
    let candidates = [
        join_rel(dir, &format!("{name}.rs")),
        join_rel(dir, &format!("{name}/mod.rs")),
    ];
    for candidate in &candidates {
        if known.contains(candidate) {
            return candidate.clone();
        }
    }
    candidates[0].clone()
}

fn scan_risks(rel: &str, language: Language, text: &str, flags: &mut Vec<RiskFlag>) {
    if language.is_source() || language == Language::Config {
        if secret_re().is_match(text) {
            flags.push(RiskFlag {
                severity: RiskSeverity::Warning,
                file: rel.to_string(),
                issue: "hardcoded-secret".to_string(),
                recommendation: "Move the literal into an environment variable or secret store"
                    .to_string(),
            });
        }
    }

    if matches!(
        language,
        Language::JavaScript | Language::TypeScript | Language::Python
    ) && eval_re().is_match(text)
    {
        flags.push(RiskFlag {
            severity: RiskSeverity::Warning,
            file: rel.to_string(),
            issue: "eval-usage".to_string(),
            recommendation: "Replace eval with explicit parsing or dispatch".to_string(),
        });
    }
}

fn apply_signature_overrides(root: &Path, files: &[FileRecord], languages: &mut BTreeSet<String>) {
    if root.join("package.json").is_file() {
        // The manifest forces a JS/TS classification even when most files
        // are something else (e.g. generated output).
        let has_ts = files.iter().any(|f| f.language == Language::TypeScript);
        if has_ts || root.join("tsconfig.json").is_file() {
            languages.insert("typescript".to_string());
        } else {
            languages.insert("javascript".to_string());
        }
    }
    if root.join("Cargo.toml").is_file() {
        languages.insert("rust".to_string());
    }
    if root.join("go.mod").is_file() {
        languages.insert("go".to_string());
    }
    if root.join("pyproject.toml").is_file() || root.join("requirements.txt").is_file() {
        languages.insert("python".to_string());
    }
}

fn detect_package_manager(root: &Path) -> PackageManager {
    let checks: &[(&str, PackageManager)] = &[
        ("pnpm-lock.yaml", PackageManager::Pnpm),
        ("yarn.lock", PackageManager::Yarn),
        ("package-lock.json", PackageManager::Npm),
        ("package.json", PackageManager::Npm),
        ("poetry.lock", PackageManager::Poetry),
        ("pyproject.toml", PackageManager::Poetry),
        ("requirements.txt", PackageManager::Pip),
        ("Cargo.toml", PackageManager::Cargo),
        ("go.mod", PackageManager::Go),
    ];
    for (file, pm) in checks {
        if root.join(file).is_file() {
            return *pm;
        }
    }
    PackageManager::None
}

fn detect_frameworks(root: &Path) -> BTreeSet<String> {
    let mut found = BTreeSet::new();

    if let Ok(raw) = std::fs::read_to_string(root.join("package.json")) {
        if let Ok(manifest) = serde_json::from_str::<serde_json::Value>(&raw) {
            let mut dep_names: BTreeSet<String> = BTreeSet::new();
            for table in ["dependencies", "devDependencies"] {
                if let Some(deps) = manifest.get(table).and_then(|d| d.as_object()) {
                    dep_names.extend(deps.keys().cloned());
                }
            }
            for marker in JS_FRAMEWORKS {
                if dep_names.contains(*marker) {
                    found.insert((*marker).to_string());
                }
            }
        }
    }

    for manifest in ["requirements.txt", "pyproject.toml"] {
        if let Ok(raw) = std::fs::read_to_string(root.join(manifest)) {
            let lower = raw.to_lowercase();
            for marker in PY_FRAMEWORKS {
                if lower.contains(marker) {
                    found.insert((*marker).to_string());
                }
            }
        }
    }

    if let Ok(raw) = std::fs::read_to_string(root.join("Cargo.toml")) {
        for marker in RS_FRAMEWORKS {
            if raw.contains(marker) {
                found.insert((*marker).to_string());
            }
        }
    }

    found
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_root() {
        let scanner = Scanner::new();
        let err = scanner
            .scan(Path::new("/nonexistent/forgent-root"), ScanDepth::Deep)
            .unwrap_err();
        assert!(err.to_string().contains("scan-missing-root"));
    }

    #[test]
    fn test_empty_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let result = Scanner::new().scan(dir.path(), ScanDepth::Deep).unwrap();
        assert!(result.files.is_empty());
        assert!(result.fingerprint.languages.is_empty());
        assert_eq!(result.fingerprint.package_manager, PackageManager::None);
        assert!(result.fingerprint.entrypoints.is_empty());
    }

    #[test]
    fn test_typescript_project() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "package.json",
            r#"{"dependencies": {"react": "^18.0.0"}}"#,
        );
        write(dir.path(), "src/index.ts", "import { app } from './app';\n");
        write(dir.path(), "src/app.ts", "export const app = 1;\n");

        let result = Scanner::new().scan(dir.path(), ScanDepth::Deep).unwrap();
        assert!(result.fingerprint.languages.contains("typescript"));
        assert!(result.fingerprint.frameworks.contains("react"));
        assert_eq!(result.fingerprint.package_manager, PackageManager::Npm);

        let index = result
            .files
            .iter()
            .find(|f| f.path == "src/index.ts")
            .unwrap();
        assert_eq!(index.role, FileRole::Entrypoint);
        assert!(index.imports.contains("src/app.ts"));
    }

    #[test]
    fn test_dangling_import_does_not_fail() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.py", "import missing_module\n");

        let result = Scanner::new().scan(dir.path(), ScanDepth::Deep).unwrap();
        let main = result.files.iter().find(|f| f.path == "main.py").unwrap();
        assert!(main.imports.contains("missing_module"));
    }

    #[test]
    fn test_python_resolved_import() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.py", "from helpers import util\n");
        write(dir.path(), "helpers.py", "util = 1\n");

        let result = Scanner::new().scan(dir.path(), ScanDepth::Deep).unwrap();
        let main = result.files.iter().find(|f| f.path == "main.py").unwrap();
        assert!(main.imports.contains("helpers.py"));
    }

    #[test]
    fn test_ignore_list() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "node_modules/lib/index.js", "x");
        write(dir.path(), "src/index.js", "x");

        let result = Scanner::new().scan(dir.path(), ScanDepth::Deep).unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].path, "src/index.js");
    }

    #[test]
    fn test_entrypoint_ranking_prefers_shallow() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.py", "print(1)\n");
        write(dir.path(), "deep/nested/main.py", "print(2)\n");

        let result = Scanner::new().scan(dir.path(), ScanDepth::Deep).unwrap();
        assert_eq!(result.fingerprint.entrypoints[0], "main.py");
    }

    #[test]
    fn test_test_role_detection() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tests/test_auth.py", "def test_x(): pass\n");
        write(dir.path(), "src/auth.test.ts", "it('works', () => {});\n");

        let result = Scanner::new().scan(dir.path(), ScanDepth::Deep).unwrap();
        for file in &result.files {
            assert_eq!(file.role, FileRole::Test, "path: {}", file.path);
        }
    }

    #[test]
    fn test_secret_risk_flag() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "config.py",
            "API_KEY = \"sk-abcdef1234567890\"\n",
        );

        let result = Scanner::new().scan(dir.path(), ScanDepth::Deep).unwrap();
        assert!(result
            .fingerprint
            .risk_flags
            .iter()
            .any(|f| f.issue == "hardcoded-secret" && f.file == "config.py"));
    }

    #[test]
    fn test_shallow_skips_imports_and_depth() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/b/c/deep.py", "import os\n");
        write(dir.path(), "top.py", "import sys\n");

        let result = Scanner::new().scan(dir.path(), ScanDepth::Shallow).unwrap();
        assert!(result.files.iter().all(|f| f.imports.is_empty()));
        assert!(result.files.iter().all(|f| f.path != "a/b/c/deep.py"));
    }

    #[test]
    fn test_scan_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/index.js", "require('./app')\n");
        write(dir.path(), "src/app.js", "module.exports = {}\n");
        write(dir.path(), "package.json", "{}");

        let scanner = Scanner::new();
        let first = scanner.scan(dir.path(), ScanDepth::Deep).unwrap();
        let second = scanner.scan(dir.path(), ScanDepth::Deep).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
