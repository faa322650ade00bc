use crate::insight::{
    Architecture, Complexity, CriticalReason, Insight, InsightDetail, LongCotReport, ReportStats,
};
use chrono::Utc;
use forgent_scan::{FileRecord, ProjectFingerprint};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Minimum rubric support for a hypothesis to be retained over `unknown`.
const ARCH_MIN: f64 = 0.5;

/// Filename keywords used to infer module purpose.
const PURPOSE_KEYWORDS: &[&str] = &[
    "agent",
    "api",
    "auth",
    "cli",
    "client",
    "config",
    "controller",
    "core",
    "database",
    "db",
    "engine",
    "handler",
    "model",
    "orchestrator",
    "parser",
    "queue",
    "route",
    "scan",
    "scanner",
    "schema",
    "server",
    "service",
    "test",
    "ui",
    "util",
    "view",
    "worker",
]; // kept sorted so tie-breaks are lexicographic by construction

/// Name of the synthetic module holding root-level files.
const ROOT_MODULE: &str = "<root>";

/// One rubric signal for an architecture hypothesis.
struct Cue {
    name: &'static str,
    weight: f64,
    matched: bool,
    evidence: Vec<String>,
}

/// The outcome of Phase 1 for one pass.
struct ArchSelection {
    architecture: Architecture,
    support: f64,
    runner_up: f64,
    matched_cues: Vec<&'static str>,
    evidence: Vec<String>,
}

/// Structural signals extracted once per pass.
struct Signals {
    dirs: BTreeSet<String>,
    source_count: usize,
    entrypoints: Vec<String>,
    frameworks: BTreeSet<String>,
    manifest_dirs: BTreeSet<String>,
    has_compose: bool,
    stems: Vec<String>,
}

impl Signals {
    fn gather(fingerprint: &ProjectFingerprint, files: &[FileRecord]) -> Self {
        let mut dirs = BTreeSet::new();
        let mut manifest_dirs = BTreeSet::new();
        let mut has_compose = false;
        let mut stems = Vec::new();

        for file in files {
            if let Some((top, _)) = file.path.split_once('/') {
                dirs.insert(top.to_lowercase());
            }
            let file_name = file.path.rsplit('/').next().unwrap_or(&file.path);
            if matches!(
                file_name,
                "package.json" | "Cargo.toml" | "go.mod" | "pyproject.toml"
            ) {
                manifest_dirs.insert(module_of(&file.path));
            }
            if file_name == "docker-compose.yml" || file_name == "docker-compose.yaml" {
                has_compose = true;
            }
            let stem = file_name
                .rsplit_once('.')
                .map(|(s, _)| s)
                .unwrap_or(file_name);
            stems.push(stem.to_lowercase());
        }

        Self {
            dirs,
            source_count: files.iter().filter(|f| f.language.is_source()).count(),
            entrypoints: fingerprint.entrypoints.clone(),
            frameworks: fingerprint.frameworks.clone(),
            manifest_dirs,
            has_compose,
            stems,
        }
    }

    fn has_dir_among(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.dirs.contains(*n))
    }

    fn stems_containing(&self, fragments: &[&str]) -> usize {
        self.stems
            .iter()
            .filter(|s| fragments.iter().any(|f| s.contains(f)))
            .count()
    }

    fn has_stem(&self, exact: &str) -> bool {
        self.stems.iter().any(|s| s == exact)
    }

    fn entry_depth_at_most(&self, max: usize) -> bool {
        self.entrypoints
            .first()
            .map(|e| e.matches('/').count() <= max)
            .unwrap_or(false)
    }
}

fn module_of(path: &str) -> String {
    match path.split_once('/') {
        Some((top, _)) => top.to_string(),
        None => ROOT_MODULE.to_string(),
    }
}

fn evidence_under(files: &[FileRecord], dirs: &[&str], limit: usize) -> Vec<String> {
    files
        .iter()
        .filter(|f| {
            dirs.iter()
                .any(|d| f.path.to_lowercase().starts_with(&format!("{d}/")))
        })
        .take(limit)
        .map(|f| f.path.clone())
        .collect()
}

fn evidence_matching(files: &[FileRecord], fragments: &[&str], limit: usize) -> Vec<String> {
    files
        .iter()
        .filter(|f| {
            let lower = f.path.to_lowercase();
            fragments.iter().any(|frag| lower.contains(frag))
        })
        .take(limit)
        .map(|f| f.path.clone())
        .collect()
}

/// The four-phase Tree-of-Thought analyzer.
///
/// Reasoning operates on scan summaries rather than file contents, so
/// context pressure grows with module count, not file count. The
/// analyzer never fails: degraded inputs produce an `unknown`
/// hypothesis with zero confidence.
pub struct Analyzer {
    backtrack_threshold: f64,
    max_backtracks: u32,
}

impl Analyzer {
    /// Creates an analyzer with explicit thresholds.
    pub fn new(backtrack_threshold: f64, max_backtracks: u32) -> Self {
        Self {
            backtrack_threshold,
            max_backtracks,
        }
    }

    /// Runs all four phases, backtracking at most `max_backtracks`
    /// times when the reflection reward falls below the threshold.
    pub fn analyze(&self, fingerprint: &ProjectFingerprint, files: &[FileRecord]) -> LongCotReport {
        if files.is_empty() {
            return LongCotReport::no_project();
        }

        let mut masked: BTreeSet<&'static str> = BTreeSet::new();
        let mut backtrack_count = 0u32;
        let mut reflection_count = 0u32;

        loop {
            let signals = Signals::gather(fingerprint, files);
            let selection = phase_architecture(&signals, files, &masked);
            let modules = phase_modules(files, &selection);
            let critical = phase_critical(fingerprint, files);
            reflection_count += 1;

            let avg = reflect(&selection, &modules, &critical);

            if avg < self.backtrack_threshold && backtrack_count < self.max_backtracks {
                backtrack_count += 1;
                info!(
                    avg_confidence = avg,
                    backtrack = backtrack_count,
                    discarded = %selection.architecture,
                    "Reflection below threshold, masking cues and re-reasoning"
                );
                masked.extend(selection.matched_cues.iter().copied());
                continue;
            }

            return assemble_report(
                selection,
                modules,
                critical,
                avg,
                backtrack_count,
                reflection_count,
            );
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(0.55, 1)
    }
}

// --- Phase 1: architecture reasoning ---

fn rubric(arch: Architecture, signals: &Signals, files: &[FileRecord]) -> Vec<Cue> {
    let entry_count = signals.entrypoints.len();
    match arch {
        Architecture::MultiAgentSystem => vec![
            Cue {
                name: "mas:agent-dirs",
                weight: 0.4,
                matched: signals.has_dir_among(&["agents", "agent", "skills", "prompts"]),
                evidence: evidence_under(files, &["agents", "agent", "skills", "prompts"], 3),
            },
            Cue {
                name: "mas:agent-files",
                weight: 0.3,
                matched: signals.stems_containing(&["agent", "skill", "prompt"]) >= 2,
                evidence: evidence_matching(files, &["agent", "skill"], 3),
            },
            Cue {
                name: "mas:orchestrator-file",
                weight: 0.2,
                matched: signals.stems_containing(&["orchestrat", "coordinator"]) >= 1,
                evidence: evidence_matching(files, &["orchestrat", "coordinator"], 2),
            },
            Cue {
                name: "mas:has-entrypoint",
                weight: 0.1,
                matched: entry_count >= 1,
                evidence: signals.entrypoints.iter().take(1).cloned().collect(),
            },
        ],
        Architecture::Microservices => vec![
            Cue {
                name: "micro:service-manifests",
                weight: 0.5,
                matched: signals.manifest_dirs.len() >= 3,
                evidence: Vec::new(),
            },
            Cue {
                name: "micro:compose-file",
                weight: 0.3,
                matched: signals.has_compose,
                evidence: evidence_matching(files, &["docker-compose"], 1),
            },
            Cue {
                name: "micro:many-entrypoints",
                weight: 0.2,
                matched: entry_count >= 3,
                evidence: signals.entrypoints.iter().take(3).cloned().collect(),
            },
        ],
        Architecture::MonolithWebapp => vec![
            Cue {
                name: "webapp:framework",
                weight: 0.4,
                matched: !signals.frameworks.is_empty(),
                evidence: Vec::new(),
            },
            Cue {
                name: "webapp:mvc-dirs",
                weight: 0.4,
                matched: signals.has_dir_among(&[
                    "routes",
                    "views",
                    "templates",
                    "controllers",
                    "models",
                    "static",
                    "public",
                ]),
                evidence: evidence_under(files, &["routes", "views", "controllers", "models"], 3),
            },
            Cue {
                name: "webapp:single-entrypoint",
                weight: 0.2,
                matched: entry_count == 1,
                evidence: signals.entrypoints.clone(),
            },
        ],
        Architecture::ClientServer => vec![
            Cue {
                name: "cs:split-dirs",
                weight: 0.6,
                matched: (signals.dirs.contains("client") && signals.dirs.contains("server"))
                    || (signals.dirs.contains("frontend") && signals.dirs.contains("backend")),
                evidence: evidence_under(files, &["client", "server", "frontend", "backend"], 4),
            },
            Cue {
                name: "cs:dual-entrypoints",
                weight: 0.2,
                matched: entry_count == 2,
                evidence: signals.entrypoints.iter().take(2).cloned().collect(),
            },
            Cue {
                name: "cs:framework",
                weight: 0.2,
                matched: !signals.frameworks.is_empty(),
                evidence: Vec::new(),
            },
        ],
        Architecture::Library => vec![
            Cue {
                name: "lib:no-entrypoint",
                weight: 0.5,
                matched: entry_count == 0 && signals.source_count >= 1,
                evidence: Vec::new(),
            },
            Cue {
                name: "lib:src-layout",
                weight: 0.2,
                matched: signals.has_dir_among(&["src", "lib"]),
                evidence: evidence_under(files, &["src", "lib"], 2),
            },
            Cue {
                name: "lib:manifest",
                weight: 0.3,
                matched: !signals.manifest_dirs.is_empty(),
                evidence: Vec::new(),
            },
        ],
        Architecture::CliTool => vec![
            Cue {
                name: "cli:shallow-entrypoint",
                weight: 0.4,
                matched: signals.entry_depth_at_most(1),
                evidence: signals.entrypoints.iter().take(1).cloned().collect(),
            },
            Cue {
                name: "cli:cli-dirs",
                weight: 0.4,
                matched: signals.has_dir_among(&["cmd", "cli", "bin"]) || signals.has_stem("cli"),
                evidence: evidence_under(files, &["cmd", "cli", "bin"], 2),
            },
            Cue {
                name: "cli:small",
                weight: 0.2,
                matched: signals.source_count > 0 && signals.source_count < 100,
                evidence: Vec::new(),
            },
        ],
        Architecture::Pipeline => vec![
            Cue {
                name: "pipe:stage-dirs",
                weight: 0.6,
                matched: signals
                    .has_dir_among(&["stages", "pipeline", "pipelines", "etl", "jobs", "steps"]),
                evidence: evidence_under(files, &["stages", "pipeline", "etl", "jobs"], 3),
            },
            Cue {
                name: "pipe:stage-files",
                weight: 0.2,
                matched: signals.stems_containing(&["stage", "step", "job"]) >= 2,
                evidence: evidence_matching(files, &["stage", "step", "job"], 3),
            },
            Cue {
                name: "pipe:has-entrypoint",
                weight: 0.2,
                matched: entry_count >= 1,
                evidence: signals.entrypoints.iter().take(1).cloned().collect(),
            },
        ],
        Architecture::PluginSystem => vec![
            Cue {
                name: "plugin:plugin-dirs",
                weight: 0.6,
                matched: signals.has_dir_among(&["plugins", "extensions", "addons", "hooks"]),
                evidence: evidence_under(files, &["plugins", "extensions", "addons", "hooks"], 3),
            },
            Cue {
                name: "plugin:registry-file",
                weight: 0.2,
                matched: signals.stems_containing(&["registry", "plugin"]) >= 1,
                evidence: evidence_matching(files, &["registry", "plugin"], 2),
            },
            Cue {
                name: "plugin:manifest",
                weight: 0.2,
                matched: !signals.manifest_dirs.is_empty(),
                evidence: Vec::new(),
            },
        ],
        Architecture::Unknown => Vec::new(),
    }
}

fn phase_architecture(
    signals: &Signals,
    files: &[FileRecord],
    masked: &BTreeSet<&'static str>,
) -> ArchSelection {
    struct Scored {
        arch: Architecture,
        score: f64,
        matched: Vec<&'static str>,
        evidence: Vec<String>,
    }

    let mut scored: Vec<Scored> = Architecture::candidates()
        .iter()
        .map(|&arch| {
            let cues: Vec<Cue> = rubric(arch, signals, files)
                .into_iter()
                .filter(|c| !masked.contains(c.name))
                .collect();
            let total: f64 = cues.iter().map(|c| c.weight).sum();
            let hit: f64 = cues.iter().filter(|c| c.matched).map(|c| c.weight).sum();
            let score = if total > 0.0 { hit / total } else { 0.0 };
            let matched = cues
                .iter()
                .filter(|c| c.matched)
                .map(|c| c.name)
                .collect::<Vec<_>>();
            let mut evidence: Vec<String> = cues
                .iter()
                .filter(|c| c.matched)
                .flat_map(|c| c.evidence.iter().cloned())
                .collect();
            evidence.sort();
            evidence.dedup();
            Scored {
                arch,
                score,
                matched,
                evidence,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.arch.name().cmp(b.arch.name()))
    });
    // Breadth bound: only the strongest hypotheses stay under
    // consideration.
    scored.truncate(5);

    let runner_up = scored.get(1).map(|s| s.score).unwrap_or(0.0);
    let top = match scored.into_iter().next() {
        Some(top) => top,
        None => {
            return ArchSelection {
                architecture: Architecture::Unknown,
                support: 0.0,
                runner_up: 0.0,
                matched_cues: Vec::new(),
                evidence: Vec::new(),
            }
        }
    };

    if top.score >= ARCH_MIN {
        ArchSelection {
            architecture: top.arch,
            support: top.score,
            runner_up,
            matched_cues: top.matched,
            evidence: top.evidence,
        }
    } else {
        ArchSelection {
            architecture: Architecture::Unknown,
            support: top.score,
            runner_up,
            matched_cues: top.matched,
            evidence: top.evidence,
        }
    }
}

// --- Phase 2: module deep reasoning ---

struct ModuleAnalysis {
    name: String,
    complexity: Complexity,
    purpose: String,
    keyword_coverage: f64,
    confidence: f64,
    evidence: Vec<String>,
}

fn partition_modules<'a>(files: &'a [FileRecord]) -> BTreeMap<String, Vec<&'a FileRecord>> {
    let mut modules: BTreeMap<String, Vec<&FileRecord>> = BTreeMap::new();
    for file in files {
        modules.entry(module_of(&file.path)).or_default().push(file);
    }
    modules
}

fn module_graph(files: &[FileRecord]) -> BTreeMap<String, BTreeSet<String>> {
    let known: BTreeSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
    let mut edges: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for file in files {
        let from = module_of(&file.path);
        for import in &file.imports {
            // Dangling edges point outside the scanned set and carry no
            // module-graph information.
            if !known.contains(import.as_str()) {
                continue;
            }
            let to = module_of(import);
            if to != from {
                edges.entry(from.clone()).or_default().insert(to);
            }
        }
    }
    edges
}

fn in_degrees(
    modules: &BTreeMap<String, Vec<&FileRecord>>,
    edges: &BTreeMap<String, BTreeSet<String>>,
) -> BTreeMap<String, usize> {
    let mut degrees: BTreeMap<String, usize> =
        modules.keys().map(|m| (m.clone(), 0)).collect();
    for targets in edges.values() {
        for target in targets {
            if let Some(d) = degrees.get_mut(target) {
                *d += 1;
            }
        }
    }
    degrees
}

fn phase_modules(files: &[FileRecord], selection: &ArchSelection) -> Vec<ModuleAnalysis> {
    let modules = partition_modules(files);
    let edges = module_graph(files);
    let degrees = in_degrees(&modules, &edges);

    // Fan-in + fan-out per module, for the coupling bump.
    let coupling: BTreeMap<&String, usize> = modules
        .keys()
        .map(|m| {
            let fan_out = edges.get(m).map(BTreeSet::len).unwrap_or(0);
            let fan_in = degrees.get(m).copied().unwrap_or(0);
            (m, fan_in + fan_out)
        })
        .collect();
    let mut coupling_values: Vec<usize> = coupling.values().copied().collect();
    coupling_values.sort_unstable_by(|a, b| b.cmp(a));
    let quartile_idx = coupling_values.len() / 4;
    let coupling_threshold = coupling_values
        .get(quartile_idx)
        .copied()
        .unwrap_or(usize::MAX);

    let mut out = Vec::new();
    for (name, members) in &modules {
        let source: Vec<&&FileRecord> =
            members.iter().filter(|f| f.language.is_source()).collect();
        if source.is_empty() {
            continue;
        }

        let mut band = match source.len() {
            0..=9 => Complexity::Low,
            10..=50 => Complexity::Medium,
            _ => Complexity::High,
        };
        let own_coupling = coupling.get(name).copied().unwrap_or(0);
        if own_coupling > 0 && own_coupling >= coupling_threshold {
            band = band.bumped();
        }

        let (purpose, coverage) = infer_purpose(&source);

        let language_share = {
            let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
            for f in &source {
                *counts.entry(f.language.name()).or_default() += 1;
            }
            counts
                .values()
                .max()
                .map(|&m| m as f64 / source.len() as f64)
                .unwrap_or(0.0)
        };

        let confidence =
            (0.4 * coverage + 0.3 * language_share + 0.3 * selection.support).clamp(0.0, 1.0);

        out.push(ModuleAnalysis {
            name: name.clone(),
            complexity: band,
            purpose,
            keyword_coverage: coverage,
            confidence,
            evidence: source.iter().take(3).map(|f| f.path.clone()).collect(),
        });
    }

    out
}

fn infer_purpose(source: &[&&FileRecord]) -> (String, f64) {
    let mut hits: BTreeMap<&str, usize> = BTreeMap::new();
    let mut covered = 0usize;

    for file in source {
        let file_name = file.path.rsplit('/').next().unwrap_or(&file.path);
        let stem = file_name
            .rsplit_once('.')
            .map(|(s, _)| s)
            .unwrap_or(file_name)
            .to_lowercase();
        let mut any = false;
        for keyword in PURPOSE_KEYWORDS {
            if stem.contains(keyword) {
                *hits.entry(keyword).or_default() += 1;
                any = true;
            }
        }
        if any {
            covered += 1;
        }
    }

    let coverage = covered as f64 / source.len() as f64;
    // BTreeMap iteration is lexicographic, so keeping the first
    // strictly-greater count resolves ties to the smaller keyword.
    let mut best: Option<(&str, usize)> = None;
    for (keyword, count) in &hits {
        if best.map(|(_, c)| *count > c).unwrap_or(true) {
            best = Some((keyword, *count));
        }
    }
    let purpose = best
        .map(|(k, _)| k.to_string())
        .unwrap_or_else(|| "general".to_string());
    (purpose, coverage)
}

// --- Phase 3: critical path identification ---

struct CriticalModule {
    name: String,
    in_degree: usize,
    max_in_degree: usize,
    reasons: Vec<CriticalReason>,
}

fn phase_critical(fingerprint: &ProjectFingerprint, files: &[FileRecord]) -> Vec<CriticalModule> {
    let modules = partition_modules(files);
    let edges = module_graph(files);
    let degrees = in_degrees(&modules, &edges);
    let max_in_degree = degrees.values().copied().max().unwrap_or(0);

    let mut degree_values: Vec<usize> = degrees.values().copied().collect();
    degree_values.sort_unstable_by(|a, b| b.cmp(a));
    let quartile_idx = degree_values.len() / 4;
    let degree_threshold = degree_values.get(quartile_idx).copied().unwrap_or(usize::MAX);

    let entry_modules: BTreeSet<String> = fingerprint
        .entrypoints
        .iter()
        .map(|e| module_of(e))
        .collect();

    // Modules reachable from every entry module (full graph, cycles
    // permitted).
    let reachable_from_all: BTreeSet<String> = if entry_modules.is_empty() {
        BTreeSet::new()
    } else {
        let mut intersection: Option<BTreeSet<String>> = None;
        for entry in &entry_modules {
            let mut seen = BTreeSet::new();
            let mut stack = vec![entry.clone()];
            while let Some(current) = stack.pop() {
                if !seen.insert(current.clone()) {
                    continue;
                }
                if let Some(next) = edges.get(&current) {
                    for target in next {
                        stack.push(target.clone());
                    }
                }
            }
            seen.remove(entry);
            intersection = Some(match intersection {
                None => seen,
                Some(acc) => acc.intersection(&seen).cloned().collect(),
            });
        }
        intersection.unwrap_or_default()
    };

    let mut critical = Vec::new();
    for name in modules.keys() {
        let mut reasons = Vec::new();
        if entry_modules.contains(name) {
            reasons.push(CriticalReason::ContainsEntrypoint);
        }
        let in_degree = degrees.get(name).copied().unwrap_or(0);
        if in_degree > 0 && in_degree >= degree_threshold {
            reasons.push(CriticalReason::HighInDegree);
        }
        if reachable_from_all.contains(name) {
            reasons.push(CriticalReason::ReachableFromAllEntrypoints);
        }
        if !reasons.is_empty() {
            critical.push(CriticalModule {
                name: name.clone(),
                in_degree,
                max_in_degree,
                reasons,
            });
        }
    }

    critical.sort_by(|a, b| {
        b.in_degree
            .cmp(&a.in_degree)
            .then_with(|| a.name.cmp(&b.name))
    });
    critical
}

// --- Phase 4: reflection ---

fn arch_reward(selection: &ArchSelection) -> f64 {
    // Support, discounted when a competing hypothesis also matched.
    (selection.support - 0.3 * selection.runner_up).clamp(0.0, 1.0)
}

fn module_reward(module: &ModuleAnalysis) -> f64 {
    0.4 + 0.6 * module.keyword_coverage
}

fn critical_reward(module: &CriticalModule) -> f64 {
    if module.max_in_degree > 0 {
        0.5 + 0.5 * (module.in_degree as f64 / module.max_in_degree as f64)
    } else {
        0.6
    }
}

fn reflect(
    selection: &ArchSelection,
    modules: &[ModuleAnalysis],
    critical: &[CriticalModule],
) -> f64 {
    let mut rewards = vec![arch_reward(selection)];
    rewards.extend(modules.iter().map(module_reward));
    rewards.extend(critical.iter().map(critical_reward));
    rewards.iter().sum::<f64>() / rewards.len() as f64
}

fn assemble_report(
    selection: ArchSelection,
    modules: Vec<ModuleAnalysis>,
    critical: Vec<CriticalModule>,
    avg: f64,
    backtrack_count: u32,
    reflection_count: u32,
) -> LongCotReport {
    let now = Utc::now();
    let mut insights = Vec::new();

    insights.push(Insight {
        detail: InsightDetail::ArchitectureHypothesis {
            architecture: selection.architecture,
            support: selection.support,
            runner_up: selection.runner_up,
        },
        confidence: selection.support,
        evidence: selection.evidence.clone(),
        rationale: format!(
            "{} retained with support {:.2} (runner-up {:.2})",
            selection.architecture, selection.support, selection.runner_up
        ),
        timestamp: now,
    });

    for module in &modules {
        insights.push(Insight {
            detail: InsightDetail::ModuleAnalysis {
                module: module.name.clone(),
                complexity: module.complexity,
                purpose: module.purpose.clone(),
                keyword_coverage: module.keyword_coverage,
            },
            confidence: module.confidence,
            evidence: module.evidence.clone(),
            rationale: format!(
                "module {} is {:?} complexity, purpose {}",
                module.name, module.complexity, module.purpose
            ),
            timestamp: now,
        });
    }

    let critical_paths: Vec<String> = critical.iter().map(|c| c.name.clone()).collect();
    for module in &critical {
        insights.push(Insight {
            detail: InsightDetail::CriticalPath {
                module: module.name.clone(),
                in_degree: module.in_degree,
                reasons: module.reasons.clone(),
            },
            confidence: critical_reward(module),
            evidence: Vec::new(),
            rationale: format!(
                "module {} satisfies {} critical-path criteria",
                module.name,
                module.reasons.len()
            ),
            timestamp: now,
        });
    }

    insights.push(Insight {
        detail: InsightDetail::ValidationReflection {
            avg_reward: avg,
            backtracked: backtrack_count > 0,
        },
        confidence: avg,
        evidence: Vec::new(),
        rationale: format!(
            "mean reward {avg:.2} over {} insights after {backtrack_count} backtracks",
            insights.len()
        ),
        timestamp: now,
    });

    let stats = ReportStats {
        avg_confidence: avg,
        step_count: insights.len() as u32,
        reflection_count,
        backtrack_count,
    };

    debug!(
        architecture = %selection.architecture,
        avg_confidence = avg,
        steps = stats.step_count,
        "Analyzer report assembled"
    );

    LongCotReport {
        insights,
        stats,
        architecture: selection.architecture,
        critical_paths,
    }
}
