use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The closed taxonomy of architecture hypotheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Architecture {
    /// Agents, skills, and an orchestrating coordinator.
    MultiAgentSystem,
    /// Several independently deployable services.
    Microservices,
    /// A single web application.
    MonolithWebapp,
    /// Distinct client and server halves.
    ClientServer,
    /// A reusable library without an entry point.
    Library,
    /// A command-line tool.
    CliTool,
    /// Staged data or build processing.
    Pipeline,
    /// A host with discoverable plugins.
    PluginSystem,
    /// Nothing matched with sufficient support.
    Unknown,
}

impl Architecture {
    /// All concrete hypotheses, in scoring order. `Unknown` is the
    /// fallback and is never scored directly.
    pub fn candidates() -> &'static [Architecture] {
        &[
            Architecture::MultiAgentSystem,
            Architecture::Microservices,
            Architecture::MonolithWebapp,
            Architecture::ClientServer,
            Architecture::Library,
            Architecture::CliTool,
            Architecture::Pipeline,
            Architecture::PluginSystem,
        ]
    }

    /// Stable lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Architecture::MultiAgentSystem => "multi_agent_system",
            Architecture::Microservices => "microservices",
            Architecture::MonolithWebapp => "monolith_webapp",
            Architecture::ClientServer => "client_server",
            Architecture::Library => "library",
            Architecture::CliTool => "cli_tool",
            Architecture::Pipeline => "pipeline",
            Architecture::PluginSystem => "plugin_system",
            Architecture::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Categorical module complexity band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Fewer than 10 files and modest coupling.
    Low,
    /// 10–50 files, or a small module with heavy coupling.
    Medium,
    /// More than 50 files, or a mid-size module with heavy coupling.
    High,
}

impl Complexity {
    /// The next band up, saturating at `High`.
    pub fn bumped(self) -> Self {
        match self {
            Complexity::Low => Complexity::Medium,
            Complexity::Medium | Complexity::High => Complexity::High,
        }
    }
}

/// Why a module was marked as a critical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalReason {
    /// The module contains an entry point.
    ContainsEntrypoint,
    /// The module's in-degree is in the top quartile.
    HighInDegree,
    /// The module is reachable from every entry point.
    ReachableFromAllEntrypoints,
}

/// The phase-specific payload of an [`Insight`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InsightDetail {
    /// Phase 1: the selected architecture hypothesis.
    ArchitectureHypothesis {
        /// The retained hypothesis.
        architecture: Architecture,
        /// Rubric support score in [0,1].
        support: f64,
        /// Support of the best competing hypothesis.
        runner_up: f64,
    },
    /// Phase 2: one analyzed module.
    ModuleAnalysis {
        /// Module name (top-level directory, or `<root>`).
        module: String,
        /// Complexity band.
        complexity: Complexity,
        /// Inferred purpose keyword.
        purpose: String,
        /// Fraction of module files matching the purpose catalogue.
        keyword_coverage: f64,
    },
    /// Phase 3: one critical-path module.
    CriticalPath {
        /// Module name.
        module: String,
        /// Distinct importing modules.
        in_degree: usize,
        /// Which criteria the module satisfied.
        reasons: Vec<CriticalReason>,
    },
    /// Phase 4: the reflection summary.
    ValidationReflection {
        /// Mean per-insight reward for this pass.
        avg_reward: f64,
        /// Whether this pass triggered a backtrack.
        backtracked: bool,
    },
}

/// One confidence-scored reasoning step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    /// Phase-specific payload.
    pub detail: InsightDetail,
    /// Confidence in [0,1].
    pub confidence: f64,
    /// Supporting file paths.
    pub evidence: Vec<String>,
    /// Why the analyzer believes this.
    pub rationale: String,
    /// UTC emission time.
    pub timestamp: DateTime<Utc>,
}

/// Aggregate statistics for one analyzer run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportStats {
    /// Mean per-insight reward from the final reflection pass.
    pub avg_confidence: f64,
    /// Number of reasoning steps (emitted insights).
    pub step_count: u32,
    /// Number of reflection passes executed.
    pub reflection_count: u32,
    /// Number of backtracks taken.
    pub backtrack_count: u32,
}

/// The analyzer's full output. Immutable once emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongCotReport {
    /// All insights in emission order.
    pub insights: Vec<Insight>,
    /// Aggregate statistics.
    pub stats: ReportStats,
    /// The final architecture hypothesis.
    pub architecture: Architecture,
    /// Critical-path module names, ordered (in-degree DESC, name ASC).
    pub critical_paths: Vec<String>,
}

impl LongCotReport {
    /// The report for a workspace with no project: `unknown`
    /// architecture and zero confidence. Callers treat this as
    /// "no project".
    pub fn no_project() -> Self {
        Self {
            insights: Vec::new(),
            stats: ReportStats::default(),
            architecture: Architecture::Unknown,
            critical_paths: Vec::new(),
        }
    }

    /// The gate-relevant aggregate confidence.
    pub fn avg_confidence(&self) -> f64 {
        self.stats.avg_confidence
    }

    /// A compact text rendering for context bundles.
    pub fn summary(&self) -> String {
        let modules = self
            .insights
            .iter()
            .filter(|i| matches!(i.detail, InsightDetail::ModuleAnalysis { .. }))
            .count();
        format!(
            "architecture={} confidence={:.2} modules={} critical_paths=[{}] backtracks={}",
            self.architecture,
            self.stats.avg_confidence,
            modules,
            self.critical_paths.join(", "),
            self.stats.backtrack_count,
        )
    }
}
