use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

fn default_high_conf() -> f64 {
    0.8
}
fn default_mid_conf() -> f64 {
    0.5
}
fn default_max_steps() -> u32 {
    20
}
fn default_history_max() -> usize {
    40
}
fn default_context_budget() -> usize {
    8_000
}
fn default_backtrack_threshold() -> f64 {
    0.55
}
fn default_max_backtracks() -> u32 {
    1
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_command_timeout_secs() -> u64 {
    120
}
fn default_step_timeout_secs() -> u64 {
    600
}
fn default_run_timeout_secs() -> u64 {
    1_800
}
fn default_skill_top_k() -> usize {
    3
}

/// Thresholds and budgets governing a Forgent session.
///
/// Defaults follow the documented policy; selected fields can be
/// overridden from the environment via [`ForgentConfig::apply_env`].
/// Unknown environment variables are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgentConfig {
    /// Confidence at or above which every step auto-approves.
    #[serde(default = "default_high_conf")]
    pub high_conf: f64,
    /// Confidence below which destructive steps auto-reject.
    #[serde(default = "default_mid_conf")]
    pub mid_conf: f64,
    /// Disable manual-approval prompts; decisions collapse per policy.
    #[serde(default)]
    pub auto_mode: bool,
    /// No interactive caller is present. `request_manual` collapses to
    /// reject unless `manual_override` is set.
    #[serde(default)]
    pub headless: bool,
    /// Allows a headless caller to treat `request_manual` as approval.
    #[serde(default)]
    pub manual_override: bool,
    /// Step budget per reasoning invocation.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Reasoning history bound before compaction.
    #[serde(default = "default_history_max")]
    pub history_max: usize,
    /// Character budget for skill bodies in a context bundle.
    #[serde(default = "default_context_budget")]
    pub context_budget: usize,
    /// Analyzer reward threshold below which a backtrack is attempted.
    #[serde(default = "default_backtrack_threshold")]
    pub backtrack_threshold: f64,
    /// Maximum analyzer backtracks per run.
    #[serde(default = "default_max_backtracks")]
    pub max_backtracks: u32,
    /// Default per-tool timeout.
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    /// Timeout for `run_command`.
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Per-step timeout.
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,
    /// Per-run timeout.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    /// Number of skills selected per step.
    #[serde(default = "default_skill_top_k")]
    pub skill_top_k: usize,
    /// Override for the audit log location. Defaults to
    /// `<workspace>/.state/audit.log` when unset.
    #[serde(default)]
    pub audit_log_path: Option<PathBuf>,
}

impl Default for ForgentConfig {
    fn default() -> Self {
        Self {
            high_conf: default_high_conf(),
            mid_conf: default_mid_conf(),
            auto_mode: false,
            headless: false,
            manual_override: false,
            max_steps: default_max_steps(),
            history_max: default_history_max(),
            context_budget: default_context_budget(),
            backtrack_threshold: default_backtrack_threshold(),
            max_backtracks: default_max_backtracks(),
            tool_timeout_secs: default_tool_timeout_secs(),
            command_timeout_secs: default_command_timeout_secs(),
            step_timeout_secs: default_step_timeout_secs(),
            run_timeout_secs: default_run_timeout_secs(),
            skill_top_k: default_skill_top_k(),
            audit_log_path: None,
        }
    }
}

impl ForgentConfig {
    /// Applies recognized environment overrides in place.
    ///
    /// `AUTO_APPROVE` (1/0), `CONFIDENCE_THRESHOLD` (float in [0,1]),
    /// `MAX_STEPS` (integer ≥ 1), `AUDIT_LOG_PATH`. Values that fail to
    /// parse are ignored with a warning.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("AUTO_APPROVE") {
            match v.trim() {
                "1" | "true" => self.auto_mode = true,
                "0" | "false" => self.auto_mode = false,
                other => warn!(value = %other, "Ignoring unparseable AUTO_APPROVE"),
            }
        }
        if let Ok(v) = std::env::var("CONFIDENCE_THRESHOLD") {
            match v.trim().parse::<f64>() {
                Ok(t) if (0.0..=1.0).contains(&t) => self.mid_conf = t,
                _ => warn!(value = %v, "Ignoring out-of-range CONFIDENCE_THRESHOLD"),
            }
        }
        if let Ok(v) = std::env::var("MAX_STEPS") {
            match v.trim().parse::<u32>() {
                Ok(n) if n >= 1 => self.max_steps = n,
                _ => warn!(value = %v, "Ignoring invalid MAX_STEPS"),
            }
        }
        if let Ok(v) = std::env::var("AUDIT_LOG_PATH") {
            if !v.trim().is_empty() {
                self.audit_log_path = Some(PathBuf::from(v));
            }
        }
    }

    /// Sets the mid-confidence threshold, validating the range.
    pub fn set_confidence_threshold(&mut self, value: f64) -> Result<(), String> {
        if (0.0..=1.0).contains(&value) {
            self.mid_conf = value;
            Ok(())
        } else {
            Err(format!("confidence threshold out of range: {value}"))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ForgentConfig::default();
        assert_eq!(cfg.high_conf, 0.8);
        assert_eq!(cfg.mid_conf, 0.5);
        assert_eq!(cfg.max_steps, 20);
        assert_eq!(cfg.history_max, 40);
        assert_eq!(cfg.max_backtracks, 1);
        assert!(!cfg.auto_mode);
    }

    #[test]
    fn test_threshold_validation() {
        let mut cfg = ForgentConfig::default();
        assert!(cfg.set_confidence_threshold(0.7).is_ok());
        assert_eq!(cfg.mid_conf, 0.7);
        assert!(cfg.set_confidence_threshold(1.5).is_err());
        assert!(cfg.set_confidence_threshold(-0.1).is_err());
        assert_eq!(cfg.mid_conf, 0.7);
    }

    #[test]
    fn test_unknown_fields_tolerated() {
        let cfg: ForgentConfig =
            serde_json::from_str(r#"{"high_conf": 0.9, "future_field": true}"#).unwrap();
        assert_eq!(cfg.high_conf, 0.9);
        assert_eq!(cfg.mid_conf, 0.5);
    }
}
