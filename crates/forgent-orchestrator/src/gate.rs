use crate::types::GateDecision;
use forgent_core::ForgentConfig;
use tracing::warn;

/// The raw verdict of the decision table, before manual resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawVerdict {
    Approve,
    Reject,
    RequestManual,
}

/// A fully resolved gate decision.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    /// The recorded decision.
    pub decision: GateDecision,
    /// Why the decision was taken. Lands in the audit log verbatim.
    pub reason: String,
}

/// Applies the confidence decision table.
///
/// Every decision is computable from (confidence, is_destructive,
/// auto_mode, thresholds) alone: the audit log records exactly these
/// inputs so the verdict can be replayed.
pub fn decide(confidence: f64, is_destructive: bool, config: &ForgentConfig) -> GateOutcome {
    let (raw, reason) = if confidence >= config.high_conf {
        (
            RawVerdict::Approve,
            format!("high confidence {confidence:.2}"),
        )
    } else if confidence >= config.mid_conf && !is_destructive {
        (
            RawVerdict::Approve,
            format!("medium confidence {confidence:.2}, non-destructive"),
        )
    } else if confidence >= config.mid_conf && is_destructive && config.auto_mode {
        warn!(
            confidence,
            "Approving destructive step at medium confidence in auto mode"
        );
        (
            RawVerdict::Approve,
            format!("medium confidence {confidence:.2}, destructive, auto mode"),
        )
    } else if confidence >= config.mid_conf && is_destructive {
        (RawVerdict::RequestManual, String::new())
    } else if is_destructive {
        (
            RawVerdict::Reject,
            format!("low confidence {confidence:.2} on a destructive task"),
        )
    } else {
        (RawVerdict::RequestManual, String::new())
    };

    match raw {
        RawVerdict::Approve => GateOutcome {
            decision: GateDecision::AutoApprove,
            reason,
        },
        RawVerdict::Reject => GateOutcome {
            decision: GateDecision::AutoReject,
            reason,
        },
        RawVerdict::RequestManual => resolve_manual(confidence, is_destructive, config),
    }
}

/// Resolves a `request_manual` verdict for sessions without an
/// interactive approver. Headless callers collapse to rejection
/// unless the override flag was passed; otherwise non-destructive
/// work is allowed through and destructive work is held back.
fn resolve_manual(confidence: f64, is_destructive: bool, config: &ForgentConfig) -> GateOutcome {
    if config.manual_override {
        return GateOutcome {
            decision: GateDecision::ManualApproved,
            reason: format!("manual override at confidence {confidence:.2}"),
        };
    }
    if config.headless {
        return GateOutcome {
            decision: GateDecision::AutoReject,
            reason: format!(
                "headless: manual approval unavailable at confidence {confidence:.2}"
            ),
        };
    }
    if is_destructive {
        GateOutcome {
            decision: GateDecision::ManualRejected,
            reason: format!(
                "destructive change at confidence {confidence:.2} needs manual approval"
            ),
        }
    } else {
        GateOutcome {
            decision: GateDecision::ManualApproved,
            reason: "non-destructive low-confidence allowed".to_string(),
        }
    }
}
