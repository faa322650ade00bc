use std::collections::BTreeMap;
use tracing::warn;

/// Consecutive failures for one agent that open the circuit.
const MAX_CONSECUTIVE: u32 = 3;
/// Total failures in one run that open the circuit.
const MAX_TOTAL: u32 = 5;

/// Counter-driven safety mechanism that aborts a run after repeated
/// step failures.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    consecutive: BTreeMap<String, u32>,
    total: u32,
    open: bool,
}

impl CircuitBreaker {
    /// A fresh, closed breaker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful step, resetting the agent's streak.
    pub fn record_success(&mut self, agent_id: &str) {
        self.consecutive.insert(agent_id.to_string(), 0);
    }

    /// Records a failed step. Returns `true` when this failure opened
    /// the circuit.
    pub fn record_failure(&mut self, agent_id: &str) -> bool {
        if self.open {
            return false;
        }
        let streak = self.consecutive.entry(agent_id.to_string()).or_insert(0);
        *streak += 1;
        self.total += 1;

        if *streak >= MAX_CONSECUTIVE || self.total >= MAX_TOTAL {
            warn!(
                agent = %agent_id,
                streak = *streak,
                total = self.total,
                "Circuit breaker opened"
            );
            self.open = true;
            return true;
        }
        false
    }

    /// Whether the circuit is open.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_consecutive_same_agent_opens() {
        let mut breaker = CircuitBreaker::new();
        assert!(!breaker.record_failure("02"));
        assert!(!breaker.record_failure("02"));
        assert!(breaker.record_failure("02"));
        assert!(breaker.is_open());
    }

    #[test]
    fn test_success_resets_streak() {
        let mut breaker = CircuitBreaker::new();
        breaker.record_failure("02");
        breaker.record_failure("02");
        breaker.record_success("02");
        assert!(!breaker.record_failure("02"));
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_five_total_across_agents_opens() {
        let mut breaker = CircuitBreaker::new();
        for agent in ["00", "01", "02", "03"] {
            assert!(!breaker.record_failure(agent));
            breaker.record_success(agent);
        }
        assert!(breaker.record_failure("04"));
        assert!(breaker.is_open());
    }
}
