use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Per-session, per-tool invocation counter.
///
/// Each tool declares its own limit; the limiter only counts. A denied
/// acquisition leaves the counter unchanged, so a rejected call has no
/// side effect on subsequent budgets.
pub struct RateLimiter {
    counts: Mutex<HashMap<(Uuid, String), u32>>,
}

impl RateLimiter {
    /// Creates an empty limiter.
    pub fn new() -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// Tries to consume one invocation for `(session, tool)` against
    /// `limit`. Returns `false` when the budget is exhausted.
    pub fn try_acquire(&self, session: Uuid, tool: &str, limit: u32) -> bool {
        let mut counts = self.counts.lock();
        let count = counts.entry((session, tool.to_string())).or_insert(0);
        if *count >= limit {
            return false;
        }
        *count += 1;
        true
    }

    /// Invocations consumed so far for `(session, tool)`.
    pub fn usage(&self, session: Uuid, tool: &str) -> u32 {
        self.counts
            .lock()
            .get(&(session, tool.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Drops all counters for a finished session.
    pub fn reset_session(&self, session: Uuid) {
        self.counts.lock().retain(|(s, _), _| *s != session);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_up_to_limit() {
        let limiter = RateLimiter::new();
        let session = Uuid::new_v4();
        for _ in 0..3 {
            assert!(limiter.try_acquire(session, "read_file", 3));
        }
        assert!(!limiter.try_acquire(session, "read_file", 3));
        assert_eq!(limiter.usage(session, "read_file"), 3);
    }

    #[test]
    fn test_denied_acquire_has_no_side_effect() {
        let limiter = RateLimiter::new();
        let session = Uuid::new_v4();
        assert!(limiter.try_acquire(session, "write_file", 1));
        assert!(!limiter.try_acquire(session, "write_file", 1));
        assert!(!limiter.try_acquire(session, "write_file", 1));
        assert_eq!(limiter.usage(session, "write_file"), 1);
    }

    #[test]
    fn test_sessions_independent() {
        let limiter = RateLimiter::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(limiter.try_acquire(a, "search", 1));
        assert!(limiter.try_acquire(b, "search", 1));
        assert!(!limiter.try_acquire(a, "search", 1));
    }

    #[test]
    fn test_reset_session() {
        let limiter = RateLimiter::new();
        let session = Uuid::new_v4();
        assert!(limiter.try_acquire(session, "search", 1));
        limiter.reset_session(session);
        assert!(limiter.try_acquire(session, "search", 1));
    }
}
