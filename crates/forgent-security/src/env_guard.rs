/// Variable-name fragments that must never be read by tools.
const BLOCKED_FRAGMENTS: &[&str] = &["SECRET", "TOKEN", "KEY", "PASSWORD", "CREDENTIAL"];

/// Refuses environment reads of sensitive variable names.
pub struct EnvGuard;

impl EnvGuard {
    /// Checks a variable name, case-insensitively.
    pub fn check(name: &str) -> Result<(), String> {
        let upper = name.to_uppercase();
        for fragment in BLOCKED_FRAGMENTS {
            if upper.contains(fragment) {
                return Err(format!("variable name contains '{fragment}'"));
            }
        }
        Ok(())
    }
}
