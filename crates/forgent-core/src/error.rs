use thiserror::Error;

/// A convenience `Result` alias using [`ForgentError`].
pub type ForgentResult<T> = Result<T, ForgentError>;

/// Top-level error type for the Forgent orchestrator.
///
/// Each variant corresponds to a subsystem that can produce errors.
/// Tool-surface failures are not carried here — they are returned as
/// [`crate::tool::ToolOutcome`] values so the reasoning loop can feed
/// them back as observations.
#[derive(Error, Debug)]
pub enum ForgentError {
    /// Invalid user input: empty request, unknown slash command, out-of-range flag.
    #[error("input-invalid: {0}")]
    Input(String),

    /// An error from the project scanner (missing root, permission denied).
    #[error("scan error: {0}")]
    Scan(String),

    /// A degraded analyzer phase. Non-fatal at the analyzer surface.
    #[error("longcot error: {0}")]
    LongCot(String),

    /// A skill descriptor failed to parse. The skill is skipped.
    #[error("skill error: {0}")]
    Skill(String),

    /// An agent descriptor failed to load.
    #[error("agent error: {0}")]
    Agent(String),

    /// A fatal failure inside the reasoning engine (e.g. backend unreachable).
    #[error("engine error: {0}")]
    Engine(String),

    /// A confidence-gate rejection terminating a run.
    #[error("gate-auto-reject: {0}")]
    Gate(String),

    /// A run-level failure: circuit open, cancellation, timeout.
    #[error("run error: {0}")]
    Run(String),

    /// A rollback failure: unknown run id or restore I/O error.
    #[error("rollback error: {0}")]
    Rollback(String),

    /// A state store or artifact registry persistence error.
    #[error("state error: {0}")]
    State(String),

    /// A security guard rejection outside the tool surface.
    #[error("security error: {0}")]
    Security(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
