//! The `forgent` binary.
//!
//! Exit codes: 0 success, 1 failed run, 2 bad argument, 3 not found,
//! 4 circuit open, 5 cancelled.

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use forgent_core::{ForgentConfig, ForgentError, ForgentResult};
use forgent_engine::{Reasoning, ReasoningBackend};
use forgent_orchestrator::{FinalStatus, Orchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "forgent", about = "Forgent — autonomous multi-agent code orchestrator")]
struct Cli {
    /// Workspace root (default: $WORKSPACE_ROOT, then the current directory)
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Disable manual-approval prompts; decisions collapse per policy
    #[arg(long)]
    auto: bool,

    /// Alias of --auto for non-interactive callers
    #[arg(long)]
    headless: bool,

    /// Override the mid-confidence threshold, in [0,1]
    #[arg(long)]
    confidence_threshold: Option<f64>,

    /// Re-run the scanner and analyzer before anything else
    #[arg(long)]
    rescan: bool,

    /// Roll back every artifact of a run
    #[arg(long, value_name = "RUN_ID")]
    rollback: Option<String>,

    /// Print the status snapshot as JSON
    #[arg(long)]
    status: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the default pipeline for a request
    Submit {
        /// The request text
        text: Vec<String>,
    },
}

/// Stand-in reasoning backend for sessions without an LLM integration
/// wired up: every step finishes immediately so the scheduling,
/// gating, and audit surfaces still work end to end.
struct OfflineBackend;

#[async_trait]
impl ReasoningBackend for OfflineBackend {
    async fn reason(
        &self,
        _prompt: &str,
        _catalogue: &[forgent_tools::ToolSpec],
    ) -> ForgentResult<Reasoning> {
        Ok(Reasoning::finish(
            "no reasoning backend configured",
            "step recorded without actions (offline backend)",
        ))
    }
}

fn error_summary(kind: &str, message: &str, location: &str, remedy: Option<&str>) -> String {
    let mut value = serde_json::json!({
        "kind": kind,
        "message": message,
        "where": location,
    });
    if let Some(remedy) = remedy {
        value["remedy_hint"] = serde_json::Value::String(remedy.to_string());
    }
    value.to_string()
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .or_else(|| std::env::var("WORKSPACE_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = ForgentConfig::default();
    if cli.auto || cli.headless {
        config.auto_mode = true;
        config.headless = true;
    }
    if let Some(threshold) = cli.confidence_threshold {
        if let Err(e) = config.set_confidence_threshold(threshold) {
            eprintln!(
                "{}",
                error_summary("input-invalid", &e, "confidence-threshold", None)
            );
            return ExitCode::from(2);
        }
    }

    let orchestrator =
        match Orchestrator::new(&workspace, config, Arc::new(OfflineBackend)).await {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                eprintln!(
                    "{}",
                    error_summary(
                        "scan-missing-root",
                        &e.to_string(),
                        "startup",
                        Some("check --workspace or WORKSPACE_ROOT"),
                    )
                );
                return ExitCode::from(2);
            }
        };

    if cli.rescan {
        match orchestrator.rescan().await {
            Ok(report) => info!(
                architecture = %report.architecture,
                confidence = report.avg_confidence(),
                "Rescan complete"
            ),
            Err(e) => {
                eprintln!("{}", error_summary("scan", &e.to_string(), "rescan", None));
                return ExitCode::from(1);
            }
        }
    }

    if let Some(raw_id) = cli.rollback {
        let run_id = match Uuid::parse_str(&raw_id) {
            Ok(run_id) => run_id,
            Err(_) => {
                eprintln!(
                    "{}",
                    error_summary(
                        "input-invalid",
                        &format!("not a run id: {raw_id}"),
                        "rollback",
                        None,
                    )
                );
                return ExitCode::from(2);
            }
        };
        return match orchestrator.rollback(run_id).await {
            Ok(report) => {
                println!(
                    "{}",
                    serde_json::json!({
                        "run_id": run_id,
                        "restored": report.restored,
                        "removed": report.removed,
                    })
                );
                ExitCode::SUCCESS
            }
            Err(ForgentError::Rollback(message)) if message.contains("rollback-unknown-run") => {
                eprintln!(
                    "{}",
                    error_summary("rollback-unknown-run", &message, "rollback", None)
                );
                ExitCode::from(3)
            }
            Err(e) => {
                eprintln!(
                    "{}",
                    error_summary("rollback-io", &e.to_string(), "rollback", None)
                );
                ExitCode::from(1)
            }
        };
    }

    if cli.status {
        match serde_json::to_string_pretty(&orchestrator.status()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("{}", error_summary("state", &e.to_string(), "status", None));
                return ExitCode::from(1);
            }
        }
        if cli.command.is_none() {
            return ExitCode::SUCCESS;
        }
    }

    let Some(Command::Submit { text }) = cli.command else {
        // Nothing else to do; --rescan alone is a valid invocation.
        return ExitCode::SUCCESS;
    };
    let request = text.join(" ");

    match orchestrator.submit(&request).await {
        Ok(run) => {
            println!(
                "{}",
                serde_json::json!({
                    "run_id": run.run_id,
                    "task_type": run.task.task_type,
                    "pipeline": run.pipeline,
                    "final_status": run.final_status,
                    "steps": run.step_results.len(),
                })
            );
            match run.final_status {
                FinalStatus::Success | FinalStatus::Partial => ExitCode::SUCCESS,
                FinalStatus::Rejected => ExitCode::from(1),
                FinalStatus::Failed => {
                    if orchestrator.status().circuit_breaker_state == "open" {
                        ExitCode::from(4)
                    } else {
                        ExitCode::from(1)
                    }
                }
                FinalStatus::Cancelled => ExitCode::from(5),
            }
        }
        Err(ForgentError::Input(message)) => {
            eprintln!(
                "{}",
                error_summary(
                    "input-invalid",
                    &message,
                    "submit",
                    Some("try `forgent submit \"build <feature>\"`"),
                )
            );
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("{}", error_summary("run", &e.to_string(), "submit", None));
            ExitCode::from(1)
        }
    }
}
