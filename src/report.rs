//! Per-entry outcomes and the batch summary.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The container exited with status 0.
    Succeeded,
    /// The container exited non-zero, was killed by a signal (`exit_code`
    /// is `None`), or could not be launched at all (`error` is set).
    Failed {
        exit_code: Option<i32>,
        error: Option<String>,
    },
    /// The entry was never launched.
    Skipped { reason: String },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed { .. } => "failed",
            Self::Skipped { .. } => "skipped",
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Outcome of one entry with enough context to find its logs.
#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub index: usize,
    pub label: String,
    #[serde(flatten)]
    pub outcome: RunOutcome,
    pub log_dir: Option<PathBuf>,
    pub duration_secs: f64,
}

/// Summary across the whole batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub entries: Vec<EntryReport>,
}

impl BatchReport {
    pub fn from_entries(started_at: DateTime<Utc>, entries: Vec<EntryReport>) -> Self {
        let count = |label: &str| entries.iter().filter(|e| e.outcome.label() == label).count();
        let (succeeded, failed, skipped) = (count("succeeded"), count("failed"), count("skipped"));
        Self {
            started_at,
            finished_at: Utc::now(),
            total: entries.len(),
            succeeded,
            failed,
            skipped,
            entries,
        }
    }

    /// Print the human readable summary.
    pub fn print_summary(&self, logs_dir: &Path) {
        println!("\n=== Entry Driver Results ===");
        println!("Total entries:  {}", self.total);
        println!("Succeeded:      {}", self.succeeded);
        println!("Failed:         {}", self.failed);
        println!("Skipped:        {}", self.skipped);
        println!();

        for e in &self.entries {
            match &e.outcome {
                RunOutcome::Succeeded => {
                    println!("  [{}] {} succeeded ({:.1}s)", e.index, e.label, e.duration_secs)
                }
                RunOutcome::Failed { exit_code, error } => {
                    let code = exit_code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "none".to_string());
                    println!(
                        "  [{}] {} failed, exit code {} ({:.1}s)",
                        e.index, e.label, code, e.duration_secs
                    );
                    if let Some(err) = error {
                        println!("    error: {err}");
                    }
                }
                RunOutcome::Skipped { reason } => {
                    println!("  [{}] {} skipped: {}", e.index, e.label, reason)
                }
            }
        }
        println!(
            "\nCheck the {}/ directory for detailed output from each run",
            logs_dir.display()
        );
    }
}
