//! The entry driver: one isolated container per benchmark entry.
//!
//! Entries are processed strictly in order, one at a time. Each entry is
//! resolved, given its own log directory, launched, and judged solely on
//! the container's exit status. Nothing an entry does stops the batch.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::{DriverConfig, EnvPassthrough};
use crate::dataset::DatasetRow;
use crate::entry::BenchmarkEntry;
use crate::report::{BatchReport, EntryReport, RunOutcome};
use crate::runtime::ContainerRuntime;

/// Drives entries through the container runtime.
pub struct EntryDriver {
    runtime: ContainerRuntime,
    config: DriverConfig,
    env: EnvPassthrough,
}

impl EntryDriver {
    pub fn new(runtime: ContainerRuntime, config: DriverConfig, env: EnvPassthrough) -> Self {
        Self {
            runtime,
            config,
            env,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Process one entry to completion.
    pub async fn run_entry(&self, entry: &BenchmarkEntry, index: usize) -> EntryReport {
        let start = Instant::now();
        let label = entry.label().to_string();

        let log_dir = self.config.entry_log_dir(index);
        let request = match entry.resolve(index, log_dir.clone()) {
            Ok(req) => req,
            Err(e) => {
                error!(index, "{}", e);
                return EntryReport {
                    index,
                    label,
                    outcome: RunOutcome::Skipped {
                        reason: e.to_string(),
                    },
                    log_dir: None,
                    duration_secs: start.elapsed().as_secs_f64(),
                };
            }
        };

        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            error!(index, path = %log_dir.display(), error = %e, "Failed to create log directory");
            return EntryReport {
                index,
                label,
                outcome: RunOutcome::Failed {
                    exit_code: None,
                    error: Some(format!(
                        "cannot create log directory {}: {e}",
                        log_dir.display()
                    )),
                },
                log_dir: None,
                duration_secs: start.elapsed().as_secs_f64(),
            };
        }
        let host_log_dir = absolute(&log_dir);

        info!(index, repo = %request.repo_url, commit = %request.commit, "Running entry {}", index);
        info!(index, "Test command: {}", request.test_command);
        info!(index, "Problem statement: {}", request.statement_preview());
        info!(index, "Logs will be saved to: {}", log_dir.display());

        let spec = self.runtime.run_spec(
            &self.config.image,
            &self.config.container_log_dir,
            &host_log_dir,
            &self.env,
            &request,
        );
        info!(index, "Executing: {}", spec.display());

        let outcome = match self.runtime.run(&spec).await {
            Ok(out) if out.success() => {
                info!(index, "Entry {} completed successfully", index);
                RunOutcome::Succeeded
            }
            Ok(out) => {
                warn!(
                    index,
                    exit_code = ?out.exit_code,
                    "Entry {} completed with errors",
                    index
                );
                RunOutcome::Failed {
                    exit_code: out.exit_code,
                    error: None,
                }
            }
            Err(e) => {
                error!(index, error = %e, "Entry {} could not be launched", index);
                RunOutcome::Failed {
                    exit_code: None,
                    error: Some(e.to_string()),
                }
            }
        };

        EntryReport {
            index,
            label,
            outcome,
            log_dir: Some(log_dir),
            duration_secs: start.elapsed().as_secs_f64(),
        }
    }

    /// Process every row in order and summarize.
    pub async fn run_batch(&self, rows: &[DatasetRow]) -> BatchReport {
        let started_at = Utc::now();
        let total = rows.len();
        info!("Found {} entries to process", total);

        let mut reports = Vec::with_capacity(total);
        for (index, row) in rows.iter().enumerate() {
            info!("=== Processing entry {}/{} ===", index + 1, total);
            let report = match row {
                DatasetRow::Entry(entry) => self.run_entry(entry, index).await,
                DatasetRow::Invalid(reason) => {
                    error!(index, "Entry {} is malformed: {}", index, reason);
                    EntryReport {
                        index,
                        label: "<invalid>".to_string(),
                        outcome: RunOutcome::Skipped {
                            reason: format!("malformed entry: {reason}"),
                        },
                        log_dir: None,
                        duration_secs: 0.0,
                    }
                }
            };
            reports.push(report);
        }

        info!("Completed processing all {} entries", total);
        BatchReport::from_entries(started_at, reports)
    }
}

fn absolute(path: &std::path::Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
