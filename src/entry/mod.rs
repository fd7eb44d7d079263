//! Benchmark entry model and normalization.
//!
//! A [`BenchmarkEntry`] is one loosely-typed dataset record. It is resolved
//! exactly once into an [`ExecutionRequest`], which carries everything the
//! container launch needs.

pub mod failing_tests;

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{DriverError, DriverResult};

pub use failing_tests::{resolve_test_command, FailingTests, FALLBACK_TEST_COMMAND};

/// Host used to expand short `owner/name` repository references.
pub const DEFAULT_GIT_HOST: &str = "https://github.com";

/// One record of the input dataset.
///
/// Unknown keys are ignored; `null` and empty strings count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkEntry {
    /// SWE-bench instance identifier, when the dump carries one.
    #[serde(default, deserialize_with = "non_empty")]
    pub instance_id: Option<String>,
    /// Full clone URL or short `owner/name`.
    #[serde(default, deserialize_with = "non_empty")]
    pub repo: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub commit_hash: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub base_commit: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub problem_statement: Option<String>,
    /// Explicit test command; takes priority over `FAIL_TO_PASS`.
    #[serde(default, deserialize_with = "non_empty")]
    pub test_cmd: Option<String>,
    /// Raw failing-tests value, decoded by [`FailingTests::parse`].
    #[serde(rename = "FAIL_TO_PASS", default, skip_serializing_if = "Option::is_none")]
    pub fail_to_pass: Option<Value>,
}

/// Commit identifier resolved from the two alternate fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitRef {
    /// Taken from `commit_hash`.
    CommitHash(String),
    /// Taken from `base_commit`.
    BaseCommit(String),
}

impl CommitRef {
    /// `commit_hash` wins over `base_commit`.
    pub fn resolve(commit_hash: Option<&str>, base_commit: Option<&str>) -> Option<Self> {
        let non_empty = |s: Option<&str>| s.filter(|v| !v.is_empty()).map(str::to_string);
        non_empty(commit_hash)
            .map(Self::CommitHash)
            .or_else(|| non_empty(base_commit).map(Self::BaseCommit))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::CommitHash(c) | Self::BaseCommit(c) => c,
        }
    }
}

impl BenchmarkEntry {
    /// Resolve the commit identifier for this entry.
    pub fn commit(&self) -> Option<CommitRef> {
        CommitRef::resolve(self.commit_hash.as_deref(), self.base_commit.as_deref())
    }

    /// Label used in log lines; falls back to the repo reference.
    pub fn label(&self) -> &str {
        self.instance_id
            .as_deref()
            .or(self.repo.as_deref())
            .unwrap_or("<unknown>")
    }

    /// Normalize this entry into an execution request.
    ///
    /// Fails only when the repository or commit is missing. A missing
    /// problem statement is logged and replaced by an empty one.
    pub fn resolve(&self, index: usize, log_dir: PathBuf) -> DriverResult<ExecutionRequest> {
        let repo = self
            .repo
            .as_deref()
            .ok_or(DriverError::MissingRepo { index })?;
        let commit = self.commit().ok_or(DriverError::MissingCommit { index })?;

        let problem_statement = self.problem_statement.clone().unwrap_or_default();
        if problem_statement.is_empty() {
            tracing::warn!(index, "No problem statement found in entry {}", index);
        }

        let test_command =
            resolve_test_command(self.test_cmd.as_deref(), self.fail_to_pass.as_ref(), index);

        Ok(ExecutionRequest {
            index,
            repo_url: repo_url(repo),
            commit: commit.as_str().to_string(),
            test_command,
            problem_statement,
            log_dir,
        })
    }
}

/// Everything needed to launch one container, derived once per entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionRequest {
    pub index: usize,
    pub repo_url: String,
    pub commit: String,
    pub test_command: String,
    pub problem_statement: String,
    /// Host directory mounted as the container's log directory.
    pub log_dir: PathBuf,
}

impl ExecutionRequest {
    /// Problem statement shortened for console output.
    pub fn statement_preview(&self) -> String {
        preview(&self.problem_statement, 100)
    }
}

/// Expand a short `owner/name` reference into a clone URL.
///
/// References that already carry a URL scheme are returned unchanged.
pub fn repo_url(reference: &str) -> String {
    if reference.contains("://") {
        reference.to_string()
    } else {
        format!("{}/{}.git", DEFAULT_GIT_HOST, reference)
    }
}

fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
