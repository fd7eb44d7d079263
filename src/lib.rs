//! promptcomp-eval: containerized SWE-bench entry driver.
//!
//! Turns SWE-bench style dataset records into one isolated container run
//! each, passing the repository, commit, test command and problem statement
//! to a coding agent image, and reports pass/fail from the exit status.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod driver;
pub mod entry;
pub mod error;
pub mod process;
pub mod report;
pub mod runtime;

pub use config::{DriverConfig, EnvPassthrough};
pub use driver::EntryDriver;
pub use entry::{BenchmarkEntry, CommitRef, ExecutionRequest, FailingTests};
pub use error::{DriverError, FailingTestsError};
pub use process::{OutputMode, ProcessOutput, ProcessRunner, ProcessSpec, SystemRunner};
pub use report::{BatchReport, EntryReport, RunOutcome};
pub use runtime::ContainerRuntime;
