//! Container runtime client.
//!
//! Wraps the runtime CLI (`docker` by default): reachability check, image
//! lookup, image build, and the per-entry `run` invocation.

mod build;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::EnvPassthrough;
use crate::entry::ExecutionRequest;
use crate::error::{DriverError, DriverResult};
use crate::process::{OutputMode, ProcessOutput, ProcessRunner, ProcessSpec};

pub use build::StagedToolkit;

/// Upper bound on the `--version` reachability probe.
const ACCESS_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Shell steps printed when the runtime cannot be reached.
pub const PERMISSION_HINTS: &str = "\
To fix Docker permissions:
1. Add your user to the docker group:
   sudo usermod -aG docker $USER
2. Log out and back in, or run:
   newgrp docker
3. Verify Docker works without sudo:
   docker --version";

/// Client for the container runtime CLI.
#[derive(Clone)]
pub struct ContainerRuntime {
    runner: Arc<dyn ProcessRunner>,
    program: String,
}

impl ContainerRuntime {
    pub fn new(runner: Arc<dyn ProcessRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run an arbitrary spec through the underlying runner.
    pub async fn run(&self, spec: &ProcessSpec) -> DriverResult<ProcessOutput> {
        self.runner.run(spec).await
    }

    /// Returns true when `<runtime> --version` exits cleanly within the
    /// probe timeout.
    pub async fn check_access(&self) -> bool {
        let spec = ProcessSpec::new(&self.program)
            .arg("--version")
            .with_output(OutputMode::Capture)
            .with_timeout(ACCESS_CHECK_TIMEOUT);
        match self.runner.run(&spec).await {
            Ok(out) => out.success(),
            Err(e) => {
                debug!(runtime = %self.program, error = %e, "Runtime access check failed");
                false
            }
        }
    }

    /// Whether `image` is present locally.
    ///
    /// A failing lookup (typically permission denied on the daemon socket)
    /// is reported as [`DriverError::RuntimeUnavailable`].
    pub async fn image_exists(&self, image: &str) -> DriverResult<bool> {
        let spec = ProcessSpec::new(&self.program)
            .args(["images", "-q", image])
            .with_output(OutputMode::Capture);
        let out = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;
        if !out.success() {
            return Err(self.unavailable(describe_failure(&out)));
        }
        Ok(!out.stdout.trim().is_empty())
    }

    /// Build `image` from `context`, staging `toolkit` into the context for
    /// the duration of the build.
    ///
    /// The staged copy is removed whether or not the build succeeds.
    pub async fn build_image(
        &self,
        image: &str,
        context: &Path,
        toolkit: &Path,
    ) -> DriverResult<()> {
        if !self.check_access().await {
            return Err(self.unavailable("version probe failed".to_string()));
        }

        let staged = StagedToolkit::stage(toolkit, context)?;
        debug!(path = %staged.path().display(), "Staged toolkit into build context");

        let spec = ProcessSpec::new(&self.program)
            .args(["build", "-t", image])
            .arg(context.display().to_string());
        let result = self.runner.run(&spec).await;
        let removed = staged.remove();

        let out = result.map_err(|e| DriverError::BuildFailed {
            image: image.to_string(),
            reason: e.to_string(),
        });
        let built = match out {
            Ok(out) if out.success() => Ok(()),
            Ok(out) => Err(DriverError::BuildFailed {
                image: image.to_string(),
                reason: describe_failure(&out),
            }),
            Err(e) => Err(e),
        };
        match (built, removed) {
            (Ok(()), removed) => removed,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup)) => {
                warn!(error = %cleanup, "Failed to remove staged toolkit after failed build");
                Err(e)
            }
        }
    }

    /// Assemble the `run` invocation for one entry.
    ///
    /// Shape: `run --rm -v <host>:<container> [-e VAR]... <image> <repo>
    /// <commit> <test command> <problem statement>`.
    pub fn run_spec(
        &self,
        image: &str,
        container_log_dir: &str,
        host_log_dir: &Path,
        env: &EnvPassthrough,
        request: &ExecutionRequest,
    ) -> ProcessSpec {
        let mut spec = ProcessSpec::new(&self.program)
            .args(["run", "--rm", "-v"])
            .arg(format!("{}:{}", host_log_dir.display(), container_log_dir))
            .args(env.docker_args())
            .args([
                image,
                request.repo_url.as_str(),
                request.commit.as_str(),
                request.test_command.as_str(),
                request.problem_statement.as_str(),
            ]);
        for (key, value) in &env.credentials {
            spec = spec.with_env(key, value);
        }
        spec
    }

    fn unavailable(&self, reason: String) -> DriverError {
        DriverError::RuntimeUnavailable {
            runtime: self.program.clone(),
            reason,
        }
    }
}

fn describe_failure(out: &ProcessOutput) -> String {
    let code = out
        .exit_code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let stderr = out.stderr.trim();
    if stderr.is_empty() {
        format!("exit code {}", code)
    } else {
        format!("exit code {}: {}", code, stderr)
    }
}
