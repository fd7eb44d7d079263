//! Driver configuration.

use std::collections::HashMap;
use std::path::PathBuf;

/// Default container runtime client.
pub const DEFAULT_RUNTIME: &str = "docker";
/// Default image holding the coding agent and test tooling.
pub const DEFAULT_IMAGE: &str = "swebench-env";
/// Default input dataset.
pub const DEFAULT_DATA_FILE: &str = "test_data.json";
/// Default host root for per-entry log directories.
pub const DEFAULT_LOGS_DIR: &str = "logs";
/// Mount point of the per-entry log directory inside the container.
pub const CONTAINER_LOG_DIR: &str = "/workspace/logs";
/// Default image build context.
pub const DEFAULT_BUILD_CONTEXT: &str = "docker/";
/// Default toolkit directory copied into the build context.
pub const DEFAULT_TOOLKIT_DIR: &str = "../benchmarks/aider-genius";

/// Credential variables forwarded into the container when set.
pub const PASSTHROUGH_VARS: &[&str] = &["OPENAI_API_KEY", "OPENROUTER_API_KEY"];
/// Variable selecting the agent's model.
pub const MODEL_VAR: &str = "AIDER_MODEL";
/// Model used when [`MODEL_VAR`] is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Configuration for a driver run.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub runtime: String,
    pub image: String,
    pub data_file: PathBuf,
    pub logs_dir: PathBuf,
    pub container_log_dir: String,
    pub build_context: PathBuf,
    pub toolkit_dir: PathBuf,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
            container_log_dir: CONTAINER_LOG_DIR.to_string(),
            build_context: PathBuf::from(DEFAULT_BUILD_CONTEXT),
            toolkit_dir: PathBuf::from(DEFAULT_TOOLKIT_DIR),
        }
    }
}

impl DriverConfig {
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = runtime.into();
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = path.into();
        self
    }

    pub fn with_logs_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logs_dir = dir.into();
        self
    }

    pub fn with_build_context(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_context = dir.into();
        self
    }

    pub fn with_toolkit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.toolkit_dir = dir.into();
        self
    }

    /// Host log directory for the entry at `index`.
    pub fn entry_log_dir(&self, index: usize) -> PathBuf {
        self.logs_dir.join(index.to_string())
    }
}

/// Environment forwarded into each container.
///
/// Built from a snapshot so the driver never reads the process environment
/// while iterating entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvPassthrough {
    /// Allow-listed credentials that are set, with their values.
    pub credentials: Vec<(String, String)>,
    /// Resolved model selection.
    pub model: String,
}

impl EnvPassthrough {
    /// Capture the allow-list from the current process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Capture the allow-list from arbitrary `(key, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let credentials = PASSTHROUGH_VARS
            .iter()
            .filter_map(|name| {
                vars.get(*name)
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.to_string(), v.clone()))
            })
            .collect();
        let model = vars
            .get(MODEL_VAR)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self { credentials, model }
    }

    /// `-e` arguments for the container runtime.
    ///
    /// Credentials are passed by name only so their values never appear on
    /// the command line; the runtime copies them from its own environment.
    pub fn docker_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.credentials.len() * 2 + 2);
        for (name, _) in &self.credentials {
            args.push("-e".to_string());
            args.push(name.clone());
        }
        args.push("-e".to_string());
        args.push(format!("{}={}", MODEL_VAR, self.model));
        args
    }
}
