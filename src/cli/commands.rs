//! CLI definition and top-level flow for the entry driver.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use crate::config::{
    DriverConfig, EnvPassthrough, DEFAULT_BUILD_CONTEXT, DEFAULT_DATA_FILE, DEFAULT_IMAGE,
    DEFAULT_LOGS_DIR, DEFAULT_RUNTIME, DEFAULT_TOOLKIT_DIR,
};
use crate::dataset::load_entries;
use crate::driver::EntryDriver;
use crate::error::DriverError;
use crate::process::{ProcessRunner, SystemRunner};
use crate::runtime::{ContainerRuntime, PERMISSION_HINTS};

/// Run SWE-bench style entries through a containerized coding agent.
#[derive(Parser, Debug)]
#[command(name = "promptcomp-eval")]
#[command(about = "Run benchmark entries through a coding agent, one container per entry")]
#[command(version)]
#[command(
    long_about = "Reads a JSON array of SWE-bench style entries and runs each one in its own container.\n\nEach container receives the repository URL, commit, test command and problem statement,\nwith logs/<index>/ mounted at /workspace/logs.\n\nExample usage:\n  promptcomp-eval --data-file test_data.json\n  promptcomp-eval --build"
)]
pub struct Cli {
    /// Only build the container image, then exit.
    #[arg(long)]
    pub build: bool,

    /// JSON array of benchmark entries.
    #[arg(short = 'd', long, env = "PROMPTCOMP_DATA_FILE", default_value = DEFAULT_DATA_FILE)]
    pub data_file: String,

    /// Image that runs the agent and test command.
    #[arg(long, env = "PROMPTCOMP_IMAGE", default_value = DEFAULT_IMAGE)]
    pub image: String,

    /// Root directory for per-entry log directories.
    #[arg(long, env = "PROMPTCOMP_LOGS_DIR", default_value = DEFAULT_LOGS_DIR)]
    pub logs_dir: String,

    /// Container runtime client binary.
    #[arg(long, env = "PROMPTCOMP_RUNTIME", default_value = DEFAULT_RUNTIME)]
    pub runtime: String,

    /// Build context directory holding the Dockerfile.
    #[arg(long, env = "PROMPTCOMP_BUILD_CONTEXT", default_value = DEFAULT_BUILD_CONTEXT)]
    pub build_context: String,

    /// Toolkit directory copied into the build context while building.
    #[arg(long, env = "PROMPTCOMP_TOOLKIT_DIR", default_value = DEFAULT_TOOLKIT_DIR)]
    pub toolkit_dir: String,

    /// Print the batch report as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::default()
            .with_runtime(&self.runtime)
            .with_image(&self.image)
            .with_data_file(&self.data_file)
            .with_logs_dir(&self.logs_dir)
            .with_build_context(&self.build_context)
            .with_toolkit_dir(&self.toolkit_dir)
    }
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    run_with_runner(cli, Arc::new(SystemRunner)).await
}

/// Run the CLI against a specific process runner.
pub async fn run_with_runner(cli: Cli, runner: Arc<dyn ProcessRunner>) -> anyhow::Result<()> {
    let config = cli.driver_config();
    let runtime = ContainerRuntime::new(runner, &config.runtime);

    if cli.build {
        build_image(&runtime, &config).await?;
        return Ok(());
    }

    match runtime.image_exists(&config.image).await {
        Ok(true) => info!(image = %config.image, "Image found"),
        Ok(false) => {
            info!("Image '{}' not found. Building it first...", config.image);
            build_image(&runtime, &config).await?;
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("\nDocker permission error detected!\n{}", PERMISSION_HINTS);
            return Err(e.into());
        }
    }

    let rows = load_entries(&config.data_file).map_err(|e| {
        error!("Error: {}", e);
        e
    })?;

    let driver = EntryDriver::new(runtime, config, EnvPassthrough::from_env());
    let report = driver.run_batch(&rows).await;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_summary(&driver.config().logs_dir);
    }
    Ok(())
}

async fn build_image(runtime: &ContainerRuntime, config: &DriverConfig) -> anyhow::Result<()> {
    info!(image = %config.image, context = %config.build_context.display(), "Building image");
    match runtime
        .build_image(&config.image, &config.build_context, &config.toolkit_dir)
        .await
    {
        Ok(()) => {
            info!(image = %config.image, "Image built successfully");
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            print_build_hints(&e, &config.build_context);
            Err(e.into())
        }
    }
}

fn print_build_hints(err: &DriverError, context: &Path) {
    match err {
        DriverError::RuntimeUnavailable { .. } => {
            eprintln!("\nDocker is not accessible!\n{}", PERMISSION_HINTS);
        }
        DriverError::ToolkitStaging { .. } => {
            eprintln!(
                "\nCould not copy the toolkit into {}. Check --toolkit-dir.",
                context.display()
            );
        }
        _ => {
            eprintln!(
                "\nFailed to build Docker image!\nIf you see permission denied errors:\n{}",
                PERMISSION_HINTS
            );
        }
    }
}
