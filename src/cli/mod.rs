//! Command-line interface for the entry driver.
//!
//! A single command: optionally build the image and exit, otherwise make
//! sure the image exists and run every entry of the input file.

mod commands;

pub use commands::{parse_cli, run_with_cli, run_with_runner, Cli};
