//! Command line interface
//!
//! The tool is run-once by design; the flags only override where the
//! document goes and how metric names are prefixed.

use std::path::PathBuf;

use clap::Parser;

use crate::config::CollectorConfig;
use crate::errors::Result;

#[derive(Parser, Debug)]
#[command(
    name = "vpnmetrics",
    version,
    about = "Snapshot VPN fleet health into a Prometheus textfile"
)]
pub struct Args {
    /// Configuration file (TOML); defaults to vpnmetrics.toml if present
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the textfile-collector directory
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Override the metric namespace prefix
    #[arg(long, value_name = "PREFIX")]
    pub namespace: Option<String>,

    /// Print the document to stdout instead of publishing it
    #[arg(long)]
    pub stdout: bool,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration,
    /// re-validating the result.
    pub fn apply(&self, config: &mut CollectorConfig) -> Result<()> {
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        config.validate()
    }
}
