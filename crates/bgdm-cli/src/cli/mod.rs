//! CLI for the BGDM scenario background downloader.

mod commands;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_pipeline, show_config, RunArgs};

/// Top-level CLI for the BGDM downloader.
#[derive(Debug, Parser)]
#[command(name = "bgdm")]
#[command(about = "BGDM: batched scenario background downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download backgrounds for a range of numbered scenarios.
    Run {
        /// Output directory (default from config).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Concurrent downloads, 1-64 (default from config).
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Scenarios per batch (default from config).
        #[arg(long, value_name = "N")]
        batch_size: Option<usize>,
        /// First scenario number.
        #[arg(long, default_value = "0")]
        start: u32,
        /// Last scenario number (inclusive).
        #[arg(long, default_value = "123")]
        end: u32,
        /// Save all files into one directory instead of per-scenario subdirs.
        #[arg(long)]
        flat: bool,
    },

    /// Show the config file path and effective configuration.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        match cli.command {
            CliCommand::Run {
                output,
                concurrency,
                batch_size,
                start,
                end,
                flat,
            } => {
                run_pipeline(RunArgs {
                    output,
                    concurrency,
                    batch_size,
                    start,
                    end,
                    flat,
                })
                .await
            }
            CliCommand::Config => show_config(),
        }
    }
}
