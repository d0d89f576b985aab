// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Negframe — film/print scan frame extraction
//
// Entry point. Initialises logging, loads the pipeline configuration, and
// dispatches to single-file processing, the folder watcher, or config output.
// Logs go to stderr; stdout carries only result records and config JSON.

mod watch;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use negframe_core::PipelineConfig;
use negframe_core::error::Result;
use negframe_frame::FrameExtractor;
use tracing_subscriber::EnvFilter;

use watch::{FolderWatcher, WatchOptions};

#[derive(Debug, Parser)]
#[command(name = "negframe", version, about = "Crop and deskew scanned film frames and prints")]
struct Cli {
    /// JSON pipeline configuration (missing sections use defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Extract the frame from one scan and print its result record.
    Process {
        image: PathBuf,

        /// Also write the result record to this file.
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Process every new scan that appears in a folder until Ctrl-C.
    Watch {
        folder: PathBuf,

        /// Delay before a new file is read, in milliseconds.
        #[arg(long, default_value_t = 2000)]
        settle_ms: u64,

        /// Folder polling interval, in milliseconds.
        #[arg(long, default_value_t = 1000)]
        poll_ms: u64,

        /// Program to open each output image with.
        #[arg(long)]
        viewer: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON, or write it to a file.
    Config {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "negframe failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Process { image, record } => {
            let result = FrameExtractor::new(config).process_file(&image)?;
            if let Some(path) = record {
                result.write_json(&path)?;
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Watch {
            folder,
            settle_ms,
            poll_ms,
            viewer,
        } => {
            let options = WatchOptions {
                settle: Duration::from_millis(settle_ms),
                poll: Duration::from_millis(poll_ms.max(1)),
                viewer,
                ..WatchOptions::new(folder)
            };
            let watcher = FolderWatcher::new(options, FrameExtractor::new(config))?;
            let shutdown = watcher.shutdown_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Ctrl-C received; stopping watcher");
                    shutdown.notify_one();
                }
            });
            watcher.run().await?;
        }
        Command::Config { output } => match output {
            Some(path) => {
                config.to_json_file(&path)?;
                tracing::info!(path = %path.display(), "Configuration written");
            }
            None => println!("{}", serde_json::to_string_pretty(&config)?),
        },
    }
    Ok(())
}
