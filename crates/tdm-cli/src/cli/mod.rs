//! CLI for the tdm thesis batch downloader.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tdm_core::config::{self, SinkKind};

use commands::{run_checksum, run_pipeline, RunOverrides};

/// Top-level CLI for the tdm thesis batch downloader.
#[derive(Debug, Parser)]
#[command(name = "tdm")]
#[command(about = "tdm: batch thesis PDF downloader with checksum verification", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Sink backend selector for `--sink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SinkArg {
    Csv,
    Sqlite,
}

impl From<SinkArg> for SinkKind {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::Csv => SinkKind::Csv,
            SinkArg::Sqlite => SinkKind::Sqlite,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download and verify every thesis row in the configured window.
    Run {
        /// Input CSV export (overrides the config file).
        #[arg(long, value_name = "PATH")]
        input: Option<PathBuf>,

        /// Output destination: CSV file or SQLite database (overrides the config file).
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Outcome sink backend.
        #[arg(long, value_enum)]
        sink: Option<SinkArg>,

        /// Directory downloaded PDFs are written into.
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,

        /// Skip the first N rows.
        #[arg(long, value_name = "N")]
        offset: Option<usize>,

        /// Process at most N rows after the offset (0 = no limit).
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Unique identifier column (required by the sqlite sink).
        #[arg(long, value_name = "COLUMN")]
        id_column: Option<String>,
    },

    /// Compute MD5 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run {
                input,
                output,
                sink,
                download_dir,
                offset,
                limit,
                id_column,
            } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let overrides = RunOverrides {
                    input,
                    output,
                    sink: sink.map(SinkKind::from),
                    download_dir,
                    offset,
                    limit,
                    id_column,
                };
                run_pipeline(cfg, overrides).await?;
            }
            CliCommand::Checksum { path } => run_checksum(Path::new(&path))?,
        }

        Ok(())
    }
}
