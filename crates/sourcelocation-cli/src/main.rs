mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "srcloc")]
#[command(about = "Inspect the files and lines touched by a unified diff", long_about = None)]
#[command(version)]
struct Cli {
    /// Number of leading path components to strip from filenames (like `patch -p`)
    #[arg(short = 'p', long, default_value_t = 0, global = true)]
    strip: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the files changed by a diff
    Files {
        /// Unified diff to read, or `-` for stdin
        diff: PathBuf,
    },

    /// List the lines changed by a diff, grouped by file
    Lines {
        /// Unified diff to read, or `-` for stdin
        diff: PathBuf,

        /// Which version of the files to report line numbers for
        #[arg(short, long, value_enum, default_value = "new")]
        side: Side,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Human,
    /// JSON output for tooling
    Json,
    /// YAML output for tooling
    Yaml,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Side {
    /// Deleted lines, numbered in the old version
    Old,
    /// Inserted lines, numbered in the new version
    New,
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they never mix with JSON/YAML output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Files { diff } => {
            commands::files::run(&diff, cli.strip, cli.format)?;
        }
        Commands::Lines { diff, side } => {
            commands::lines::run(&diff, cli.strip, side, cli.format)?;
        }
    }

    Ok(())
}
