//! Reelcut CLI: command-line interface for turning long videos into
//! captioned vertical clips.
//!
//! Usage:
//!   reelcut render <SOURCE> --segments <JSON>   Render clips for segments
//!   reelcut probe <SOURCE>                      Show source media properties
//!   reelcut plan --width W --height H           Show the 9:16 layout plan
//!   reelcut check                               Check system capabilities

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "reelcut",
    about = "Vertical clip composition with word-synced captions",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render vertical clips for a list of segments
    Render {
        /// Source video
        source: PathBuf,

        /// JSON file with the segments to render
        #[arg(short, long)]
        segments: PathBuf,

        /// JSON file with word timings for captions
        #[arg(short, long)]
        words: Option<PathBuf>,

        /// Output directory (defaults to the configured clip directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Render only the N-th segment (1-based)
        #[arg(long)]
        only: Option<usize>,

        /// Disable burned-in captions
        #[arg(long)]
        no_captions: bool,

        /// Words per caption chunk
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Show source media properties
    Probe {
        /// Source video
        source: PathBuf,
    },

    /// Show the layout plan for a source resolution
    Plan {
        /// Source width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Source height
        #[arg(long, default_value = "1080")]
        height: u32,
    },

    /// Check system capabilities
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = reelcut_common::config::AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reelcut_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Render {
            source,
            segments,
            words,
            output_dir,
            only,
            no_captions,
            chunk_size,
        } => {
            commands::render::run(
                config,
                commands::render::RenderArgs {
                    source,
                    segments,
                    words,
                    output_dir,
                    only,
                    no_captions,
                    chunk_size,
                },
            )
            .await
        }
        Commands::Probe { source } => commands::probe::run(&config, source),
        Commands::Plan { width, height } => commands::plan::run(&config, width, height),
        Commands::Check => commands::check::run(&config),
    }
}
