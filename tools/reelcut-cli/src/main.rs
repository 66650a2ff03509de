//! reelcut CLI: create, inspect, export, and archive editing projects.
//!
//! Usage:
//!   reelcut init <NAME>         Create a new empty project
//!   reelcut info <PATH>         Show project information
//!   reelcut validate <PATH>     Validate a project bundle and its timeline
//!   reelcut export <PATH>       Render a project's timeline to video
//!   reelcut archive <PATH>      Zip a project's raw media
//!   reelcut check               Check ffmpeg and font availability

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelcut_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "reelcut",
    about = "Timeline video export without a render farm",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/reelcut/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Canvas width
        #[arg(long, default_value = "600")]
        width: u32,

        /// Canvas height
        #[arg(long, default_value = "320")]
        height: u32,

        /// Timeline frame rate (defaults to the configured fps)
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Show project information
    Info {
        /// Path to the project directory
        path: PathBuf,

        /// Print the timeline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a project bundle and its timeline
    Validate {
        /// Path to the project directory
        path: PathBuf,
    },

    /// Render a project's timeline to video
    Export {
        /// Path to the project directory
        path: PathBuf,

        /// Output file path (defaults to <project>/exports/<name>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Container: mp4, webm, or mov
        #[arg(long)]
        format: Option<String>,

        /// Quality preset: high (1080p), medium (720p), or low (480p)
        #[arg(long)]
        quality: Option<String>,

        /// Output file name without extension
        #[arg(long)]
        name: Option<String>,

        /// Font file for text elements
        #[arg(long)]
        font: Option<PathBuf>,
    },

    /// Zip a project's raw media
    Archive {
        /// Path to the project directory
        path: PathBuf,

        /// Output directory (defaults to <project>/exports)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Archive file name
        #[arg(long)]
        name: Option<String>,

        /// Store entries without compression
        #[arg(long)]
        store: bool,
    },

    /// Check ffmpeg and font availability
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    reelcut_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Init {
            name,
            output,
            width,
            height,
            fps,
        } => commands::init::run(
            name,
            output,
            width,
            height,
            fps.unwrap_or(config.export.fps),
            &config.export,
        ),
        Commands::Info { path, json } => commands::info::run(path, json),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Export {
            path,
            output,
            format,
            quality,
            name,
            font,
        } => {
            commands::export::run(
                &config,
                commands::export::ExportArgs {
                    path,
                    output,
                    format,
                    quality,
                    name,
                    font,
                },
            )
            .await
        }
        Commands::Archive {
            path,
            output,
            name,
            store,
        } => commands::archive::run(&config, path, output, name, store).await,
        Commands::Check => commands::check::run(&config).await,
    }
}
