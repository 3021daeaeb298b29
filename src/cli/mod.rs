//! Command-line interface.

mod commands;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings, Settings};
use commands::{
    cmd_collect, cmd_init, cmd_logs, cmd_serve, cmd_source_add, cmd_source_list,
    cmd_source_remove, cmd_source_set_enabled,
};

#[derive(Parser)]
#[command(name = "harvest")]
#[command(about = "Collect web pages as versioned Markdown documents")]
#[command(version)]
pub struct Cli {
    /// Config file (overrides discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Start the web server and daily schedule
    Serve {
        /// Address to bind: port, host, or host:port
        #[arg(short, long, default_value = "127.0.0.1:3030")]
        bind: String,
    },

    /// Run a collection in the foreground
    Collect {
        /// Source to collect
        source_id: Option<String>,
        /// Collect every enabled source
        #[arg(short, long, conflicts_with = "source_id")]
        all: bool,
    },

    /// Manage collection sources
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Show per-URL collection logs
    Logs {
        /// Only this source
        #[arg(short, long)]
        source: Option<String>,
        /// success, failed or skipped
        #[arg(long)]
        status: Option<String>,
        /// Maximum entries
        #[arg(short, long, default_value = "100")]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum SourceCommands {
    /// List configured sources
    List,
    /// Register a source
    Add {
        /// Source ID
        id: String,
        /// Page URL, or search URL pattern
        url: String,
        /// Display name (defaults to the ID)
        #[arg(short, long)]
        name: Option<String>,
        /// webpage or video
        #[arg(short = 't', long = "type", default_value = "webpage")]
        source_type: String,
        /// Source configuration as inline JSON or @path/to/file.json
        #[arg(long)]
        config: Option<String>,
        /// Search parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
        /// Register the source disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Enable a source
    Enable { id: String },
    /// Disable a source
    Disable { id: String },
    /// Remove a source
    Remove { id: String },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut settings, _config) = load_settings(cli.config.as_deref()).await?;
    if let Some(data_dir) = cli.data_dir {
        settings.collections_dir = Settings::with_data_dir(data_dir.clone()).collections_dir;
        settings.data_dir = data_dir;
    }

    match cli.command {
        Commands::Init => cmd_init(&settings).await,
        Commands::Serve { bind } => cmd_serve(&settings, &bind).await,
        Commands::Collect { source_id, all } => {
            cmd_collect(&settings, source_id.as_deref(), all).await
        }
        Commands::Source { command } => match command {
            SourceCommands::List => cmd_source_list(&settings).await,
            SourceCommands::Add {
                id,
                url,
                name,
                source_type,
                config,
                params,
                disabled,
            } => {
                cmd_source_add(
                    &settings,
                    commands::NewSourceArgs {
                        id,
                        url,
                        name,
                        source_type,
                        config,
                        params,
                        enabled: !disabled,
                    },
                )
                .await
            }
            SourceCommands::Enable { id } => cmd_source_set_enabled(&settings, &id, true).await,
            SourceCommands::Disable { id } => cmd_source_set_enabled(&settings, &id, false).await,
            SourceCommands::Remove { id } => cmd_source_remove(&settings, &id).await,
        },
        Commands::Logs {
            source,
            status,
            limit,
        } => cmd_logs(&settings, source, status.as_deref(), limit).await,
    }
}
