//! LobbyWatch CLI - Report players joining a game lobby
//!
//! A command-line tool for watching lobby traffic, inspecting the
//! game's UDP ports, and decoding captured payloads.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "lobbywatch=info,lobbywatch_core=info";
const VERBOSE_LOG_FILTER: &str = "lobbywatch=debug,lobbywatch_core=debug";

#[derive(Parser)]
#[command(name = "lobbywatch")]
#[command(author, version, about = "Report players joining a game lobby")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture lobby traffic and report joining players
    Watch {
        /// Record sightings locally instead of notifying a collaborator
        #[arg(long)]
        local: bool,

        /// Override the monitored process name
        #[arg(short, long)]
        process: Option<String>,

        /// Override the collaborator base URL
        #[arg(long)]
        notify_url: Option<String>,
    },

    /// Show the UDP ports bound by the game process
    Ports {
        /// Override the monitored process name
        #[arg(short, long)]
        process: Option<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Decode a captured lobby payload
    Decode {
        /// File holding the raw UDP payload
        file: PathBuf,

        /// The file contains hex text instead of raw bytes
        #[arg(long)]
        hex: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set the monitored process name
    SetProcess { name: String },
    /// Set the collaborator base URL
    SetNotifyUrl { url: String },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Watch {
            local,
            process,
            notify_url,
        } => {
            commands::watch::run(local, process, notify_url).await?;
        }
        Commands::Ports { process, json } => {
            commands::ports::run(process, json).await?;
        }
        Commands::Decode { file, hex, json } => {
            commands::decode::run(&file, hex, json).await?;
        }
        Commands::Config { action, json } => match action {
            Some(ConfigAction::SetProcess { name }) => commands::config::set_process(&name).await?,
            Some(ConfigAction::SetNotifyUrl { url }) => commands::config::set_notify_url(&url).await?,
            None => commands::config::show(json).await?,
        },
    }

    Ok(())
}
