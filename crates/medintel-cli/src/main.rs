use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use medintel_infrastructure::ConfigService;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "medintel")]
#[command(about = "MedIntel CLI - consultation identity and prescription tools", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.config/medintel/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the room, patient and doctor an address fragment resolves to
    Resolve {
        /// Fragment such as "#room42?patientid=P1&doctorid=D1"
        fragment: String,
    },
    /// List past prescriptions for the patient in the fragment
    History {
        fragment: String,
        /// Print raw JSON instead of the numbered list
        #[arg(long)]
        json: bool,
    },
    /// Save a prescription for the patient and doctor in the fragment
    Prescribe {
        fragment: String,
        /// Line item as name:count:dosage (repeatable)
        #[arg(long = "item", required = true, value_name = "NAME:COUNT:DOSAGE")]
        items: Vec<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_service = match cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let config = config_service.load()?;

    match cli.command {
        Commands::Resolve { fragment } => commands::resolve::run(&config, &fragment)?,
        Commands::History { fragment, json } => {
            commands::history::run(&config, &fragment, json).await?
        }
        Commands::Prescribe { fragment, items } => {
            commands::prescribe::run(&config, &fragment, &items).await?
        }
        Commands::Config => commands::config::show(&config_service, &config)?,
    }

    Ok(())
}
