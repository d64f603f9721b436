use std::path::PathBuf;

use anyhow::Result;
use carebot_core::lookup::MedicineQuery;
use clap::{Parser, Subcommand};

mod bootstrap;
mod commands;
mod init_logging;

use bootstrap::Bootstrap;

#[derive(Parser)]
#[command(name = "carebot")]
#[command(about = "CareBot - conversational healthcare assistants", long_about = None)]
struct Cli {
    /// Directory holding config.toml and secret.json (default: ~/.config/carebot)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with an assistant persona
    Chat {
        /// Persona id (see `carebot personas`)
        #[arg(short, long, default_value = "dadi")]
        persona: String,
        /// Your name, used to personalize replies
        #[arg(long)]
        name: Option<String>,
        /// Disable text-to-speech
        #[arg(long)]
        no_speech: bool,
    },
    /// List available personas
    Personas,
    /// Check a medicine against the trusted list
    Verify {
        #[arg(long)]
        name: String,
        #[arg(long)]
        manufacturer: String,
        #[arg(long)]
        batch: Option<String>,
        /// Expiry date as YYYY-MM-DD
        #[arg(long)]
        expiry: Option<String>,
    },
    /// Find hospitals for an emergency
    Hospitals {
        /// accident, heart-attack, stroke, breathing, injury, poisoning or other
        incident: String,
        #[arg(long, default_value = "high")]
        priority: String,
        #[arg(long)]
        description: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let bootstrap = Bootstrap::load(cli.config_dir.as_deref()).await?;
    init_logging::init_logging(&bootstrap.config.logging.level);
    bootstrap.log_config();

    match cli.command {
        Commands::Chat {
            persona,
            name,
            no_speech,
        } => {
            let factory = bootstrap.session_factory(name, !no_speech).await?;
            commands::chat::run(&factory, &persona).await?
        }
        Commands::Personas => commands::personas::list(&bootstrap.config)?,
        Commands::Verify {
            name,
            manufacturer,
            batch,
            expiry,
        } => {
            commands::verify::run(MedicineQuery {
                name,
                manufacturer,
                batch_number: batch,
                expiry_date: expiry,
            })
            .await?
        }
        Commands::Hospitals {
            incident,
            priority,
            description,
        } => commands::hospitals::run(&incident, &priority, description).await?,
    }

    Ok(())
}
