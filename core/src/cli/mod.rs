pub mod commands;

use crate::config::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "triage")]
#[command(author, version, about = "Classify support tickets by category and priority", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify one or more ticket descriptions
    Classify {
        /// Ticket descriptions (one classification each)
        descriptions: Vec<String>,

        /// Also read descriptions from stdin, one per line
        /// (plain text or {"description": "..."} JSON)
        #[arg(long)]
        stdin: bool,

        /// Skip the model and use keyword heuristics only
        #[arg(long)]
        offline: bool,

        /// Maximum concurrent classifications
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Show the signals extracted from a description
    Signals {
        description: String,
    },

    /// Print the prompt that would be sent to the model
    Prompt {
        description: String,
    },

    /// Show the keyword and urgency vocabularies
    Patterns {
        /// Show only a specific category
        #[arg(short, long)]
        category: Option<String>,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<(), String> {
    let settings = Settings::from_env();

    match cli.command {
        Commands::Classify {
            descriptions,
            stdin,
            offline,
            concurrency,
        } => commands::classify::run(
            &settings,
            descriptions,
            stdin,
            offline,
            concurrency,
            cli.format,
        )?,
        Commands::Signals { description } => commands::signals::run(&description, cli.format)?,
        Commands::Prompt { description } => commands::prompt::run(&description)?,
        Commands::Patterns { category } => {
            commands::patterns::run(category.as_deref(), cli.format)?;
        }
    }
    Ok(())
}
