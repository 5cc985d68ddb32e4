//! CLI frontend for the Tabula character-sheet engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "tb",
    about = "Tabula, an event-sourced TTRPG character sheet engine",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a dice-free formula
    Eval {
        /// Formula, e.g. "({Grade} + {Body}) * 5"
        #[arg(allow_hyphen_values = true)]
        formula: String,

        #[command(flatten)]
        character: CharacterArgs,
    },

    /// Roll a formula with dice
    Roll {
        /// Formula, e.g. "2d6 + {Combat}"
        #[arg(allow_hyphen_values = true)]
        formula: String,

        /// RNG seed for a reproducible roll
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        character: CharacterArgs,
    },

    /// Replay an event log and print the character sheet
    State {
        /// JSON file holding the event log
        events: PathBuf,

        /// JSON file of base stats, e.g. {"Grade": 1, "肉体": 3}
        #[arg(short, long)]
        base: Option<PathBuf>,

        /// JSON ruleset replacing the standard rules
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Handle one chat line: resource command, roll, or text
    Chat {
        /// The line, e.g. "2d6 Attack" or ":hp-3"
        #[arg(allow_hyphen_values = true)]
        input: String,

        /// RNG seed for a reproducible roll
        #[arg(short, long)]
        seed: Option<u64>,

        #[command(flatten)]
        character: CharacterArgs,
    },
}

/// Where the character comes from.
#[derive(clap::Args)]
struct CharacterArgs {
    /// JSON file holding the event log
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// JSON file of base stats, e.g. {"Grade": 1, "肉体": 3}
    #[arg(short, long)]
    base: Option<PathBuf>,
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("TB_LOG").unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval { formula, character } => commands::eval::run(
            &formula,
            character.events.as_deref(),
            character.base.as_deref(),
        ),
        Commands::Roll {
            formula,
            seed,
            character,
        } => commands::roll::run(
            &formula,
            seed,
            character.events.as_deref(),
            character.base.as_deref(),
        ),
        Commands::State {
            events,
            base,
            rules,
            json,
        } => commands::state::run(&events, base.as_deref(), rules.as_deref(), json),
        Commands::Chat {
            input,
            seed,
            character,
        } => commands::chat::run(
            &input,
            seed,
            character.events.as_deref(),
            character.base.as_deref(),
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
