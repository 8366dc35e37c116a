use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
pub mod simulated;

#[derive(Parser)]
#[command(name = "purpose-presenter")]
#[command(about = "Decide what a labware page may show and do")]
#[command(long_about = "purpose-presenter evaluates labware snapshots against a purpose registry: \
                       which tabs and actions are permitted, which children can be made, which robots \
                       apply, and which transitions are legal. Start with 'purpose-presenter check' \
                       to validate your registry.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a purpose registry and print what it contains
    Check {
        /// Registry document to load
        #[arg(long, help = "Path of the registry TOML (defaults to the configured path)")]
        registry: Option<PathBuf>,
    },
    /// Print the full decision surface for a labware snapshot
    Present {
        /// Labware snapshot to evaluate
        #[arg(long, help = "Path of a labware snapshot JSON file")]
        labware: PathBuf,
        /// Registry document to load
        #[arg(long, help = "Path of the registry TOML (defaults to the configured path)")]
        registry: Option<PathBuf>,
        /// Evaluate as an unauthenticated visitor
        #[arg(long, help = "Evaluate as an anonymous visitor instead of a logged-in user")]
        anonymous: bool,
        /// Login to evaluate as
        #[arg(long, default_value = "cli", help = "User login recorded in the auth context")]
        user: String,
    },
    /// Print the transition graph of a state machine variant
    Graph {
        /// Variant id, e.g. standard or automated
        #[arg(long, help = "State machine variant to print")]
        variant: String,
        /// Registry document to load
        #[arg(long, help = "Path of the registry TOML (defaults to the configured path)")]
        registry: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long, help = "Emit the graph as JSON")]
        json: bool,
    },
    /// Show the transition intent for an event, or why it is rejected
    Propose {
        /// Labware snapshot to evaluate
        #[arg(long, help = "Path of a labware snapshot JSON file")]
        labware: PathBuf,
        /// Event to propose
        #[arg(long, help = "Event name, e.g. take_default_path")]
        event: String,
        /// Registry document to load
        #[arg(long, help = "Path of the registry TOML (defaults to the configured path)")]
        registry: Option<PathBuf>,
        /// Run the hand-off against an in-memory tracking service
        #[arg(long, help = "Simulate submission and re-fetch without contacting a backend")]
        simulate: bool,
    },
}
