use anyhow::Result;
use clap::Parser;

use purpose_presenter::cli::commands::{
    check::CheckCommand, graph::GraphCommand, present::PresentCommand, propose::ProposeCommand,
    show_how_to_start,
};
use purpose_presenter::cli::{Cli, Commands};
use purpose_presenter::config::{config, init_config};
use purpose_presenter::telemetry::init_telemetry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = config()?;
    init_telemetry(&settings.observability)?;
    init_config()?;

    match cli.command {
        None => show_how_to_start(),
        Some(Commands::Check { registry }) => CheckCommand::new(registry).execute(),
        Some(Commands::Present {
            labware,
            registry,
            anonymous,
            user,
        }) => PresentCommand {
            labware,
            registry,
            anonymous,
            user,
        }
        .execute(),
        Some(Commands::Graph {
            variant,
            registry,
            json,
        }) => GraphCommand {
            variant,
            registry,
            json,
        }
        .execute(),
        Some(Commands::Propose {
            labware,
            event,
            registry,
            simulate,
        }) => ProposeCommand {
            labware,
            event,
            registry,
            simulate,
        }
        .execute(),
    }
}
