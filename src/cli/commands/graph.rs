use anyhow::{bail, Result};
use std::path::PathBuf;

use super::load_registry;
use crate::state_machine::transition_graph;

pub struct GraphCommand {
    pub variant: String,
    pub registry: Option<PathBuf>,
    pub json: bool,
}

impl GraphCommand {
    pub fn execute(&self) -> Result<()> {
        let registry = load_registry(self.registry.as_deref())?;
        if !registry.variants().contains(&self.variant) {
            let known: Vec<&str> = registry.variants().ids().map(|id| id.as_str()).collect();
            bail!(
                "Unknown state machine variant '{}' (known: {})",
                self.variant,
                known.join(", ")
            );
        }

        let graph = transition_graph(registry.variant(&self.variant));
        if self.json {
            println!("{}", serde_json::to_string_pretty(&graph)?);
            return Ok(());
        }

        println!("🗺️  State machine '{}'", graph.variant);
        if let Some(initial) = &graph.initial {
            println!("   ▶️  initial: {}", initial);
        }
        for edge in &graph.transitions {
            println!("   {} --{}--> {}", edge.start, edge.event, edge.goal);
        }
        let terminal: Vec<&str> = graph.terminal_states().iter().map(|state| state.as_str()).collect();
        if !terminal.is_empty() {
            println!("   ⏹️  terminal: {}", terminal.join(", "));
        }
        Ok(())
    }
}
