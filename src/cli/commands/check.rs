use anyhow::Result;
use std::path::PathBuf;

use super::load_registry;
use crate::state_machine::transition_graph;

pub struct CheckCommand {
    pub registry: Option<PathBuf>,
}

impl CheckCommand {
    pub fn new(registry: Option<PathBuf>) -> Self {
        Self { registry }
    }

    pub fn execute(&self) -> Result<()> {
        println!("🔍 Checking purpose registry...");
        let registry = load_registry(self.registry.as_deref())?;

        println!("✅ Registry is valid");
        println!("   📦 Purposes:  {}", registry.purposes().count());
        println!("   🔀 Variants:  {}", registry.variants().ids().count());
        println!("   🤖 Robots:    {}", registry.robots().len());
        println!("   🧬 Pipelines: {}", registry.pipelines().pipelines().len());

        for id in registry.variants().ids() {
            let graph = transition_graph(registry.variant(id.as_str()));
            let unreachable = graph.unreachable_states();
            if !unreachable.is_empty() {
                let names: Vec<&str> = unreachable.iter().map(|state| state.as_str()).collect();
                println!("   ⚠️  Variant '{}' has unreachable states: {}", id, names.join(", "));
            }
        }

        if registry.warnings().is_empty() {
            println!("   🎉 No warnings");
        } else {
            println!("   ⚠️  {} warning(s) reported above", registry.warnings().len());
        }
        Ok(())
    }
}
