use anyhow::Result;
use std::path::PathBuf;

use super::{load_registry, read_labware};
use crate::cli::simulated::SimulatedBackend;
use crate::labware::AuthContext;
use crate::presenter::Presenter;
use crate::transitions::TransitionCoordinator;

pub struct ProposeCommand {
    pub labware: PathBuf,
    pub event: String,
    pub registry: Option<PathBuf>,
    pub simulate: bool,
}

impl ProposeCommand {
    pub fn execute(&self) -> Result<()> {
        let registry = load_registry(self.registry.as_deref())?;
        let labware = read_labware(&self.labware)?;
        let presenter = Presenter::new(labware.clone(), registry.clone(), AuthContext::user("cli"));

        let intent = match presenter.propose(&self.event) {
            Ok(intent) => intent,
            Err(rejection) => {
                println!("❌ {}", rejection);
                if rejection.legal_events.is_empty() {
                    println!("   No events leave '{}'", rejection.current_state);
                } else {
                    let legal: Vec<&str> = rejection.legal_events.iter().map(|event| event.as_str()).collect();
                    println!("   💡 Legal events: {}", legal.join(", "));
                }
                return Err(rejection.into());
            }
        };

        println!("➡️  {} --{}--> {} (advisory)", intent.from_state, intent.event, intent.advisory_state);
        println!("{}", serde_json::to_string_pretty(&intent)?);

        if self.simulate {
            let backend = SimulatedBackend::new(labware);
            let coordinator = TransitionCoordinator::new(&backend, &backend);
            let outcome = coordinator.request(&presenter, &self.event)?;
            println!();
            println!("🔄 Simulated hand-off finished ({:?})", outcome.phase);
            let refreshed = outcome.into_presenter(registry, AuthContext::user("cli"));
            let events: Vec<String> = refreshed.legal_events().into_iter().map(|event| event.to_string()).collect();
            println!("   📍 State now: {}", refreshed.current_state());
            println!("   ➡️  Legal events: {}", events.join(", "));
        }
        Ok(())
    }
}
