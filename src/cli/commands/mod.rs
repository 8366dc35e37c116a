use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::labware::LabwareSnapshot;
use crate::purposes::{PurposeRegistry, RegistryStore};

pub mod check;
pub mod graph;
pub mod present;
pub mod propose;

/// Load the registry at `path`, or at the configured path when none is given
pub fn load_registry(path: Option<&Path>) -> Result<Arc<PurposeRegistry>> {
    let path: PathBuf = match path {
        Some(path) => path.to_path_buf(),
        None => crate::config::config()?.registry.path.clone(),
    };
    let store = RegistryStore::open(&path)
        .with_context(|| format!("Failed to load registry from {}", path.display()))?;
    for warning in store.snapshot().warnings() {
        println!("⚠️  {}", warning);
    }
    Ok(store.snapshot())
}

pub fn read_labware(path: &Path) -> Result<LabwareSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read labware snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid labware snapshot in {}", path.display()))
}

pub fn show_how_to_start() -> Result<()> {
    println!("🧪 purpose-presenter - labware decision engine");
    println!();
    println!("To get started:");
    println!("  ✅ purpose-presenter check                          # Validate the registry");
    println!("  🔎 purpose-presenter present --labware plate.json   # Show what a page may do");
    println!("  🗺️  purpose-presenter graph --variant standard       # Print a state machine");
    println!("  ➡️  purpose-presenter propose --labware plate.json --event take_default_path");
    println!();
    println!("💡 Set PURPOSE_PRESENTER_REGISTRY__PATH or purpose-presenter.toml to point at your registry");
    Ok(())
}
