use anyhow::Result;
use std::path::PathBuf;

use super::{load_registry, read_labware};
use crate::labware::AuthContext;
use crate::presenter::Presenter;

pub struct PresentCommand {
    pub labware: PathBuf,
    pub registry: Option<PathBuf>,
    pub anonymous: bool,
    pub user: String,
}

impl PresentCommand {
    pub fn auth(&self) -> AuthContext {
        if self.anonymous {
            AuthContext::anonymous()
        } else {
            AuthContext::user(self.user.clone())
        }
    }

    pub fn execute(&self) -> Result<()> {
        let registry = load_registry(self.registry.as_deref())?;
        let labware = read_labware(&self.labware)?;
        let presenter = Presenter::new(labware, registry, self.auth());

        let surface = presenter.decision_surface();
        println!("{}", serde_json::to_string_pretty(&surface)?);
        Ok(())
    }
}
