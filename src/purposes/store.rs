// Atomic publication of registry snapshots.
//
// Readers load an `Arc<PurposeRegistry>` and keep using it for the whole
// request. A reload builds and validates the replacement first, then swaps
// it in with a single store; a failed reload leaves the old snapshot live.

use arc_swap::ArcSwap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use super::registry::PurposeRegistry;
use crate::errors::ConfigError;

#[derive(Debug)]
pub struct RegistryStore {
    current: ArcSwap<PurposeRegistry>,
    source: Option<PathBuf>,
}

impl RegistryStore {
    pub fn new(registry: PurposeRegistry) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
            source: None,
        }
    }

    /// Load from `path` and remember it for [`RegistryStore::reload`]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let registry = PurposeRegistry::from_path(&path)?;
        Ok(Self {
            current: ArcSwap::from_pointee(registry),
            source: Some(path),
        })
    }

    /// The snapshot to use for one request
    pub fn snapshot(&self) -> Arc<PurposeRegistry> {
        self.current.load_full()
    }

    /// Publish an already validated registry
    pub fn replace(&self, registry: PurposeRegistry) -> Arc<PurposeRegistry> {
        self.current.swap(Arc::new(registry))
    }

    /// Re-read the source file; on failure the current snapshot stays in place
    pub fn reload(&self) -> Result<Arc<PurposeRegistry>, ConfigError> {
        let Some(path) = &self.source else {
            return Ok(self.snapshot());
        };
        match PurposeRegistry::from_path(path) {
            Ok(registry) => {
                self.replace(registry);
                info!(path = %path.display(), "Registry reloaded");
                Ok(self.snapshot())
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Registry reload failed; keeping previous snapshot");
                Err(e)
            }
        }
    }
}
