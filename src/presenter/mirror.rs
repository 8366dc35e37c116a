// Read-through tube state for pooled presenters.
//
// The tube state of a pooled plate is never stored on its own; it is the
// plate's state. Writes are accepted and dropped so a later read still
// reports the plate's state.

use serde::Serialize;
use tracing::debug;

use crate::ids::StateName;

/// Result of an attempted write to a mirrored field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MirrorWrite {
    /// The value is derived; the write changed nothing
    Ignored { requested: StateName, mirrored: StateName },
    /// This presenter has no tube state
    NotMirrored,
}

#[derive(Debug, Clone, Copy)]
pub struct TubeStateMirror<'a> {
    source: &'a StateName,
    active: bool,
}

impl<'a> TubeStateMirror<'a> {
    pub fn new(source: &'a StateName, active: bool) -> Self {
        Self { source, active }
    }

    pub fn read(&self) -> Option<&'a StateName> {
        self.active.then_some(self.source)
    }

    pub fn write(&self, requested: StateName) -> MirrorWrite {
        if !self.active {
            return MirrorWrite::NotMirrored;
        }
        debug!(
            requested = %requested,
            mirrored = %self.source,
            "Ignoring write to mirrored tube state"
        );
        MirrorWrite::Ignored {
            requested,
            mirrored: self.source.clone(),
        }
    }
}
