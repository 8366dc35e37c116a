// Seams to the tracking backend.
//
// The core never performs a state change itself. It hands a `TransitionIntent`
// to a submitter and then asks a source for the new authoritative snapshot.

use uuid::Uuid;

use super::intent::TransitionIntent;
use crate::errors::SourceError;
use crate::labware::LabwareSnapshot;

/// Fetches the authoritative copy of a labware item
pub trait LabwareSource {
    fn fetch(&self, uuid: Uuid) -> Result<LabwareSnapshot, SourceError>;
}

/// Performs a transition through the external mutation API
pub trait TransitionSubmitter {
    fn submit(&self, intent: &TransitionIntent) -> Result<(), SourceError>;
}
