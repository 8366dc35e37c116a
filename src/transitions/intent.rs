use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{EventName, PurposeId, StateName};

/// A transition the core has decided to offer.
///
/// Handed to the external mutation API as is. `advisory_state` is what the
/// state machine expects to happen; the authoritative result is whatever
/// the re-fetched snapshot reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionIntent {
    pub labware: Uuid,
    pub purpose: PurposeId,
    pub event: EventName,
    pub from_state: StateName,
    pub advisory_state: StateName,
}

impl TransitionIntent {
    /// Whether `observed` is the state this intent expected to produce
    pub fn matches(&self, observed: &StateName) -> bool {
        &self.advisory_state == observed
    }
}
