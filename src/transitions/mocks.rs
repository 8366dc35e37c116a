// Recording tracking service for unit tests - no side effects outside itself
//
// Applies the advisory state of each submitted intent (or a configured
// override) to its stored snapshot, and records every call.

use std::cell::RefCell;
use std::collections::HashMap;
use uuid::Uuid;

use super::intent::TransitionIntent;
use super::traits::{LabwareSource, TransitionSubmitter};
use crate::errors::SourceError;
use crate::ids::StateName;
use crate::labware::LabwareSnapshot;

#[derive(Debug, Default)]
pub struct MockTrackingService {
    pub labware: RefCell<HashMap<Uuid, LabwareSnapshot>>,
    pub resulting_state: RefCell<Option<StateName>>,
    pub submit_failure: RefCell<Option<SourceError>>,
    pub fetch_failure: RefCell<Option<SourceError>>,
    pub submitted: RefCell<Vec<TransitionIntent>>,
    pub fetches: RefCell<Vec<Uuid>>,
}

impl MockTrackingService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_labware(&self, labware: LabwareSnapshot) {
        self.labware.borrow_mut().insert(labware.uuid, labware);
    }

    /// Make the backend land somewhere other than the advisory target
    pub fn set_resulting_state(&self, state: &str) {
        *self.resulting_state.borrow_mut() = Some(StateName::from(state));
    }

    pub fn fail_submit(&self, error: SourceError) {
        *self.submit_failure.borrow_mut() = Some(error);
    }

    pub fn fail_fetch(&self, error: SourceError) {
        *self.fetch_failure.borrow_mut() = Some(error);
    }

    pub fn clear_failures(&self) {
        *self.submit_failure.borrow_mut() = None;
        *self.fetch_failure.borrow_mut() = None;
    }

    pub fn submitted(&self) -> Vec<TransitionIntent> {
        self.submitted.borrow().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.borrow().len()
    }
}

impl LabwareSource for MockTrackingService {
    fn fetch(&self, uuid: Uuid) -> Result<LabwareSnapshot, SourceError> {
        self.fetches.borrow_mut().push(uuid);
        if let Some(error) = self.fetch_failure.borrow().clone() {
            return Err(error);
        }
        self.labware
            .borrow()
            .get(&uuid)
            .cloned()
            .ok_or(SourceError::NotFound(uuid))
    }
}

impl TransitionSubmitter for MockTrackingService {
    fn submit(&self, intent: &TransitionIntent) -> Result<(), SourceError> {
        self.submitted.borrow_mut().push(intent.clone());
        if let Some(error) = self.submit_failure.borrow().clone() {
            return Err(error);
        }
        let mut labware = self.labware.borrow_mut();
        let stored = labware
            .get_mut(&intent.labware)
            .ok_or(SourceError::NotFound(intent.labware))?;
        stored.state = self
            .resulting_state
            .borrow()
            .clone()
            .unwrap_or_else(|| intent.advisory_state.clone());
        Ok(())
    }
}
