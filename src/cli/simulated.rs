// Stand-in tracking backend for `propose --simulate`
//
// Holds a single labware snapshot and moves it to the advisory state of each
// submitted intent, the way the real backend would for a legal event.

use std::cell::RefCell;
use uuid::Uuid;

use crate::errors::SourceError;
use crate::labware::LabwareSnapshot;
use crate::transitions::{LabwareSource, TransitionIntent, TransitionSubmitter};

#[derive(Debug)]
pub struct SimulatedBackend {
    labware: RefCell<LabwareSnapshot>,
    submissions: RefCell<Vec<TransitionIntent>>,
}

impl SimulatedBackend {
    pub fn new(labware: LabwareSnapshot) -> Self {
        Self {
            labware: RefCell::new(labware),
            submissions: RefCell::new(Vec::new()),
        }
    }

    /// Intents accepted so far, oldest first
    pub fn submissions(&self) -> Vec<TransitionIntent> {
        self.submissions.borrow().clone()
    }
}

impl LabwareSource for SimulatedBackend {
    fn fetch(&self, uuid: Uuid) -> Result<LabwareSnapshot, SourceError> {
        let labware = self.labware.borrow();
        if labware.uuid != uuid {
            return Err(SourceError::NotFound(uuid));
        }
        Ok(labware.clone())
    }
}

impl TransitionSubmitter for SimulatedBackend {
    fn submit(&self, intent: &TransitionIntent) -> Result<(), SourceError> {
        let mut labware = self.labware.borrow_mut();
        if labware.uuid != intent.labware {
            return Err(SourceError::NotFound(intent.labware));
        }
        tracing::debug!(
            labware = %intent.labware,
            from = %labware.state,
            to = %intent.advisory_state,
            "Simulating backend transition"
        );
        labware.state = intent.advisory_state.clone();
        self.submissions.borrow_mut().push(intent.clone());
        Ok(())
    }
}
