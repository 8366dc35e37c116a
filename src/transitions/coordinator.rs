use serde::Serialize;
use statig::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::intent::TransitionIntent;
use super::lifecycle::{RequestEvent, RequestPhase, TransitionRequest};
use super::traits::{LabwareSource, TransitionSubmitter};
use crate::errors::{PresenterError, SourceError};
use crate::ids::EventName;
use crate::labware::{AuthContext, LabwareSnapshot};
use crate::presenter::Presenter;
use crate::purposes::PurposeRegistry;
use crate::telemetry::{create_presenter_span, generate_correlation_id};

/// Result of a completed hand-off
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub intent: TransitionIntent,
    /// Re-fetched snapshot; its state is authoritative
    pub snapshot: LabwareSnapshot,
    pub phase: RequestPhase,
}

impl TransitionOutcome {
    /// Whether the backend ended up where the state machine expected
    pub fn confirmed(&self) -> bool {
        self.intent.matches(&self.snapshot.state)
    }

    /// Fresh presenter over the re-fetched snapshot
    pub fn into_presenter(self, registry: Arc<PurposeRegistry>, auth: AuthContext) -> Presenter {
        Presenter::new(self.snapshot, registry, auth)
    }
}

/// Hands transitions to the backend and re-fetches afterwards
pub struct TransitionCoordinator<'a> {
    source: &'a dyn LabwareSource,
    submitter: &'a dyn TransitionSubmitter,
}

impl<'a> TransitionCoordinator<'a> {
    pub fn new(source: &'a dyn LabwareSource, submitter: &'a dyn TransitionSubmitter) -> Self {
        Self { source, submitter }
    }

    /// Propose `event`, submit it, and re-fetch the labware.
    ///
    /// Nothing is submitted when the event is not legal from the current
    /// state. A failed re-fetch after a successful submission is reported as
    /// `StaleSnapshot`; the old presenter must not be used to decide anything
    /// further.
    pub fn request(&self, presenter: &Presenter, event: &str) -> Result<TransitionOutcome, PresenterError> {
        let labware = presenter.labware();
        let correlation_id = generate_correlation_id();
        let span = create_presenter_span(
            "transition",
            Some(&labware.uuid),
            Some(labware.purpose.id.as_str()),
            Some(labware.state.as_str()),
            Some(&correlation_id),
        );
        let _entered = span.enter();

        let mut machine = TransitionRequest::new(labware.uuid).state_machine();

        let intent = match presenter.propose(event) {
            Ok(intent) => intent,
            Err(rejection) => {
                machine.handle(&RequestEvent::Rejected {
                    reason: rejection.to_string(),
                });
                return Err(rejection.into());
            }
        };
        machine.handle(&RequestEvent::Proposed {
            event: EventName::from(event),
        });

        if let Err(source) = self.submitter.submit(&intent) {
            machine.handle(&RequestEvent::SubmitFailed {
                reason: source.to_string(),
            });
            return Err(PresenterError::Submission {
                uuid: intent.labware,
                source,
            });
        }
        machine.handle(&RequestEvent::Submitted);

        let snapshot = match self.source.fetch(intent.labware) {
            Ok(snapshot) => snapshot,
            Err(source) => {
                machine.handle(&RequestEvent::RefetchFailed {
                    reason: source.to_string(),
                });
                return Err(PresenterError::StaleSnapshot {
                    uuid: intent.labware,
                    source,
                });
            }
        };
        machine.handle(&RequestEvent::Refreshed {
            state: snapshot.state.clone(),
        });

        if !intent.matches(&snapshot.state) {
            warn!(
                expected = %intent.advisory_state,
                observed = %snapshot.state,
                "Backend state differs from the advisory target; using the backend's"
            );
        }
        info!(
            event = %intent.event,
            from = %intent.from_state,
            to = %snapshot.state,
            "Transition complete"
        );

        Ok(TransitionOutcome {
            intent,
            snapshot,
            phase: machine.state().phase(),
        })
    }

    /// Re-fetch a labware, e.g. after a `StaleSnapshot` error
    pub fn refresh(&self, uuid: Uuid) -> Result<LabwareSnapshot, SourceError> {
        self.source.fetch(uuid)
    }
}
