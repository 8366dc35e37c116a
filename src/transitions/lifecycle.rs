use serde::Serialize;
use statig::prelude::*;
use uuid::Uuid;

use crate::ids::{EventName, StateName};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEvent {
    Proposed { event: EventName },
    Rejected { reason: String },
    Submitted,
    SubmitFailed { reason: String },
    Refreshed { state: StateName },
    RefetchFailed { reason: String },
}

/// Where a transition request ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPhase {
    Idle,
    Proposed,
    Submitted,
    Refreshed,
    Stale,
    Rejected,
    Failed,
}

/// One hand-off of a transition to the tracking backend.
///
/// idle -> proposed -> submitted -> refreshed, with `rejected` before any
/// external call, `failed` when the submission errors and `stale` when the
/// backend accepted the change but the re-fetch did not succeed. A stale
/// request becomes refreshed once a later re-fetch succeeds.
#[derive(Debug, Default)]
pub struct TransitionRequest {
    pub labware: Uuid,
    pub event: Option<EventName>,
    pub observed_state: Option<StateName>,
    pub last_error: Option<String>,
}

impl TransitionRequest {
    pub fn new(labware: Uuid) -> Self {
        Self {
            labware,
            ..Default::default()
        }
    }
}

#[state_machine(initial = "State::idle()", state(derive(Debug, Clone, PartialEq, Eq)))]
impl TransitionRequest {
    #[state]
    fn idle(&mut self, event: &RequestEvent) -> Outcome<State> {
        match event {
            RequestEvent::Proposed { event } => {
                self.event = Some(event.clone());
                tracing::debug!(labware = %self.labware, event = %event, "Transition proposed");
                Transition(State::proposed())
            }
            RequestEvent::Rejected { reason } => {
                self.last_error = Some(reason.clone());
                tracing::info!(labware = %self.labware, reason = %reason, "Transition rejected");
                Transition(State::rejected())
            }
            _ => Handled,
        }
    }

    #[state]
    fn proposed(&mut self, event: &RequestEvent) -> Outcome<State> {
        match event {
            RequestEvent::Submitted => {
                tracing::info!(labware = %self.labware, event = ?self.event, "Transition submitted");
                Transition(State::submitted())
            }
            RequestEvent::SubmitFailed { reason } => {
                self.last_error = Some(reason.clone());
                tracing::error!(labware = %self.labware, reason = %reason, "Transition submission failed");
                Transition(State::failed())
            }
            _ => Handled,
        }
    }

    #[state]
    fn submitted(&mut self, event: &RequestEvent) -> Outcome<State> {
        match event {
            RequestEvent::Refreshed { state } => {
                self.observed_state = Some(state.clone());
                tracing::debug!(labware = %self.labware, state = %state, "Snapshot refreshed");
                Transition(State::refreshed())
            }
            RequestEvent::RefetchFailed { reason } => {
                self.last_error = Some(reason.clone());
                tracing::warn!(labware = %self.labware, reason = %reason, "Snapshot is stale");
                Transition(State::stale())
            }
            _ => Handled,
        }
    }

    #[state]
    fn stale(&mut self, event: &RequestEvent) -> Outcome<State> {
        match event {
            RequestEvent::Refreshed { state } => {
                self.observed_state = Some(state.clone());
                self.last_error = None;
                tracing::info!(labware = %self.labware, state = %state, "Stale snapshot recovered");
                Transition(State::refreshed())
            }
            RequestEvent::RefetchFailed { reason } => {
                self.last_error = Some(reason.clone());
                Handled
            }
            _ => Handled,
        }
    }

    #[state]
    fn refreshed(&mut self, event: &RequestEvent) -> Outcome<State> {
        match event {
            RequestEvent::Refreshed { state } => {
                self.observed_state = Some(state.clone());
                Handled
            }
            _ => Handled,
        }
    }

    #[state]
    fn rejected(&mut self, event: &RequestEvent) -> Outcome<State> {
        tracing::debug!(labware = %self.labware, event = ?event, "Ignoring event after the request ended");
        Handled
    }

    #[state]
    fn failed(&mut self, event: &RequestEvent) -> Outcome<State> {
        tracing::debug!(labware = %self.labware, event = ?event, "Ignoring event after the request ended");
        Handled
    }
}

impl State {
    pub fn phase(&self) -> RequestPhase {
        match self {
            State::Idle { .. } => RequestPhase::Idle,
            State::Proposed { .. } => RequestPhase::Proposed,
            State::Submitted { .. } => RequestPhase::Submitted,
            State::Refreshed { .. } => RequestPhase::Refreshed,
            State::Stale { .. } => RequestPhase::Stale,
            State::Rejected { .. } => RequestPhase::Rejected,
            State::Failed { .. } => RequestPhase::Failed,
        }
    }
}
