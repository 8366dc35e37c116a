use indexmap::IndexSet;
use tracing::debug;

use super::capabilities::StateCapabilities;
use super::variants::StateMachineVariant;
use crate::errors::InvalidTransition;
use crate::ids::{EventName, StateName, VariantId, TAKE_DEFAULT_PATH};

/// Read-only view over one variant's definition and capability table.
///
/// Every answer is advisory: the tracking backend performs the actual state
/// change and the caller re-fetches the labware afterwards.
#[derive(Debug, Clone, Copy)]
pub struct StateMachineEngine<'a> {
    variant: &'a StateMachineVariant,
}

impl<'a> StateMachineEngine<'a> {
    pub fn new(variant: &'a StateMachineVariant) -> Self {
        Self { variant }
    }

    pub fn variant_id(&self) -> &'a VariantId {
        &self.variant.id
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.variant.definition.contains_state(state)
    }

    /// Events that have an edge leaving `state`, in declaration order
    pub fn legal_events(&self, state: &str) -> IndexSet<EventName> {
        self.variant
            .definition
            .edges_from(state)
            .map(|(event, _)| event.clone())
            .collect()
    }

    /// `(event, target)` pairs leaving `state`
    pub fn transitions_from(&self, state: &str) -> Vec<(EventName, StateName)> {
        self.variant
            .definition
            .edges_from(state)
            .map(|(event, target)| (event.clone(), target.clone()))
            .collect()
    }

    /// State the labware would reach if `event` were applied to `state`
    pub fn apply(&self, state: &str, event: &str) -> Result<StateName, InvalidTransition> {
        match self.variant.definition.target(state, event) {
            Some(target) => {
                debug!(
                    variant = %self.variant.id,
                    from = state,
                    event = event,
                    to = %target,
                    "Computed advisory transition"
                );
                Ok(target.clone())
            }
            None => Err(InvalidTransition {
                event: EventName::from(event),
                current_state: StateName::from(state),
                legal_events: self.legal_events(state).into_iter().collect(),
            }),
        }
    }

    /// Target of the canonical forward step from `state`, if it has one
    pub fn default_target(&self, state: &str) -> Option<&'a StateName> {
        self.variant.definition.target(state, TAKE_DEFAULT_PATH)
    }

    pub fn capabilities(&self, state: &str) -> &'a StateCapabilities {
        self.variant.capabilities.get(state)
    }
}
