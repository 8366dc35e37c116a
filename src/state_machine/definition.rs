use indexmap::{Equivalent, IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::errors::DefinitionError;
use crate::ids::{EventName, StateName, VariantId};

/// One group of edges sharing an event name and a target state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub name: EventName,
    pub from: IndexSet<StateName>,
    pub to: StateName,
}

impl TransitionEvent {
    pub fn new<I, S>(name: &str, from: I, to: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StateName>,
    {
        Self {
            name: EventName::from(name),
            from: from.into_iter().map(Into::into).collect(),
            to: StateName::from(to),
        }
    }

    pub fn leaves(&self, state: &str) -> bool {
        self.from.contains(state)
    }
}

/// Borrowed form of an `(event, from)` edge key; hashes like the owned tuple
struct EdgeKey<'a>(&'a str, &'a str);

impl Hash for EdgeKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
        self.1.hash(state);
    }
}

impl Equivalent<(EventName, StateName)> for EdgeKey<'_> {
    fn equivalent(&self, key: &(EventName, StateName)) -> bool {
        key.0 == self.0 && key.1 == self.1
    }
}

/// States, initial state and events of one purpose variant.
///
/// Construct with [`StateMachineDefinition::new`], which rejects definitions
/// where an event could leave one state along two different edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateMachineDefinition {
    states: IndexSet<StateName>,
    initial: Option<StateName>,
    events: Vec<TransitionEvent>,
    /// (event, from) -> to, built once during validation
    #[serde(skip)]
    edges: IndexMap<(EventName, StateName), StateName>,
}

impl StateMachineDefinition {
    pub fn new(
        variant: &VariantId,
        states: IndexSet<StateName>,
        initial: StateName,
        events: Vec<TransitionEvent>,
    ) -> Result<Self, DefinitionError> {
        if states.is_empty() {
            return Err(DefinitionError::NoStates {
                variant: variant.clone(),
            });
        }
        if !states.contains(&initial) {
            return Err(DefinitionError::UndeclaredInitial {
                variant: variant.clone(),
                state: initial,
            });
        }

        let mut edges = IndexMap::new();
        for event in &events {
            let endpoints = event.from.iter().chain(std::iter::once(&event.to));
            for state in endpoints {
                if !states.contains(state) {
                    return Err(DefinitionError::UndeclaredState {
                        variant: variant.clone(),
                        event: event.name.clone(),
                        state: state.clone(),
                    });
                }
            }
            for from in &event.from {
                let key = (event.name.clone(), from.clone());
                if edges.insert(key, event.to.clone()).is_some() {
                    return Err(DefinitionError::AmbiguousEvent {
                        variant: variant.clone(),
                        event: event.name.clone(),
                        state: from.clone(),
                    });
                }
            }
        }

        Ok(Self {
            states,
            initial: Some(initial),
            events,
            edges,
        })
    }

    /// The definition of the inert variant: no states, no events.
    pub fn inert() -> Self {
        Self {
            states: IndexSet::new(),
            initial: None,
            events: Vec::new(),
            edges: IndexMap::new(),
        }
    }

    pub fn states(&self) -> &IndexSet<StateName> {
        &self.states
    }

    pub fn initial(&self) -> Option<&StateName> {
        self.initial.as_ref()
    }

    pub fn events(&self) -> &[TransitionEvent] {
        &self.events
    }

    pub fn contains_state(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    /// Target of `event` from `state`, if that edge exists
    pub fn target(&self, state: &str, event: &str) -> Option<&StateName> {
        self.edges.get(&EdgeKey(event, state))
    }

    /// Edges leaving `state`, in declaration order
    pub fn edges_from<'a>(
        &'a self,
        state: &'a str,
    ) -> impl Iterator<Item = (&'a EventName, &'a StateName)> + 'a {
        self.edges
            .iter()
            .filter(move |((_, from), _)| from == state)
            .map(|((name, _), to)| (name, to))
    }

    pub fn all_edges(&self) -> impl Iterator<Item = (&StateName, &EventName, &StateName)> {
        self.edges
            .iter()
            .map(|((name, from), to)| (from, name, to))
    }
}
