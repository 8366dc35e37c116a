use serde::Serialize;

use super::variants::StateMachineVariant;
use crate::ids::{EventName, StateName, VariantId};

/// Transition graph of one variant, for display and inspection.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct TransitionGraph {
    pub variant: VariantId,
    pub initial: Option<StateName>,
    pub states: Vec<StateName>,
    pub transitions: Vec<TransitionEdge>,
}

/// Directed edge `start --event--> goal`
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct TransitionEdge {
    pub start: StateName,
    pub event: EventName,
    pub goal: StateName,
}

/// Build the transition graph of `variant`.
pub fn transition_graph(variant: &StateMachineVariant) -> TransitionGraph {
    let definition = &variant.definition;
    let mut transitions: Vec<TransitionEdge> = definition
        .all_edges()
        .map(|(start, event, goal)| TransitionEdge {
            start: start.clone(),
            event: event.clone(),
            goal: goal.clone(),
        })
        .collect();

    // group by start state, keeping declaration order within a state
    let position = |state: &StateName| definition.states().get_index_of(state).unwrap_or(usize::MAX);
    transitions.sort_by_key(|edge| position(&edge.start));

    TransitionGraph {
        variant: variant.id.clone(),
        initial: definition.initial().cloned(),
        states: definition.states().iter().cloned().collect(),
        transitions,
    }
}

impl TransitionGraph {
    /// States with no outgoing edge
    pub fn terminal_states(&self) -> Vec<&StateName> {
        self.states
            .iter()
            .filter(|state| !self.transitions.iter().any(|edge| &edge.start == *state))
            .collect()
    }

    /// States not reachable from the initial state
    pub fn unreachable_states(&self) -> Vec<&StateName> {
        let Some(initial) = &self.initial else {
            return Vec::new();
        };
        let mut reached = vec![initial];
        let mut cursor = 0;
        while cursor < reached.len() {
            let current = reached[cursor];
            for edge in self.transitions.iter().filter(|edge| &edge.start == current) {
                if !reached.contains(&&edge.goal) {
                    reached.push(&edge.goal);
                }
            }
            cursor += 1;
        }
        self.states
            .iter()
            .filter(|state| !reached.contains(state))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::variants::VariantCatalogue;

    #[test]
    fn test_graph_contains_expected_default_edges() {
        let catalogue = VariantCatalogue::builtin().unwrap();
        let graph = transition_graph(catalogue.get_or_inert("automated"));

        let expected = [
            ("pending", "take_default_path", "started_fx"),
            ("started_fx", "take_default_path", "started_mj"),
            ("started_mj", "take_default_path", "passed"),
            ("pending", "cancel", "cancelled"),
        ];
        for (start, event, goal) in expected {
            assert!(
                graph
                    .transitions
                    .iter()
                    .any(|edge| edge.start == start && edge.event == event && edge.goal == goal),
                "missing edge {start} -> {event} -> {goal}"
            );
        }
        assert_eq!(graph.transitions[0].start, "pending");
    }

    #[test]
    fn test_builtin_variants_have_no_unreachable_states() {
        let catalogue = VariantCatalogue::builtin().unwrap();
        for id in catalogue.ids() {
            let graph = transition_graph(catalogue.get_or_inert(id.as_str()));
            assert!(
                graph.unreachable_states().is_empty(),
                "{} has unreachable states {:?}",
                id,
                graph.unreachable_states()
            );
        }
    }

    #[test]
    fn test_terminal_states() {
        let catalogue = VariantCatalogue::builtin().unwrap();
        let graph = transition_graph(catalogue.get_or_inert("stock"));
        let terminal: Vec<_> = graph.terminal_states().iter().map(|s| s.as_str()).collect();
        assert_eq!(terminal, vec!["failed", "cancelled"]);
    }

    #[test]
    fn test_inert_graph_is_empty() {
        let catalogue = VariantCatalogue::builtin().unwrap();
        let graph = transition_graph(catalogue.inert());
        assert!(graph.states.is_empty());
        assert!(graph.transitions.is_empty());
        assert!(graph.unreachable_states().is_empty());
    }
}
