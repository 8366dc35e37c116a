// Purpose-variant state machines
//
// Each variant is data: a definition (states + events), a capability record
// per state, and a default tab table. The engine answers questions about it
// without ever changing labware state.

pub mod capabilities;
pub mod definition;
pub mod engine;
pub mod graph;
pub mod variants;

pub use capabilities::{CapabilityTable, ChildSelector, LabwarePredicate, StateCapabilities};
pub use definition::{StateMachineDefinition, TransitionEvent};
pub use engine::StateMachineEngine;
pub use graph::{transition_graph, TransitionEdge, TransitionGraph};
pub use variants::{
    StateMachineVariant, TabTable, VariantBuilder, VariantCatalogue, VariantDocument,
    UNKNOWN_VARIANT,
};
