// Built-in purpose variants and the catalogue that holds them.
//
// A variant bundles a state machine definition, its capability table and a
// default tab table. Purposes pick one by id; registries may add their own
// through `VariantDocument`.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::capabilities::{CapabilityTable, ChildSelector, LabwarePredicate, StateCapabilities};
use super::definition::{StateMachineDefinition, TransitionEvent};
use crate::errors::{ConfigError, DefinitionError};
use crate::ids::{ActionId, StateName, VariantId, TAKE_DEFAULT_PATH};

pub type TabTable = IndexMap<StateName, IndexSet<ActionId>>;

/// Id of the inert variant used for unknown purposes
pub const UNKNOWN_VARIANT: &str = "unknown";

/// Everything the engine needs to know about one purpose variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateMachineVariant {
    pub id: VariantId,
    pub definition: StateMachineDefinition,
    pub capabilities: CapabilityTable,
    pub default_tabs: TabTable,
}

impl StateMachineVariant {
    pub fn inert() -> Self {
        Self {
            id: VariantId::from(UNKNOWN_VARIANT),
            definition: StateMachineDefinition::inert(),
            capabilities: CapabilityTable::default(),
            default_tabs: TabTable::new(),
        }
    }

    pub fn is_inert(&self) -> bool {
        self.definition.states().is_empty()
    }
}

/// Declarative form of a variant, as written in a registry document
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VariantDocument {
    pub states: Vec<StateName>,
    pub initial: StateName,
    #[serde(default)]
    pub events: Vec<TransitionEvent>,
    #[serde(default)]
    pub capabilities: IndexMap<StateName, StateCapabilities>,
    #[serde(default)]
    pub tabs: TabTable,
}

impl VariantDocument {
    pub fn into_variant(self, id: VariantId) -> Result<StateMachineVariant, DefinitionError> {
        let mut builder = VariantBuilder::new(id.as_str())
            .states(self.states.iter().map(StateName::as_str))
            .initial(self.initial.as_str());
        builder.events = self.events;
        for (state, capabilities) in self.capabilities {
            builder = builder.capabilities(state.as_str(), capabilities);
        }
        builder.tabs = self.tabs;
        builder.build()
    }
}

/// Incremental construction of a variant, validated in [`VariantBuilder::build`]
#[derive(Debug, Clone)]
pub struct VariantBuilder {
    id: VariantId,
    states: IndexSet<StateName>,
    initial: Option<StateName>,
    events: Vec<TransitionEvent>,
    capabilities: IndexMap<StateName, StateCapabilities>,
    tabs: TabTable,
}

impl VariantBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: VariantId::from(id),
            states: IndexSet::new(),
            initial: None,
            events: Vec::new(),
            capabilities: IndexMap::new(),
            tabs: TabTable::new(),
        }
    }

    pub fn states<'s>(mut self, states: impl IntoIterator<Item = &'s str>) -> Self {
        self.states.extend(states.into_iter().map(StateName::from));
        self
    }

    pub fn initial(mut self, state: &str) -> Self {
        self.initial = Some(StateName::from(state));
        self
    }

    pub fn event<const N: usize>(mut self, name: &str, from: [&str; N], to: &str) -> Self {
        self.events.push(TransitionEvent::new(name, from, to));
        self
    }

    pub fn default_path(self, from: &str, to: &str) -> Self {
        self.event(TAKE_DEFAULT_PATH, [from], to)
    }

    pub fn capabilities(mut self, state: &str, capabilities: StateCapabilities) -> Self {
        self.capabilities.insert(StateName::from(state), capabilities);
        self
    }

    pub fn tabs<const N: usize>(mut self, state: &str, tabs: [&str; N]) -> Self {
        self.tabs.insert(
            StateName::from(state),
            tabs.into_iter().map(ActionId::from).collect(),
        );
        self
    }

    pub fn build(self) -> Result<StateMachineVariant, DefinitionError> {
        let initial = match self.initial {
            Some(initial) => initial,
            None => self.states.first().cloned().ok_or_else(|| DefinitionError::NoStates {
                variant: self.id.clone(),
            })?,
        };
        let definition = StateMachineDefinition::new(&self.id, self.states, initial, self.events)?;

        let undeclared = self
            .capabilities
            .keys()
            .chain(self.tabs.keys())
            .find(|state| !definition.contains_state(state.as_str()));
        if let Some(state) = undeclared {
            return Err(DefinitionError::UndeclaredCapabilityState {
                variant: self.id.clone(),
                state: state.clone(),
            });
        }

        let mut capabilities = CapabilityTable::new(self.capabilities);
        for state in definition.states() {
            capabilities.ensure(state);
        }

        Ok(StateMachineVariant {
            id: self.id,
            definition,
            capabilities,
            default_tabs: self.tabs,
        })
    }
}

/// All variants known to a registry, built-ins first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantCatalogue {
    variants: IndexMap<VariantId, StateMachineVariant>,
    inert: StateMachineVariant,
}

impl VariantCatalogue {
    pub fn builtin() -> Result<Self, DefinitionError> {
        let mut variants = IndexMap::new();
        for variant in [
            standard()?,
            automated()?,
            stock()?,
            permissive()?,
            tube()?,
            final_tube()?,
            tube_rack()?,
            pooled()?,
            submission()?,
        ] {
            variants.insert(variant.id.clone(), variant);
        }
        Ok(Self {
            variants,
            inert: StateMachineVariant::inert(),
        })
    }

    /// Add a registry-defined variant; built-in ids cannot be redefined
    pub fn insert(&mut self, variant: StateMachineVariant) -> Result<(), ConfigError> {
        if variant.id == UNKNOWN_VARIANT || self.variants.contains_key(&variant.id) {
            return Err(ConfigError::DuplicateVariant(variant.id));
        }
        self.variants.insert(variant.id.clone(), variant);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&StateMachineVariant> {
        self.variants.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.variants.contains_key(id)
    }

    /// Variant `id`, or the inert variant when it is not known
    pub fn get_or_inert(&self, id: &str) -> &StateMachineVariant {
        self.variants.get(id).unwrap_or(&self.inert)
    }

    pub fn inert(&self) -> &StateMachineVariant {
        &self.inert
    }

    pub fn ids(&self) -> impl Iterator<Item = &VariantId> {
        self.variants.keys()
    }
}

// Tab ids shared by the built-in tables
mod tab {
    pub const SUMMARY: &str = "summary";
    pub const PRINTING: &str = "printing";
    pub const STATE: &str = "state";
    pub const CREATION: &str = "creation";
    pub const WELL_FAILING: &str = "well_failing";
    pub const QC_DATA: &str = "qc_data";
    pub const ROBOTS: &str = "robots";
    pub const LIBRARY_PASSING: &str = "library_passing";
    pub const SUBMISSION: &str = "submission";
    pub const TUBES: &str = "tubes";
}

fn in_progress() -> StateCapabilities {
    StateCapabilities::default()
        .with("state_change", LabwarePredicate::Always)
        .with("source_view", LabwarePredicate::HasParents)
        .with("qc_data", LabwarePredicate::HasQcData)
}

fn closed() -> StateCapabilities {
    StateCapabilities::default()
        .with("source_view", LabwarePredicate::HasParents)
        .with("qc_data", LabwarePredicate::HasQcData)
}

fn creating(selector: ChildSelector) -> StateCapabilities {
    in_progress()
        .with_child_creation(selector)
        .with("additional_creation", LabwarePredicate::HasFilledReceptacles)
        .with("tube_display", LabwarePredicate::HasDescendantTubes)
}

fn standard() -> Result<StateMachineVariant, DefinitionError> {
    VariantBuilder::new("standard")
        .states(["pending", "started", "passed", "qc_complete", "failed", "cancelled"])
        .initial("pending")
        .default_path("pending", "started")
        .default_path("started", "passed")
        .default_path("passed", "qc_complete")
        .event("start", ["pending"], "started")
        .event("pass", ["pending", "started"], "passed")
        .event("mark_qc_complete", ["passed"], "qc_complete")
        .event("fail", ["pending", "started", "passed"], "failed")
        .event("cancel", ["pending", "started"], "cancelled")
        .capabilities("pending", in_progress())
        .capabilities("started", in_progress())
        .capabilities(
            "passed",
            creating(ChildSelector::FirstSuggested)
                .with("well_failure", LabwarePredicate::HasFailableReceptacles)
                .with("robot_verification", LabwarePredicate::Always),
        )
        .capabilities(
            "qc_complete",
            creating(ChildSelector::FirstSuggested).with("library_passing", LabwarePredicate::HasQcData),
        )
        .capabilities("failed", closed())
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::STATE])
        .tabs("started", [tab::SUMMARY, tab::PRINTING, tab::STATE])
        .tabs(
            "passed",
            [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION, tab::WELL_FAILING, tab::QC_DATA],
        )
        .tabs(
            "qc_complete",
            [tab::SUMMARY, tab::PRINTING, tab::CREATION, tab::QC_DATA, tab::LIBRARY_PASSING],
        )
        .tabs("failed", [tab::SUMMARY, tab::PRINTING])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}

/// Robot hand-offs: each default step is one bed verification
fn automated() -> Result<StateMachineVariant, DefinitionError> {
    let robot_step = || in_progress().with("robot_verification", LabwarePredicate::HasFilledReceptacles);

    VariantBuilder::new("automated")
        .states(["pending", "started_fx", "started_mj", "passed", "failed", "cancelled"])
        .initial("pending")
        .default_path("pending", "started_fx")
        .default_path("started_fx", "started_mj")
        .default_path("started_mj", "passed")
        .event("fail", ["pending", "started_fx", "started_mj", "passed"], "failed")
        .event("cancel", ["pending"], "cancelled")
        .capabilities("pending", robot_step())
        .capabilities("started_fx", robot_step())
        .capabilities("started_mj", robot_step())
        .capabilities(
            "passed",
            creating(ChildSelector::FirstSuggested)
                .with("well_failure", LabwarePredicate::HasFailableReceptacles),
        )
        .capabilities("failed", closed())
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::ROBOTS, tab::STATE])
        .tabs("started_fx", [tab::SUMMARY, tab::PRINTING, tab::ROBOTS, tab::STATE])
        .tabs("started_mj", [tab::SUMMARY, tab::PRINTING, tab::ROBOTS, tab::STATE])
        .tabs(
            "passed",
            [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION, tab::WELL_FAILING],
        )
        .tabs("failed", [tab::SUMMARY, tab::PRINTING])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}

/// Stock plates are usable as soon as they arrive
fn stock() -> Result<StateMachineVariant, DefinitionError> {
    VariantBuilder::new("stock")
        .states(["pending", "passed", "failed", "cancelled"])
        .initial("pending")
        .default_path("pending", "passed")
        .event("fail", ["pending", "passed"], "failed")
        .event("cancel", ["pending"], "cancelled")
        .capabilities("pending", creating(ChildSelector::FirstSuggested))
        .capabilities("passed", creating(ChildSelector::FirstSuggested))
        .capabilities("failed", closed())
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION])
        .tabs("passed", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION])
        .tabs("failed", [tab::SUMMARY])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}

/// Standard graph, but children may be made before the plate is passed
fn permissive() -> Result<StateMachineVariant, DefinitionError> {
    VariantBuilder::new("permissive")
        .states(["pending", "started", "passed", "failed", "cancelled"])
        .initial("pending")
        .default_path("pending", "started")
        .default_path("started", "passed")
        .event("pass", ["pending", "started"], "passed")
        .event("fail", ["pending", "started", "passed"], "failed")
        .event("cancel", ["pending", "started"], "cancelled")
        .capabilities("pending", creating(ChildSelector::None))
        .capabilities("started", creating(ChildSelector::None))
        .capabilities(
            "passed",
            creating(ChildSelector::FirstSuggested)
                .with("well_failure", LabwarePredicate::HasFailableReceptacles),
        )
        .capabilities("failed", closed())
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION])
        .tabs("started", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION])
        .tabs(
            "passed",
            [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION, tab::WELL_FAILING],
        )
        .tabs("failed", [tab::SUMMARY])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}

fn tube() -> Result<StateMachineVariant, DefinitionError> {
    VariantBuilder::new("tube")
        .states(["pending", "started", "passed", "qc_complete", "failed", "cancelled"])
        .initial("pending")
        .default_path("pending", "started")
        .default_path("started", "passed")
        .default_path("passed", "qc_complete")
        .event("fail", ["pending", "started", "passed"], "failed")
        .event("cancel", ["pending", "started"], "cancelled")
        .capabilities("pending", in_progress())
        .capabilities("started", in_progress())
        .capabilities("passed", creating(ChildSelector::FirstSuggested))
        .capabilities("qc_complete", creating(ChildSelector::FirstSuggested))
        .capabilities("failed", closed())
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::STATE])
        .tabs("started", [tab::SUMMARY, tab::PRINTING, tab::STATE])
        .tabs("passed", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION])
        .tabs("qc_complete", [tab::SUMMARY, tab::PRINTING, tab::CREATION])
        .tabs("failed", [tab::SUMMARY])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}

/// End of the line: nothing is made from these tubes
fn final_tube() -> Result<StateMachineVariant, DefinitionError> {
    VariantBuilder::new("final_tube")
        .states(["pending", "passed", "qc_complete", "failed", "cancelled"])
        .initial("pending")
        .default_path("pending", "passed")
        .default_path("passed", "qc_complete")
        .event("fail", ["pending", "passed"], "failed")
        .event("cancel", ["pending"], "cancelled")
        .capabilities("pending", in_progress())
        .capabilities(
            "passed",
            in_progress().with("library_passing", LabwarePredicate::HasFilledReceptacles),
        )
        .capabilities("qc_complete", closed())
        .capabilities("failed", closed())
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::STATE])
        .tabs("passed", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::LIBRARY_PASSING])
        .tabs("qc_complete", [tab::SUMMARY, tab::QC_DATA])
        .tabs("failed", [tab::SUMMARY])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}

fn tube_rack() -> Result<StateMachineVariant, DefinitionError> {
    VariantBuilder::new("tube_rack")
        .states(["pending", "started", "passed", "failed", "cancelled"])
        .initial("pending")
        .default_path("pending", "started")
        .default_path("started", "passed")
        .event("fail", ["pending", "started", "passed"], "failed")
        .event("cancel", ["pending", "started"], "cancelled")
        .capabilities("pending", in_progress())
        .capabilities("started", in_progress())
        .capabilities(
            "passed",
            creating(ChildSelector::FirstSuggested).with("tube_display", LabwarePredicate::Always),
        )
        .capabilities("failed", closed())
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::TUBES])
        .tabs("started", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::TUBES])
        .tabs("passed", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION, tab::TUBES])
        .tabs("failed", [tab::SUMMARY, tab::TUBES])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}

/// Plates whose pooled tubes follow the plate's own state
fn pooled() -> Result<StateMachineVariant, DefinitionError> {
    VariantBuilder::new("pooled")
        .states(["pending", "started", "passed", "failed", "cancelled"])
        .initial("pending")
        .default_path("pending", "started")
        .default_path("started", "passed")
        .event("fail", ["pending", "started", "passed"], "failed")
        .event("cancel", ["pending", "started"], "cancelled")
        .capabilities("pending", in_progress())
        .capabilities("started", in_progress())
        .capabilities(
            "passed",
            creating(ChildSelector::FirstSuggested)
                .with("tube_display", LabwarePredicate::HasDescendants),
        )
        .capabilities("failed", closed())
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::STATE])
        .tabs("started", [tab::SUMMARY, tab::PRINTING, tab::STATE])
        .tabs("passed", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION, tab::TUBES])
        .tabs("failed", [tab::SUMMARY])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}

/// Waits for work to be ordered before anything happens
fn submission() -> Result<StateMachineVariant, DefinitionError> {
    VariantBuilder::new("submission")
        .states(["pending", "passed", "cancelled"])
        .initial("pending")
        .default_path("pending", "passed")
        .event("cancel", ["pending"], "cancelled")
        .capabilities(
            "pending",
            closed()
                .with("submission", LabwarePredicate::HasFilledReceptacles)
                .with("state_change", LabwarePredicate::Always),
        )
        .capabilities("passed", creating(ChildSelector::FirstSuggested))
        .capabilities("cancelled", closed())
        .tabs("pending", [tab::SUMMARY, tab::PRINTING, tab::SUBMISSION])
        .tabs("passed", [tab::SUMMARY, tab::PRINTING, tab::STATE, tab::CREATION])
        .tabs("cancelled", [tab::SUMMARY])
        .build()
}
