// Per-state capability records.
//
// Each state of a variant carries one record saying whether children may be
// created, how the default child is picked, and which gated capabilities are
// switched on (each behind a predicate over the snapshot).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::ids::{PurposeId, StateName};
use crate::labware::LabwareSnapshot;

/// Business predicate evaluated against a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabwarePredicate {
    Always,
    Never,
    HasFilledReceptacles,
    HasFailableReceptacles,
    HasQcData,
    HasParents,
    HasDescendants,
    HasDescendantTubes,
    AllOf(Vec<LabwarePredicate>),
    AnyOf(Vec<LabwarePredicate>),
    Not(Box<LabwarePredicate>),
}

impl LabwarePredicate {
    pub fn evaluate(&self, labware: &LabwareSnapshot) -> bool {
        match self {
            LabwarePredicate::Always => true,
            LabwarePredicate::Never => false,
            LabwarePredicate::HasFilledReceptacles => labware.has_filled_receptacles(),
            LabwarePredicate::HasFailableReceptacles => {
                labware.failable_receptacles().next().is_some()
            }
            LabwarePredicate::HasQcData => labware.has_qc_data(),
            LabwarePredicate::HasParents => !labware.parents.is_empty(),
            LabwarePredicate::HasDescendants => !labware.descendants.is_empty(),
            LabwarePredicate::HasDescendantTubes => labware.descendant_tubes().next().is_some(),
            LabwarePredicate::AllOf(inner) => inner.iter().all(|p| p.evaluate(labware)),
            LabwarePredicate::AnyOf(inner) => inner.iter().any(|p| p.evaluate(labware)),
            LabwarePredicate::Not(inner) => !inner.evaluate(labware),
        }
    }
}

/// How the preselected child purpose is chosen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildSelector {
    #[default]
    None,
    FirstSuggested,
    Purpose(PurposeId),
}

impl ChildSelector {
    /// Pick from the purposes already suggested for the labware
    pub fn select<'a>(&self, suggested: &'a [PurposeId]) -> Option<&'a PurposeId> {
        match self {
            ChildSelector::None => None,
            ChildSelector::FirstSuggested => suggested.first(),
            ChildSelector::Purpose(purpose) => suggested.iter().find(|id| *id == purpose),
        }
    }
}

/// Capability record of one (variant, state) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCapabilities {
    #[serde(default)]
    pub allow_child_creation: bool,
    #[serde(default)]
    pub default_child: ChildSelector,
    /// Capability name -> predicate that must hold for it to be offered
    #[serde(default)]
    pub predicates: BTreeMap<String, LabwarePredicate>,
}

impl StateCapabilities {
    pub fn with_child_creation(mut self, selector: ChildSelector) -> Self {
        self.allow_child_creation = true;
        self.default_child = selector;
        self
    }

    pub fn with(mut self, capability: &str, predicate: LabwarePredicate) -> Self {
        self.predicates.insert(capability.to_string(), predicate);
        self
    }

    /// Whether `capability` is switched on here and its predicate holds
    pub fn permits(&self, capability: &str, labware: &LabwareSnapshot) -> bool {
        self.predicates
            .get(capability)
            .is_some_and(|predicate| predicate.evaluate(labware))
    }
}

static EMPTY_CAPABILITIES: LazyLock<StateCapabilities> = LazyLock::new(StateCapabilities::default);

/// Capability records of every declared state of a variant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityTable {
    entries: IndexMap<StateName, StateCapabilities>,
}

impl CapabilityTable {
    pub fn new(entries: IndexMap<StateName, StateCapabilities>) -> Self {
        Self { entries }
    }

    /// Record for `state`; states without a record get the empty default.
    pub fn get(&self, state: &str) -> &StateCapabilities {
        self.entries.get(state).unwrap_or(&EMPTY_CAPABILITIES)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&StateName, &StateCapabilities)> {
        self.entries.iter()
    }

    pub(crate) fn ensure(&mut self, state: &StateName) {
        self.entries.entry(state.clone()).or_default();
    }
}
