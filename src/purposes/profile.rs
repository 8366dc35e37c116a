// Behaviour profile of a purpose.
//
// A presenter is parameterised by one of these instead of being specialised
// per purpose. Each part is a small record borrowed from the registry
// snapshot; presets only choose defaults, the purpose's own configuration
// always wins.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use super::registry::RegistryDefaults;
use super::types::{ChildRestriction, FileLink, PresenterKind, PurposeConfig, SummaryField};
use crate::authorization;
use crate::ids::{ActionId, PurposeId, RobotId, StateName};
use crate::state_machine::{StateMachineVariant, TabTable};

/// Which tab table applies and what anonymous visitors keep
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TabVisibilityProfile<'a> {
    pub table: &'a TabTable,
    pub anonymous_tabs: &'a [ActionId],
}

impl TabVisibilityProfile<'_> {
    pub fn permitted(&self, state: &str, authenticated: bool) -> IndexSet<ActionId> {
        authorization::tabs_from_table(self.table, state, authenticated, self.anonymous_tabs)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChildCreationProfile<'a> {
    /// Statically configured children; empty means "whatever the pipelines say"
    pub configured: &'a [PurposeId],
    pub restrictions: &'a [ChildRestriction],
}

impl<'a> From<&'a PurposeConfig> for ChildCreationProfile<'a> {
    fn from(purpose: &'a PurposeConfig) -> Self {
        Self {
            configured: &purpose.children,
            restrictions: &purpose.child_restrictions,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RobotBehaviour<'a> {
    pub controlled_states: Option<&'a IndexMap<StateName, RobotId>>,
}

impl<'a> RobotBehaviour<'a> {
    /// Robot that owns the transition out of `state`, if any
    pub fn controlling_robot(&self, state: &str) -> Option<&'a RobotId> {
        self.controlled_states.and_then(|states| states.get(state))
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SummaryProfile<'a> {
    pub fields: &'a [SummaryField],
    pub file_links: &'a [FileLink],
}

const UNKNOWN_SUMMARY: &[SummaryField] = &[SummaryField::Barcode, SummaryField::Purpose, SummaryField::State];

impl PresenterKind {
    pub fn default_summary(self) -> &'static [SummaryField] {
        use SummaryField::*;
        match self {
            PresenterKind::Standard => &[Barcode, Purpose, State, InputBarcode, FilledReceptacles, CreatedAt],
            PresenterKind::Stock => &[Barcode, Purpose, State, FilledReceptacles, CreatedAt],
            PresenterKind::Pooled => &[Barcode, Purpose, State, TubeState, Descendants, CreatedAt],
            PresenterKind::FinalTube => &[Barcode, Purpose, State, InputBarcode, CreatedAt],
            PresenterKind::TubeRack => &[Barcode, Purpose, State, Descendants, Location, CreatedAt],
            PresenterKind::Submission => &[Barcode, Purpose, State, CreatedAt],
        }
    }

    /// Presets whose `tube_state` is read through from the plate
    pub fn mirrors_tube_state(self) -> bool {
        matches!(self, PresenterKind::Pooled)
    }
}

/// Everything about a purpose that shapes its presenter
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PurposeBehaviorProfile<'a> {
    pub kind: PresenterKind,
    pub tabs: TabVisibilityProfile<'a>,
    pub children: ChildCreationProfile<'a>,
    pub robots: RobotBehaviour<'a>,
    pub summary: SummaryProfile<'a>,
    pub mirror_tube_state: bool,
}

impl<'a> PurposeBehaviorProfile<'a> {
    pub fn assemble(
        purpose: &'a PurposeConfig,
        variant: &'a StateMachineVariant,
        defaults: &'a RegistryDefaults,
    ) -> Self {
        let kind = purpose.presenter;
        let table = if purpose.authenticated_tab_states.is_empty() {
            &variant.default_tabs
        } else {
            &purpose.authenticated_tab_states
        };
        let fields = if purpose.summary_items.is_empty() {
            kind.default_summary()
        } else {
            purpose.summary_items.as_slice()
        };

        Self {
            kind,
            tabs: TabVisibilityProfile {
                table,
                anonymous_tabs: &defaults.anonymous_tabs,
            },
            children: ChildCreationProfile::from(purpose),
            robots: RobotBehaviour {
                controlled_states: Some(&purpose.robot_controlled_states),
            },
            summary: SummaryProfile {
                fields,
                file_links: &purpose.file_links,
            },
            mirror_tube_state: kind.mirrors_tube_state(),
        }
    }

    /// Profile of a purpose the registry does not know: read-only everywhere
    pub fn inert(variant: &'a StateMachineVariant, defaults: &'a RegistryDefaults) -> Self {
        Self {
            kind: PresenterKind::Standard,
            tabs: TabVisibilityProfile {
                table: &variant.default_tabs,
                anonymous_tabs: &defaults.anonymous_tabs,
            },
            children: ChildCreationProfile {
                configured: &[],
                restrictions: &[],
            },
            robots: RobotBehaviour {
                controlled_states: None,
            },
            summary: SummaryProfile {
                fields: UNKNOWN_SUMMARY,
                file_links: &[],
            },
            mirror_tube_state: false,
        }
    }
}
