use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::links::{csv_export_links, ExportLink};
use super::mirror::{MirrorWrite, TubeStateMirror};
use super::summary::summary_rows;
use crate::authorization::{controlled_action, ActionArgs, ActionContext, ActionScope, Capability};
use crate::children::{self, ChildSuggestions};
use crate::errors::InvalidTransition;
use crate::ids::{ActionId, EventName, PurposeId, StateName, VariantId};
use crate::labware::{AuthContext, LabwareSnapshot};
use crate::purposes::{PurposeRegistry, Resolution};
use crate::robots::{robot_summary, suitable_robots, RobotChoice, RobotSummary};
use crate::telemetry::create_presenter_span;
use crate::transitions::TransitionIntent;

/// Decision surface for one labware, one registry snapshot and one caller.
///
/// Built per request and dropped afterwards. Every query is recomputed from
/// the snapshot, so a presenter built from a re-fetched snapshot reflects the
/// new state completely.
#[derive(Debug, Clone)]
pub struct Presenter {
    labware: LabwareSnapshot,
    registry: Arc<PurposeRegistry>,
    auth: AuthContext,
}

/// Everything a rendering layer needs, in one serializable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionSurface {
    pub labware: Uuid,
    pub barcode: String,
    pub purpose: PurposeId,
    pub purpose_name: String,
    pub variant: VariantId,
    pub state: StateName,
    pub tube_state: Option<StateName>,
    pub legal_events: Vec<EventName>,
    pub permitted_tabs: Vec<ActionId>,
    pub suggested_children: ChildSuggestions,
    pub default_child: Option<PurposeId>,
    pub robots: RobotChoice,
    pub controlled_actions: IndexMap<String, ActionContext>,
    pub summary: Vec<(String, String)>,
    pub export_links: Vec<ExportLink>,
    pub validation_messages: Vec<String>,
}

impl Presenter {
    pub fn new(labware: LabwareSnapshot, registry: Arc<PurposeRegistry>, auth: AuthContext) -> Self {
        Self {
            labware,
            registry,
            auth,
        }
    }

    fn scope(&self) -> ActionScope<'_> {
        ActionScope::resolve(&self.registry, self.labware.purpose.id.as_str(), &self.auth)
    }

    fn is_known(&self) -> bool {
        self.registry.purpose(self.labware.purpose.id.as_str()).is_some()
    }

    pub fn labware(&self) -> &LabwareSnapshot {
        &self.labware
    }

    pub fn registry(&self) -> &Arc<PurposeRegistry> {
        &self.registry
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn current_state(&self) -> &StateName {
        &self.labware.state
    }

    pub fn variant_id(&self) -> &VariantId {
        self.registry.variant_for(self.labware.purpose.id.as_str())
    }

    pub fn purpose_name(&self) -> String {
        match self.registry.resolve(self.labware.purpose.id.as_str()) {
            Resolution::Known(purpose) => purpose.display_name().to_string(),
            Resolution::Unknown(_) => self
                .labware
                .purpose
                .name
                .clone()
                .unwrap_or_else(|| self.labware.purpose.id.to_string()),
        }
    }

    pub fn legal_events(&self) -> IndexSet<EventName> {
        self.scope().engine().legal_events(self.labware.state.as_str())
    }

    pub fn permitted_tabs(&self) -> IndexSet<ActionId> {
        self.scope()
            .profile
            .tabs
            .permitted(self.labware.state.as_str(), self.auth.authenticated)
    }

    /// Empty unless the current state allows child creation
    pub fn suggested_children(&self) -> ChildSuggestions {
        let scope = self.scope();
        if scope.purpose.is_none()
            || !scope.engine().capabilities(self.labware.state.as_str()).allow_child_creation
        {
            return ChildSuggestions::default();
        }
        children::suggest(
            &self.labware,
            &self.labware.purpose.id,
            &scope.profile.children,
            &self.registry,
        )
    }

    pub fn default_child(&self) -> Option<PurposeId> {
        let selector = &self
            .scope()
            .engine()
            .capabilities(self.labware.state.as_str())
            .default_child;
        self.suggested_children()
            .default_child(selector)
            .map(|child| child.purpose.clone())
    }

    pub fn suitable_robots(&self) -> Vec<RobotSummary> {
        if !self.is_known() {
            return Vec::new();
        }
        let purpose = self.labware.purpose.id.as_str();
        let state = self.labware.state.as_str();
        suitable_robots(purpose, state, self.registry.robots())
            .into_iter()
            .map(|(id, robot)| robot_summary(id, robot, purpose, state))
            .collect()
    }

    pub fn robot_choice(&self) -> RobotChoice {
        self.scope()
            .robot_choice(self.labware.purpose.id.as_str(), self.labware.state.as_str())
    }

    pub fn controlled_action(&self, capability: &str, args: &ActionArgs) -> Option<ActionContext> {
        controlled_action(capability, &self.scope(), &self.labware, args)
    }

    pub fn summary(&self) -> Vec<(String, String)> {
        let scope = self.scope();
        let tube_state = self.tube_state().map(StateName::as_str);
        summary_rows(
            scope.profile.summary.fields,
            &self.labware,
            &self.purpose_name(),
            tube_state,
        )
    }

    pub fn csv_export_links(&self) -> Vec<ExportLink> {
        csv_export_links(
            self.scope().profile.summary.file_links,
            &self.labware,
            &self.registry.defaults().export_root,
        )
    }

    /// Problems worth showing alongside the labware
    pub fn validation_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        match self.registry.resolve(self.labware.purpose.id.as_str()) {
            Resolution::Unknown(unknown) => messages.push(unknown.message),
            Resolution::Known(purpose) => {
                let engine = self.scope().engine();
                if !engine.contains_state(self.labware.state.as_str()) {
                    messages.push(format!(
                        "state '{}' is not part of the '{}' lifecycle used by '{}'",
                        self.labware.state, purpose.state_machine, purpose.id
                    ));
                }
            }
        }
        messages
    }

    /// The intent for `event`, or why it cannot be offered.
    ///
    /// Nothing about the presenter changes either way.
    pub fn propose(&self, event: &str) -> Result<TransitionIntent, InvalidTransition> {
        let advisory_state = self
            .scope()
            .engine()
            .apply(self.labware.state.as_str(), event)?;
        Ok(TransitionIntent {
            labware: self.labware.uuid,
            purpose: self.labware.purpose.id.clone(),
            event: EventName::from(event),
            from_state: self.labware.state.clone(),
            advisory_state,
        })
    }

    fn mirror(&self) -> TubeStateMirror<'_> {
        TubeStateMirror::new(&self.labware.state, self.scope().profile.mirror_tube_state)
    }

    /// Tube state of pooled presenters: always the plate's own state
    pub fn tube_state(&self) -> Option<&StateName> {
        self.mirror().read()
    }

    /// Mirrored fields are read-only; the write is reported and dropped
    pub fn set_tube_state(&self, state: impl Into<StateName>) -> MirrorWrite {
        self.mirror().write(state.into())
    }

    pub fn decision_surface(&self) -> DecisionSurface {
        let span = create_presenter_span(
            "decision_surface",
            Some(&self.labware.uuid),
            Some(self.labware.purpose.id.as_str()),
            Some(self.labware.state.as_str()),
            None,
        );
        let _entered = span.enter();

        let controlled_actions: IndexMap<String, ActionContext> = Capability::ALL
            .into_iter()
            .filter_map(|capability| {
                self.controlled_action(capability.as_str(), &ActionArgs::default())
                    .map(|context| (capability.as_str().to_string(), context))
            })
            .collect();

        let suggested_children = self.suggested_children();
        let default_child = self.default_child();
        let surface = DecisionSurface {
            labware: self.labware.uuid,
            barcode: self.labware.barcode.clone(),
            purpose: self.labware.purpose.id.clone(),
            purpose_name: self.purpose_name(),
            variant: self.variant_id().clone(),
            state: self.labware.state.clone(),
            tube_state: self.tube_state().cloned(),
            legal_events: self.legal_events().into_iter().collect(),
            permitted_tabs: self.permitted_tabs().into_iter().collect(),
            suggested_children,
            default_child,
            robots: self.robot_choice(),
            controlled_actions,
            summary: self.summary(),
            export_links: self.csv_export_links(),
            validation_messages: self.validation_messages(),
        };
        debug!(
            tabs = surface.permitted_tabs.len(),
            children = surface.suggested_children.children.len(),
            actions = surface.controlled_actions.len(),
            "Computed decision surface"
        );
        if !surface.validation_messages.is_empty() {
            info!(messages = ?surface.validation_messages, "Labware presented with validation messages");
        }
        surface
    }
}
