// Gated actions.
//
// A controlled action is offered only when the current state's capability
// record switches it on, its predicate holds for the snapshot, and the
// action's own business rule is satisfied. The returned context is exactly
// what the caller needs to perform the action; `None` means "not offered".

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::children::{self, SuggestedChild};
use crate::ids::{EventName, PurposeId, RobotId, StateName, TAKE_DEFAULT_PATH};
use crate::labware::{AuthContext, LabwareSnapshot};
use crate::purposes::{PurposeBehaviorProfile, PurposeConfig, PurposeRegistry, Resolution};
use crate::robots::{verification_choice, RobotChoice};
use crate::state_machine::{StateMachineEngine, StateMachineVariant};

/// Capabilities a state can switch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    StateChange,
    AdditionalCreation,
    LibraryPassing,
    WellFailure,
    QcData,
    SourceView,
    TubeDisplay,
    Submission,
    RobotVerification,
}

impl Capability {
    pub const ALL: [Capability; 9] = [
        Capability::StateChange,
        Capability::AdditionalCreation,
        Capability::LibraryPassing,
        Capability::WellFailure,
        Capability::QcData,
        Capability::SourceView,
        Capability::TubeDisplay,
        Capability::Submission,
        Capability::RobotVerification,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::StateChange => "state_change",
            Capability::AdditionalCreation => "additional_creation",
            Capability::LibraryPassing => "library_passing",
            Capability::WellFailure => "well_failure",
            Capability::QcData => "qc_data",
            Capability::SourceView => "source_view",
            Capability::TubeDisplay => "tube_display",
            Capability::Submission => "submission",
            Capability::RobotVerification => "robot_verification",
        }
    }

    /// Actions that change something in the tracking backend need a login
    pub fn is_mutating(self) -> bool {
        !matches!(
            self,
            Capability::QcData | Capability::SourceView | Capability::TubeDisplay
        )
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown capability '{0}'")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|capability| capability.as_str() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// Caller-supplied details of the action being asked about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionArgs {
    /// Event for `state_change`; defaults to the canonical forward step
    pub event: Option<EventName>,
    /// Purpose for `additional_creation`; must be one of the suggestions
    pub child_purpose: Option<PurposeId>,
}

impl ActionArgs {
    pub fn event(event: impl Into<EventName>) -> Self {
        Self {
            event: Some(event.into()),
            ..Self::default()
        }
    }

    pub fn child(purpose: impl Into<PurposeId>) -> Self {
        Self {
            child_purpose: Some(purpose.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionSummary {
    pub name: String,
    pub template_name: String,
    pub allowed_extra_barcodes: bool,
}

/// What an authorized action needs in order to be carried out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "capability", rename_all = "snake_case")]
pub enum ActionContext {
    StateChange {
        labware: Uuid,
        event: EventName,
        from_state: StateName,
        target_state: StateName,
    },
    AdditionalCreation {
        labware: Uuid,
        children: Vec<SuggestedChild>,
        default_child: Option<PurposeId>,
    },
    LibraryPassing {
        labware: Uuid,
        receptacles: Vec<String>,
        pipelines: Vec<String>,
    },
    WellFailure {
        labware: Uuid,
        receptacles: Vec<String>,
    },
    QcData {
        keys: Vec<String>,
    },
    SourceView {
        parents: Vec<String>,
    },
    TubeDisplay {
        tubes: Vec<String>,
    },
    Submission {
        labware: Uuid,
        options: Vec<SubmissionSummary>,
    },
    RobotVerification {
        choice: RobotChoice,
    },
}

/// Everything resolved about a labware's purpose for one evaluation
#[derive(Debug, Clone, Copy)]
pub struct ActionScope<'a> {
    pub registry: &'a PurposeRegistry,
    /// `None` when the purpose is not in the registry
    pub purpose: Option<&'a PurposeConfig>,
    pub variant: &'a StateMachineVariant,
    pub profile: PurposeBehaviorProfile<'a>,
    pub auth: &'a AuthContext,
}

impl<'a> ActionScope<'a> {
    pub fn resolve(registry: &'a PurposeRegistry, purpose_id: &str, auth: &'a AuthContext) -> Self {
        let variant = registry.variant(registry.variant_for(purpose_id).as_str());
        let (purpose, profile) = match registry.resolve(purpose_id) {
            Resolution::Known(purpose) => (
                Some(purpose),
                PurposeBehaviorProfile::assemble(purpose, variant, registry.defaults()),
            ),
            Resolution::Unknown(_) => (None, PurposeBehaviorProfile::inert(variant, registry.defaults())),
        };
        Self {
            registry,
            purpose,
            variant,
            profile,
            auth,
        }
    }

    pub fn engine(&self) -> StateMachineEngine<'a> {
        StateMachineEngine::new(self.variant)
    }

    /// Robot offered for verification, shared by every surface of the presenter
    pub fn robot_choice(&self, purpose: &str, state: &str) -> RobotChoice {
        if self.purpose.is_none() {
            return RobotChoice::Default;
        }
        verification_choice(
            purpose,
            state,
            self.registry.robots(),
            self.controlling_robot(state),
        )
    }

    /// Robot configured to own the transition out of `state`, if it exists
    fn controlling_robot(&self, state: &str) -> Option<&'a RobotId> {
        self.profile
            .robots
            .controlling_robot(state)
            .filter(|robot| self.registry.robots().contains_key(*robot))
    }
}

/// Context for the `capability_name` action, or `None` if it is not offered
pub fn controlled_action(
    capability_name: &str,
    scope: &ActionScope<'_>,
    labware: &LabwareSnapshot,
    args: &ActionArgs,
) -> Option<ActionContext> {
    let capability = match capability_name.parse::<Capability>() {
        Ok(capability) => capability,
        Err(e) => {
            debug!(error = %e, "Ignoring controlled action request");
            return None;
        }
    };
    let state = labware.state.as_str();

    if !scope.engine().capabilities(state).permits(capability.as_str(), labware) {
        debug!(capability = %capability, state = state, "Capability not permitted in this state");
        return None;
    }
    if capability.is_mutating() && !scope.auth.authenticated {
        debug!(capability = %capability, "Capability requires an authenticated user");
        return None;
    }

    let context = build_context(capability, scope, labware, args);
    debug!(
        capability = %capability,
        purpose = %labware.purpose.id,
        state = state,
        offered = context.is_some(),
        "Evaluated controlled action"
    );
    context
}

fn build_context(
    capability: Capability,
    scope: &ActionScope<'_>,
    labware: &LabwareSnapshot,
    args: &ActionArgs,
) -> Option<ActionContext> {
    let state = labware.state.as_str();
    let purpose_id = labware.purpose.id.as_str();

    match capability {
        Capability::StateChange => {
            if scope.controlling_robot(state).is_some() {
                return None;
            }
            let event = args
                .event
                .clone()
                .unwrap_or_else(|| EventName::from(TAKE_DEFAULT_PATH));
            let target_state = scope.engine().apply(state, event.as_str()).ok()?;
            Some(ActionContext::StateChange {
                labware: labware.uuid,
                event,
                from_state: labware.state.clone(),
                target_state,
            })
        }
        Capability::AdditionalCreation => {
            let purpose = scope.purpose?;
            let capabilities = scope.engine().capabilities(state);
            if !capabilities.allow_child_creation {
                return None;
            }
            let mut suggestions =
                children::suggest(labware, &purpose.id, &scope.profile.children, scope.registry);
            if let Some(requested) = &args.child_purpose {
                suggestions.children.retain(|child| &child.purpose == requested);
            }
            let default_child = suggestions
                .default_child(&capabilities.default_child)
                .map(|child| child.purpose.clone());
            non_empty(suggestions.children).map(|children| ActionContext::AdditionalCreation {
                labware: labware.uuid,
                children,
                default_child,
            })
        }
        Capability::LibraryPassing => {
            let receptacles: Vec<String> = labware
                .filled_receptacles()
                .filter(|receptacle| receptacle.active_requests().next().is_some())
                .map(|receptacle| receptacle.location.clone())
                .collect();
            let pipelines = scope
                .registry
                .pipelines()
                .library_pass_for(labware)
                .map(|pipeline| pipeline.name.clone())
                .collect();
            non_empty(receptacles).map(|receptacles| ActionContext::LibraryPassing {
                labware: labware.uuid,
                receptacles,
                pipelines,
            })
        }
        Capability::WellFailure => {
            let receptacles: Vec<String> = labware
                .failable_receptacles()
                .map(|receptacle| receptacle.location.clone())
                .collect();
            non_empty(receptacles).map(|receptacles| ActionContext::WellFailure {
                labware: labware.uuid,
                receptacles,
            })
        }
        Capability::QcData => {
            let keys: Vec<String> = labware.qc_results.iter().map(|qc| qc.key.clone()).collect();
            non_empty(keys).map(|keys| ActionContext::QcData { keys })
        }
        Capability::SourceView => {
            let parents: Vec<String> = labware.parents.iter().map(|parent| parent.barcode.clone()).collect();
            non_empty(parents).map(|parents| ActionContext::SourceView { parents })
        }
        Capability::TubeDisplay => {
            let tubes: Vec<String> = labware
                .descendants
                .iter()
                .map(|tube| tube.barcode.clone())
                .collect();
            non_empty(tubes).map(|tubes| ActionContext::TubeDisplay { tubes })
        }
        Capability::Submission => {
            let options: Vec<SubmissionSummary> = scope
                .purpose?
                .submission_options
                .iter()
                .map(|(name, option)| SubmissionSummary {
                    name: name.clone(),
                    template_name: option.template_name.clone(),
                    allowed_extra_barcodes: option.allowed_extra_barcodes,
                })
                .collect();
            non_empty(options).map(|options| ActionContext::Submission {
                labware: labware.uuid,
                options,
            })
        }
        Capability::RobotVerification => {
            let choice = scope.robot_choice(purpose_id, state);
            match choice {
                RobotChoice::Default => None,
                choice => Some(ActionContext::RobotVerification { choice }),
            }
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labware::fixtures::{plate, related, request};
    use crate::labware::{AssetKind, QcResult};

    const REGISTRY: &str = r#"
        [purposes."LB Cherrypick"]
        asset_kind = "plate"
        state_machine = "stock"

        [purposes."LB Shear"]
        asset_kind = "plate"
        parents = ["LB Cherrypick"]

        [purposes."LB End Prep"]
        asset_kind = "plate"
        state_machine = "automated"

        [purposes."LB End Prep".robot_controlled_states]
        pending = "bravo-lb-end-prep"

        [purposes."LB Lib PCR-XP"]
        asset_kind = "plate"
        state_machine = "submission"

        [purposes."LB Lib PCR-XP".submission_options."ISC pooling"]
        template_name = "Limber-Htp - ISC"
        allowed_extra_barcodes = true

        [robots.bravo-lb-end-prep]
        name = "Bravo LB End Prep"

        [robots.bravo-lb-end-prep.beds."580000014851"]
        label = "Bravo Bed 14"
        purpose = "LB End Prep"
        states = ["pending"]
        target_state = "started_fx"

        [[pipelines]]
        name = "WGS"
        filters = { request_type_key = ["limber_wgs"] }
        relationships = { "LB Cherrypick" = "LB Shear" }
        library_pass = "LB Shear"
    "#;

    fn registry() -> PurposeRegistry {
        PurposeRegistry::from_toml_str(REGISTRY).unwrap()
    }

    fn with_wgs(mut labware: LabwareSnapshot) -> LabwareSnapshot {
        labware.receptacles[0].requests.push(request("limber_wgs", None));
        labware
    }

    fn ask(
        registry: &PurposeRegistry,
        auth: &AuthContext,
        capability: &str,
        labware: &LabwareSnapshot,
        args: &ActionArgs,
    ) -> Option<ActionContext> {
        let scope = ActionScope::resolve(registry, labware.purpose.id.as_str(), auth);
        controlled_action(capability, &scope, labware, args)
    }

    #[test]
    fn test_capability_names_parse() {
        for capability in Capability::ALL {
            assert_eq!(capability.as_str().parse::<Capability>(), Ok(capability));
        }
        assert_eq!(
            "teleport".parse::<Capability>(),
            Err(UnknownCapability("teleport".to_string()))
        );
    }

    #[test]
    fn test_state_change_defaults_to_forward_step() {
        let registry = registry();
        let auth = AuthContext::user("jb1");
        let labware = plate("LB Shear", "pending");

        let context = ask(&registry, &auth, "state_change", &labware, &ActionArgs::default());
        assert_eq!(
            context,
            Some(ActionContext::StateChange {
                labware: labware.uuid,
                event: EventName::from("take_default_path"),
                from_state: StateName::from("pending"),
                target_state: StateName::from("started"),
            })
        );

        let fail = ask(&registry, &auth, "state_change", &labware, &ActionArgs::event("fail"));
        assert!(matches!(
            fail,
            Some(ActionContext::StateChange { target_state, .. }) if target_state == "failed"
        ));
        assert!(ask(&registry, &auth, "state_change", &labware, &ActionArgs::event("mark_qc_complete")).is_none());
    }

    #[test]
    fn test_mutating_actions_need_authentication() {
        let registry = registry();
        let mut labware = plate("LB Shear", "pending");
        labware.parents.push(related("DN1S", "LB Cherrypick", AssetKind::Plate));
        let anonymous = AuthContext::anonymous();

        assert!(ask(&registry, &anonymous, "state_change", &labware, &ActionArgs::default()).is_none());
        assert_eq!(
            ask(&registry, &anonymous, "source_view", &labware, &ActionArgs::default()),
            Some(ActionContext::SourceView {
                parents: vec!["DN1S".to_string()]
            })
        );
    }

    #[test]
    fn test_predicate_must_hold() {
        let registry = registry();
        let auth = AuthContext::user("jb1");
        let mut labware = plate("LB Shear", "passed");

        assert!(ask(&registry, &auth, "qc_data", &labware, &ActionArgs::default()).is_none());
        labware.qc_results.push(QcResult {
            key: "molarity".to_string(),
            value: "4.2".to_string(),
            units: Some("nM".to_string()),
        });
        assert_eq!(
            ask(&registry, &auth, "qc_data", &labware, &ActionArgs::default()),
            Some(ActionContext::QcData {
                keys: vec!["molarity".to_string()]
            })
        );
    }

    #[test]
    fn test_capability_not_switched_on_in_state() {
        let registry = registry();
        let auth = AuthContext::user("jb1");
        // well failure is only offered once the plate has passed
        let labware = plate("LB Shear", "pending");
        assert!(ask(&registry, &auth, "well_failure", &labware, &ActionArgs::default()).is_none());

        let labware = plate("LB Shear", "passed");
        assert_eq!(
            ask(&registry, &auth, "well_failure", &labware, &ActionArgs::default()),
            Some(ActionContext::WellFailure {
                labware: labware.uuid,
                receptacles: vec!["A1".to_string(), "B1".to_string()],
            })
        );
    }

    #[test]
    fn test_additional_creation_offers_suggested_children() {
        let registry = registry();
        let auth = AuthContext::user("jb1");
        let labware = with_wgs(plate("LB Cherrypick", "passed"));

        match ask(&registry, &auth, "additional_creation", &labware, &ActionArgs::default()) {
            Some(ActionContext::AdditionalCreation { children, default_child, .. }) => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].purpose, "LB Shear");
                assert_eq!(default_child, Some(PurposeId::from("LB Shear")));
            }
            other => panic!("expected creation context, got {:?}", other),
        }

        assert!(ask(
            &registry,
            &auth,
            "additional_creation",
            &labware,
            &ActionArgs::child("LB End Prep")
        )
        .is_none());

        // no active request, no pipeline, no configured children
        let idle = plate("LB Cherrypick", "passed");
        assert!(ask(&registry, &auth, "additional_creation", &idle, &ActionArgs::default()).is_none());
    }

    #[test]
    fn test_default_child_comes_from_the_offered_children() {
        let registry = PurposeRegistry::from_toml_str(
            r#"
            [purposes."LB Cherrypick"]
            asset_kind = "plate"
            state_machine = "stock"
            children = ["LB Shear", "LB End Prep"]

            [purposes."LB Shear"]
            asset_kind = "plate"

            [purposes."LB End Prep"]
            asset_kind = "plate"
            "#,
        )
        .unwrap();
        let auth = AuthContext::user("jb1");
        let labware = plate("LB Cherrypick", "passed");

        match ask(&registry, &auth, "additional_creation", &labware, &ActionArgs::default()) {
            Some(ActionContext::AdditionalCreation { children, default_child, .. }) => {
                assert_eq!(children.len(), 2);
                assert_eq!(default_child, Some(PurposeId::from("LB Shear")));
            }
            other => panic!("expected creation context, got {:?}", other),
        }

        match ask(
            &registry,
            &auth,
            "additional_creation",
            &labware,
            &ActionArgs::child("LB End Prep"),
        ) {
            Some(ActionContext::AdditionalCreation { children, default_child, .. }) => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].purpose, "LB End Prep");
                assert_eq!(default_child, Some(PurposeId::from("LB End Prep")));
            }
            other => panic!("expected creation context, got {:?}", other),
        }
    }

    #[test]
    fn test_robot_controlled_state_hands_over_to_robot() {
        let registry = registry();
        let auth = AuthContext::user("jb1");
        let labware = plate("LB End Prep", "pending");

        assert!(ask(&registry, &auth, "state_change", &labware, &ActionArgs::default()).is_none());
        match ask(&registry, &auth, "robot_verification", &labware, &ActionArgs::default()) {
            Some(ActionContext::RobotVerification {
                choice: RobotChoice::Direct { robot },
            }) => {
                assert_eq!(robot.id, "bravo-lb-end-prep");
                assert_eq!(robot.target_states, vec![StateName::from("started_fx")]);
            }
            other => panic!("expected direct robot link, got {:?}", other),
        }

        // no robot takes the plate from started_fx, so the generic action stays
        let labware = plate("LB End Prep", "started_fx");
        assert!(ask(&registry, &auth, "robot_verification", &labware, &ActionArgs::default()).is_none());
        assert!(ask(&registry, &auth, "state_change", &labware, &ActionArgs::default()).is_some());
    }

    #[test]
    fn test_library_passing_and_submission() {
        let registry = registry();
        let auth = AuthContext::user("jb1");

        let mut shear = with_wgs(plate("LB Shear", "qc_complete"));
        shear.qc_results.push(QcResult {
            key: "concentration".to_string(),
            value: "17".to_string(),
            units: None,
        });
        assert_eq!(
            ask(&registry, &auth, "library_passing", &shear, &ActionArgs::default()),
            Some(ActionContext::LibraryPassing {
                labware: shear.uuid,
                receptacles: vec!["A1".to_string()],
                pipelines: vec!["WGS".to_string()],
            })
        );

        let xp = plate("LB Lib PCR-XP", "pending");
        match ask(&registry, &auth, "submission", &xp, &ActionArgs::default()) {
            Some(ActionContext::Submission { options, .. }) => {
                assert_eq!(options[0].name, "ISC pooling");
                assert!(options[0].allowed_extra_barcodes);
            }
            other => panic!("expected submission context, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_purpose_and_capability_offer_nothing() {
        let registry = registry();
        let auth = AuthContext::user("jb1");
        let mystery = with_wgs(plate("Mystery Plate", "pending"));
        for capability in Capability::ALL {
            assert!(ask(&registry, &auth, capability.as_str(), &mystery, &ActionArgs::default()).is_none());
        }

        let labware = plate("LB Shear", "pending");
        assert!(ask(&registry, &auth, "teleport", &labware, &ActionArgs::default()).is_none());
    }
}
