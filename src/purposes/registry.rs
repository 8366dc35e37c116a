use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use super::types::PurposeConfig;
use crate::children::{Pipeline, PipelineGraph};
use crate::errors::ConfigError;
use crate::ids::{ActionId, PurposeId, RobotId, VariantId};
use crate::robots::{RobotConfig, RobotTable};
use crate::state_machine::{StateMachineVariant, VariantCatalogue, VariantDocument};

/// Registry-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryDefaults {
    /// Tabs an unauthenticated visitor may still see
    pub anonymous_tabs: Vec<ActionId>,
    /// Prefix of export link paths
    pub export_root: String,
}

impl Default for RegistryDefaults {
    fn default() -> Self {
        Self {
            anonymous_tabs: vec![ActionId::from("summary")],
            export_root: "/".to_string(),
        }
    }
}

/// The registry document as written on disk
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub defaults: RegistryDefaults,
    #[serde(default)]
    pub state_machines: IndexMap<VariantId, VariantDocument>,
    #[serde(default)]
    pub purposes: IndexMap<PurposeId, PurposeConfig>,
    #[serde(default)]
    pub robots: IndexMap<RobotId, RobotConfig>,
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
}

/// A purpose id with no registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownPurpose {
    pub id: PurposeId,
    pub message: String,
}

/// Outcome of looking a purpose up; unknown ids are not errors
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Known(&'a PurposeConfig),
    Unknown(UnknownPurpose),
}

impl Resolution<'_> {
    pub fn is_known(&self) -> bool {
        matches!(self, Resolution::Known(_))
    }
}

/// Immutable snapshot of the whole deployment configuration.
///
/// Holds purposes, state machine variants, robots and pipelines. Built once
/// from a [`RegistryDocument`] and never mutated; see
/// [`RegistryStore`](super::store::RegistryStore) for reloading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurposeRegistry {
    defaults: RegistryDefaults,
    variants: VariantCatalogue,
    purposes: IndexMap<PurposeId, PurposeConfig>,
    robots: RobotTable,
    pipelines: PipelineGraph,
    #[serde(skip)]
    warnings: Vec<String>,
}

struct IdentifierRules {
    snake_case: Regex,
    label: Regex,
    robot: Regex,
}

impl IdentifierRules {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            snake_case: Regex::new(r"^[a-z][a-z0-9_]*$")?,
            label: Regex::new(r"^\S(?:.*\S)?$")?,
            robot: Regex::new(r"^[a-z0-9][a-z0-9_-]*$")?,
        })
    }

    fn check(pattern: &Regex, kind: &'static str, value: &str) -> Result<(), ConfigError> {
        if pattern.is_match(value) {
            Ok(())
        } else {
            Err(ConfigError::InvalidIdentifier {
                kind,
                value: value.to_string(),
            })
        }
    }
}

impl PurposeRegistry {
    /// Registry with the built-in variants and nothing else
    pub fn empty() -> Result<Self, ConfigError> {
        Self::from_document(RegistryDocument::default())
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let document: RegistryDocument = toml::from_str(source)?;
        Self::from_document(document)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_toml_str(&source)?;
        info!(
            path = %path.display(),
            purposes = registry.purposes.len(),
            robots = registry.robots.len(),
            pipelines = registry.pipelines.pipelines().len(),
            "Loaded purpose registry"
        );
        Ok(registry)
    }

    pub fn from_document(document: RegistryDocument) -> Result<Self, ConfigError> {
        let rules = IdentifierRules::new().map_err(|error| ConfigError::InvalidIdentifier {
            kind: "pattern",
            value: error.to_string(),
        })?;
        let mut warnings = Vec::new();

        let mut variants = VariantCatalogue::builtin()?;
        for (id, variant_document) in document.state_machines {
            IdentifierRules::check(&rules.snake_case, "state machine", id.as_str())?;
            for state in &variant_document.states {
                IdentifierRules::check(&rules.snake_case, "state", state.as_str())?;
            }
            for event in &variant_document.events {
                IdentifierRules::check(&rules.snake_case, "event", event.name.as_str())?;
            }
            variants.insert(variant_document.into_variant(id)?)?;
        }

        let mut purposes = IndexMap::new();
        for (id, mut purpose) in document.purposes {
            IdentifierRules::check(&rules.label, "purpose", id.as_str())?;
            let Some(variant) = variants.get(purpose.state_machine.as_str()) else {
                return Err(ConfigError::UnknownVariant {
                    purpose: id,
                    variant: purpose.state_machine,
                });
            };
            for state in purpose.authenticated_tab_states.keys() {
                if !variant.definition.contains_state(state.as_str()) {
                    return Err(ConfigError::UndeclaredTabState {
                        purpose: id,
                        state: state.clone(),
                    });
                }
            }
            for state in purpose.robot_controlled_states.keys() {
                if !variant.definition.contains_state(state.as_str()) {
                    return Err(ConfigError::UndeclaredRobotState {
                        purpose: id,
                        state: state.clone(),
                    });
                }
            }
            purpose.id = id.clone();
            purposes.insert(id, purpose);
        }

        let mut robots = RobotTable::new();
        for (id, mut robot) in document.robots {
            IdentifierRules::check(&rules.robot, "robot", id.as_str())?;
            robot.id = Some(id.clone());
            robots.insert(id, robot);
        }

        let registry = Self {
            defaults: document.defaults,
            variants,
            purposes,
            robots,
            pipelines: PipelineGraph::new(document.pipelines),
            warnings: Vec::new(),
        };
        registry.check_purpose_graph()?;
        registry.collect_dangling_references(&mut warnings);
        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(Self {
            warnings,
            ..registry
        })
    }

    /// Look a purpose up; unknown ids resolve to an inert description
    pub fn resolve(&self, purpose_id: &str) -> Resolution<'_> {
        match self.purposes.get(purpose_id) {
            Some(purpose) => Resolution::Known(purpose),
            None => {
                debug!(purpose = purpose_id, "Purpose not in registry");
                Resolution::Unknown(UnknownPurpose {
                    id: PurposeId::from(purpose_id),
                    message: format!(
                        "'{}' is not a purpose this deployment knows about; the labware is shown read-only",
                        purpose_id
                    ),
                })
            }
        }
    }

    pub fn purpose(&self, purpose_id: &str) -> Option<&PurposeConfig> {
        self.purposes.get(purpose_id)
    }

    /// Variant selected by the purpose, or the inert variant for unknown purposes
    pub fn variant_for(&self, purpose_id: &str) -> &VariantId {
        match self.purposes.get(purpose_id) {
            Some(purpose) => &purpose.state_machine,
            None => &self.variants.inert().id,
        }
    }

    pub fn variant(&self, variant_id: &str) -> &StateMachineVariant {
        self.variants.get_or_inert(variant_id)
    }

    pub fn variants(&self) -> &VariantCatalogue {
        &self.variants
    }

    pub fn purposes(&self) -> impl Iterator<Item = &PurposeConfig> {
        self.purposes.values()
    }

    pub fn robots(&self) -> &RobotTable {
        &self.robots
    }

    pub fn pipelines(&self) -> &PipelineGraph {
        &self.pipelines
    }

    pub fn defaults(&self) -> &RegistryDefaults {
        &self.defaults
    }

    /// Soft problems found while loading (dangling references and the like)
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Child edges from purpose configuration and pipeline relationships
    fn child_edges(&self) -> HashMap<&PurposeId, Vec<&PurposeId>> {
        let mut edges: HashMap<&PurposeId, Vec<&PurposeId>> = HashMap::new();
        for purpose in self.purposes.values() {
            edges.entry(&purpose.id).or_default().extend(purpose.children.iter());
        }
        for pipeline in self.pipelines.pipelines() {
            for (parent, child) in &pipeline.relationships {
                edges.entry(parent).or_default().push(child);
            }
        }
        edges
    }

    fn check_purpose_graph(&self) -> Result<(), ConfigError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            node: &'a PurposeId,
            edges: &HashMap<&'a PurposeId, Vec<&'a PurposeId>>,
            marks: &mut HashMap<&'a PurposeId, Mark>,
        ) -> Result<(), ConfigError> {
            match marks.get(node) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => return Err(ConfigError::CyclicPurposeGraph(node.clone())),
                None => {}
            }
            marks.insert(node, Mark::Visiting);
            for child in edges.get(node).into_iter().flatten() {
                visit(*child, edges, marks)?;
            }
            marks.insert(node, Mark::Done);
            Ok(())
        }

        let edges = self.child_edges();
        let mut marks = HashMap::new();
        let mut roots: Vec<&PurposeId> = edges.keys().copied().collect();
        roots.sort();
        for root in roots {
            visit(root, &edges, &mut marks)?;
        }
        Ok(())
    }

    fn collect_dangling_references(&self, warnings: &mut Vec<String>) {
        for purpose in self.purposes.values() {
            for related in purpose.parents.iter().chain(purpose.children.iter()) {
                if !self.purposes.contains_key(related) {
                    warnings.push(format!(
                        "purpose '{}' references unknown purpose '{}'",
                        purpose.id, related
                    ));
                }
            }
            for (state, robot_id) in &purpose.robot_controlled_states {
                match self.robots.get(robot_id) {
                    None => warnings.push(format!(
                        "purpose '{}' hands state '{}' to unknown robot '{}'",
                        purpose.id, state, robot_id
                    )),
                    Some(robot) if !robot.is_suitable_for(purpose.id.as_str(), state.as_str()) => {
                        warnings.push(format!(
                            "robot '{}' has no bed accepting '{}' in state '{}'",
                            robot_id, purpose.id, state
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
        for (id, robot) in &self.robots {
            for bed in robot.beds.values() {
                if let Some(purpose) = &bed.purpose {
                    if !self.purposes.contains_key(purpose) {
                        warnings.push(format!(
                            "robot '{}' bed '{}' expects unknown purpose '{}'",
                            id, bed.label, purpose
                        ));
                    }
                }
            }
        }
        for pipeline in self.pipelines.pipelines() {
            for purpose in pipeline.purposes() {
                if !self.purposes.contains_key(purpose) {
                    warnings.push(format!(
                        "pipeline '{}' mentions unknown purpose '{}'",
                        pipeline.name, purpose
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::UNKNOWN_VARIANT;

    const REGISTRY: &str = r#"
        [purposes."LB Cherrypick"]
        asset_kind = "plate"
        state_machine = "stock"
        children = ["LB Shear"]

        [purposes."LB Shear"]
        asset_kind = "plate"
        state_machine = "automated"
        parents = ["LB Cherrypick"]

        [robots.bravo-lb-shear]
        name = "Bravo LB Shear"

        [robots.bravo-lb-shear.beds."580000004838"]
        label = "Bed 4"
        purpose = "LB Shear"
        states = ["pending"]
        target_state = "started_fx"
    "#;

    #[test]
    fn test_resolve_known_and_unknown_purposes() {
        let registry = PurposeRegistry::from_toml_str(REGISTRY).unwrap();

        match registry.resolve("LB Shear") {
            Resolution::Known(purpose) => {
                assert_eq!(purpose.id, "LB Shear");
                assert_eq!(purpose.display_name(), "LB Shear");
            }
            other => panic!("expected known purpose, got {:?}", other),
        }

        match registry.resolve("Mystery Plate") {
            Resolution::Unknown(unknown) => {
                assert_eq!(unknown.id, "Mystery Plate");
                assert!(unknown.message.contains("Mystery Plate"));
            }
            other => panic!("expected unknown purpose, got {:?}", other),
        }
    }

    #[test]
    fn test_variant_for() {
        let registry = PurposeRegistry::from_toml_str(REGISTRY).unwrap();
        assert_eq!(registry.variant_for("LB Cherrypick"), "stock");
        assert_eq!(registry.variant_for("LB Shear"), "automated");
        assert_eq!(registry.variant_for("Mystery Plate"), UNKNOWN_VARIANT);
        assert!(registry.variant(UNKNOWN_VARIANT).is_inert());
        assert!(registry.variant("not-a-variant").is_inert());
    }

    #[test]
    fn test_robot_ids_are_filled_from_keys() {
        let registry = PurposeRegistry::from_toml_str(REGISTRY).unwrap();
        let robot = registry.robots().get("bravo-lb-shear").unwrap();
        assert_eq!(robot.id, Some(RobotId::from("bravo-lb-shear")));
        assert!(registry.warnings().is_empty());
    }

    #[test]
    fn test_unknown_variant_is_a_config_error() {
        let error = PurposeRegistry::from_toml_str(
            r#"
            [purposes."LB Shear"]
            asset_kind = "plate"
            state_machine = "warp_drive"
            "#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::UnknownVariant { .. }));
    }

    #[test]
    fn test_tabs_for_undeclared_state_are_rejected() {
        let error = PurposeRegistry::from_toml_str(
            r#"
            [purposes."LB Shear"]
            asset_kind = "plate"

            [purposes."LB Shear".authenticated_tab_states]
            started_fx = ["summary"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::UndeclaredTabState { .. }));
    }

    #[test]
    fn test_robot_state_must_be_declared() {
        let error = PurposeRegistry::from_toml_str(
            r#"
            [purposes."LB Shear"]
            asset_kind = "plate"

            [purposes."LB Shear".robot_controlled_states]
            started_fx = "bravo-lb-shear"
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            error,
            ConfigError::UndeclaredRobotState { ref state, .. } if state == "started_fx"
        ));
    }

    #[test]
    fn test_controlling_robot_without_accepting_bed_is_reported() {
        let registry = PurposeRegistry::from_toml_str(
            r#"
            [purposes."LB Shear"]
            asset_kind = "plate"
            state_machine = "automated"

            [purposes."LB Shear".robot_controlled_states]
            pending = "bravo-lb-post-shear"

            [robots.bravo-lb-post-shear]
            name = "Bravo LB Post Shear"

            [robots.bravo-lb-post-shear.beds."580000007861"]
            label = "Bed 7"
            purpose = "LB Shear"
            states = ["started_fx"]
            target_state = "started_mj"
            "#,
        )
        .unwrap();
        assert_eq!(
            registry.warnings(),
            ["robot 'bravo-lb-post-shear' has no bed accepting 'LB Shear' in state 'pending'"]
        );
    }

    #[test]
    fn test_cyclic_purpose_graph_is_rejected() {
        let error = PurposeRegistry::from_toml_str(
            r#"
            [purposes.A]
            asset_kind = "plate"
            children = ["B"]

            [purposes.B]
            asset_kind = "plate"
            children = ["C"]

            [[pipelines]]
            name = "Loop"
            relationships = { C = "A" }

            [purposes.C]
            asset_kind = "tube"
            "#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::CyclicPurposeGraph(_)));
    }

    #[test]
    fn test_branching_and_merging_graph_is_accepted() {
        let registry = PurposeRegistry::from_toml_str(
            r#"
            [purposes.A]
            asset_kind = "plate"
            children = ["B", "C"]

            [purposes.B]
            asset_kind = "plate"
            children = ["D"]

            [purposes.C]
            asset_kind = "plate"
            children = ["D"]

            [purposes.D]
            asset_kind = "tube"
            "#,
        )
        .unwrap();
        assert_eq!(registry.purposes().count(), 4);
    }

    #[test]
    fn test_dangling_references_become_warnings() {
        let registry = PurposeRegistry::from_toml_str(
            r#"
            [purposes.A]
            asset_kind = "plate"
            children = ["Nowhere"]
            "#,
        )
        .unwrap();
        assert_eq!(registry.warnings().len(), 1);
        assert!(registry.warnings()[0].contains("Nowhere"));
    }

    #[test]
    fn test_invalid_identifiers_are_rejected() {
        let error = PurposeRegistry::from_toml_str(
            r#"
            [state_machines.Bad-Name]
            states = ["pending"]
            initial = "pending"
            "#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::InvalidIdentifier { kind: "state machine", .. }));

        let error = PurposeRegistry::from_toml_str(
            r#"
            [purposes." padded "]
            asset_kind = "plate"
            "#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::InvalidIdentifier { kind: "purpose", .. }));
    }

    #[test]
    fn test_custom_state_machine_is_registered() {
        let registry = PurposeRegistry::from_toml_str(
            r#"
            [state_machines.two_step]
            states = ["pending", "processed", "passed"]
            initial = "pending"
            events = [
                { name = "take_default_path", from = ["pending"], to = "processed" },
                { name = "take_default_path", from = ["processed"], to = "passed" },
            ]

            [purposes."Custom Plate"]
            asset_kind = "plate"
            state_machine = "two_step"
            "#,
        )
        .unwrap();
        assert!(!registry.variant("two_step").is_inert());
        assert_eq!(registry.variant_for("Custom Plate"), "two_step");
    }
}
