// Declarative purpose configuration, as read from the registry document

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{PurposeId, RobotId, StateName, VariantId};
use crate::labware::AssetKind;
use crate::state_machine::TabTable;

/// Presenter preset a purpose builds its behaviour profile from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenterKind {
    #[default]
    Standard,
    Stock,
    Pooled,
    FinalTube,
    TubeRack,
    Submission,
}

/// Extra narrowing of suggested children, applied in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChildRestriction {
    /// Only ever offer this one purpose
    SingleTarget { purpose: PurposeId },
    /// Drop purposes flagged `qc_only`
    ExcludeQcOnly,
    /// Automation location -> purposes that may be made there
    ByLocation {
        locations: IndexMap<String, Vec<PurposeId>>,
    },
}

/// Which states a link or action is visible in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFilter {
    #[serde(default)]
    pub include: Vec<StateName>,
    #[serde(default)]
    pub exclude: Vec<StateName>,
}

impl StateFilter {
    /// An empty include list means every state not excluded
    pub fn allows(&self, state: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|s| s == state);
        included && !self.exclude.iter().any(|s| s == state)
    }
}

fn default_link_format() -> String {
    "csv".to_string()
}

/// A downloadable export offered on the labware page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLink {
    pub name: String,
    pub id: String,
    #[serde(default = "default_link_format")]
    pub format: String,
    #[serde(default)]
    pub states: StateFilter,
    #[serde(default)]
    pub params: IndexMap<String, String>,
}

/// A work order template that can be placed from this purpose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOption {
    pub template_name: String,
    #[serde(default)]
    pub request_options: IndexMap<String, String>,
    #[serde(default)]
    pub allowed_extra_barcodes: bool,
}

/// Rows of the summary panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryField {
    Barcode,
    Purpose,
    State,
    CreatedAt,
    FilledReceptacles,
    InputBarcode,
    Descendants,
    TubeState,
    Location,
}

fn default_variant() -> VariantId {
    VariantId::from("standard")
}

/// Configuration of one purpose
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeConfig {
    /// Filled from the registry key
    #[serde(default, skip_deserializing)]
    pub id: PurposeId,
    #[serde(default)]
    pub name: Option<String>,
    pub asset_kind: AssetKind,
    #[serde(default = "default_variant")]
    pub state_machine: VariantId,
    #[serde(default)]
    pub presenter: PresenterKind,
    #[serde(default)]
    pub parents: Vec<PurposeId>,
    #[serde(default)]
    pub children: Vec<PurposeId>,
    #[serde(default)]
    pub child_restrictions: Vec<ChildRestriction>,
    /// Made only for QC; hidden by `exclude_qc_only`
    #[serde(default)]
    pub qc_only: bool,
    /// Overrides the variant's default tab table when present
    #[serde(default)]
    pub authenticated_tab_states: TabTable,
    /// States whose transition is only performed by a robot
    #[serde(default)]
    pub robot_controlled_states: IndexMap<StateName, RobotId>,
    #[serde(default)]
    pub submission_options: IndexMap<String, SubmissionOption>,
    #[serde(default)]
    pub file_links: Vec<FileLink>,
    #[serde(default)]
    pub summary_items: Vec<SummaryField>,
}

impl PurposeConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_filter() {
        let everything = StateFilter::default();
        assert!(everything.allows("pending"));

        let filter = StateFilter {
            include: vec![StateName::from("passed"), StateName::from("qc_complete")],
            exclude: vec![StateName::from("qc_complete")],
        };
        assert!(filter.allows("passed"));
        assert!(!filter.allows("qc_complete"));
        assert!(!filter.allows("pending"));
    }

    #[test]
    fn test_purpose_parses_with_defaults() {
        let purpose: PurposeConfig = toml::from_str(
            r#"
            asset_kind = "plate"
            children = ["LB Shear"]
            summary_items = ["barcode", "state", "created_at"]

            [[child_restrictions]]
            kind = "single_target"
            purpose = "LB Shear"

            [[file_links]]
            name = "Download Concentration (nM) CSV"
            id = "concentrations_nm"
            states = { include = ["passed"] }

            [authenticated_tab_states]
            pending = ["summary", "state"]

            [robot_controlled_states]
            pending = "bravo-lb-shear"
            "#,
        )
        .unwrap();

        assert_eq!(purpose.state_machine, "standard");
        assert_eq!(purpose.presenter, PresenterKind::Standard);
        assert_eq!(purpose.file_links[0].format, "csv");
        assert_eq!(
            purpose.child_restrictions,
            vec![ChildRestriction::SingleTarget {
                purpose: PurposeId::from("LB Shear")
            }]
        );
        assert_eq!(
            purpose.robot_controlled_states.get("pending"),
            Some(&RobotId::from("bravo-lb-shear"))
        );
        assert_eq!(purpose.summary_items.len(), 3);
        assert!(!purpose.qc_only);
    }
}
