use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{PurposeId, RobotId, StateName};

/// One bed of a robot, keyed by its barcode in [`RobotConfig::beds`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedConfig {
    pub label: String,
    #[serde(default)]
    pub purpose: Option<PurposeId>,
    /// States the labware on this bed may be in
    #[serde(default)]
    pub states: Vec<StateName>,
    /// State the labware moves to once verified; absent for informational beds
    #[serde(default)]
    pub target_state: Option<StateName>,
    /// Bed barcode of the labware this one is made from
    #[serde(default)]
    pub parent: Option<String>,
}

impl BedConfig {
    pub fn drives_transition(&self) -> bool {
        self.target_state
            .as_ref()
            .is_some_and(|state| !state.as_str().is_empty())
    }

    /// Accepts labware of `purpose` in `state` and moves it on
    pub fn accepts(&self, purpose: &str, state: &str) -> bool {
        self.purpose.as_ref().is_some_and(|bed_purpose| bed_purpose == purpose)
            && self.states.iter().any(|bed_state| bed_state == state)
            && self.drives_transition()
    }
}

/// An automation profile with its bed layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Filled from the registry key
    #[serde(default, skip_deserializing)]
    pub id: Option<RobotId>,
    pub name: String,
    /// Bed barcode -> bed
    #[serde(default)]
    pub beds: IndexMap<String, BedConfig>,
    /// Whether the robot barcode itself must be scanned
    #[serde(default)]
    pub require_robot: bool,
}

impl RobotConfig {
    pub fn beds_for<'a>(
        &'a self,
        purpose: &'a str,
        state: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a BedConfig)> + 'a {
        self.beds
            .iter()
            .filter(move |(_, bed)| bed.accepts(purpose, state))
    }

    pub fn is_suitable_for(&self, purpose: &str, state: &str) -> bool {
        self.beds_for(purpose, state).next().is_some()
    }
}

pub type RobotTable = IndexMap<RobotId, RobotConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    fn bed(purpose: &str, states: &[&str], target: Option<&str>) -> BedConfig {
        BedConfig {
            label: "Bed 1".to_string(),
            purpose: Some(PurposeId::from(purpose)),
            states: states.iter().map(|state| StateName::from(*state)).collect(),
            target_state: target.map(StateName::from),
            parent: None,
        }
    }

    #[test]
    fn test_bed_accepts_purpose_state_and_target() {
        assert!(bed("LB Shear", &["pending"], Some("started")).accepts("LB Shear", "pending"));
        assert!(!bed("LB Shear", &["pending"], Some("started")).accepts("LB Shear", "passed"));
        assert!(!bed("LB Shear", &["pending"], Some("started")).accepts("LB End Prep", "pending"));
        assert!(!bed("LB Shear", &["pending"], None).accepts("LB Shear", "pending"));
        assert!(!bed("LB Shear", &["pending"], Some("")).accepts("LB Shear", "pending"));
    }

    #[test]
    fn test_robot_parses_from_toml() {
        let robot: RobotConfig = toml::from_str(
            r#"
            name = "Bravo LB Post Shear => LB End Prep"
            require_robot = true

            [beds."580000004838"]
            label = "Bed 4"
            purpose = "LB Post Shear"
            states = ["passed"]

            [beds."580000014851"]
            label = "Bed 14"
            purpose = "LB End Prep"
            states = ["pending"]
            target_state = "started"
            parent = "580000004838"
            "#,
        )
        .unwrap();

        assert!(robot.id.is_none());
        assert_eq!(robot.beds.len(), 2);
        assert!(robot.is_suitable_for("LB End Prep", "pending"));
        assert!(!robot.is_suitable_for("LB Post Shear", "passed"));
    }
}
