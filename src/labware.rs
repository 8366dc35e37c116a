// Read-only view of a labware item as reported by the tracking backend.
// The authoritative copy lives elsewhere; nothing here mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ids::{PurposeId, StateName};

/// Physical container kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Plate,
    Tube,
    TubeRack,
}

impl AssetKind {
    /// Path segment used when building export links
    pub fn route_segment(self) -> &'static str {
        match self {
            AssetKind::Plate => "plates",
            AssetKind::Tube => "tubes",
            AssetKind::TubeRack => "tube_racks",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetKind::Plate => "plate",
            AssetKind::Tube => "tube",
            AssetKind::TubeRack => "tube rack",
        };
        write!(f, "{}", label)
    }
}

/// Request states that no longer drive pipeline selection
const CLOSED_REQUEST_STATES: [&str; 3] = ["passed", "failed", "cancelled"];

/// Receptacle states that cannot be failed again
const UNFAILABLE_STATES: [&str; 2] = ["failed", "cancelled"];

/// Work order attached to a receptacle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub request_type_key: String,
    #[serde(default)]
    pub library_type: Option<String>,
    #[serde(default = "default_request_state")]
    pub state: String,
}

fn default_request_state() -> String {
    "pending".to_string()
}

impl Request {
    pub fn is_active(&self) -> bool {
        !CLOSED_REQUEST_STATES.contains(&self.state.as_str())
    }
}

/// A well on a plate, or the single receptacle of a tube
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receptacle {
    pub location: String,
    #[serde(default)]
    pub aliquots: u32,
    #[serde(default)]
    pub state: Option<StateName>,
    #[serde(default)]
    pub requests: Vec<Request>,
}

impl Receptacle {
    pub fn is_filled(&self) -> bool {
        self.aliquots > 0
    }

    /// Filled and not already failed or cancelled
    pub fn is_failable(&self) -> bool {
        self.is_filled()
            && self
                .state
                .as_ref()
                .map_or(true, |state| !UNFAILABLE_STATES.contains(&state.as_str()))
    }

    pub fn active_requests(&self) -> impl Iterator<Item = &Request> {
        self.requests.iter().filter(|request| request.is_active())
    }
}

/// Parent or descendant labware, as summarised by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedLabware {
    pub uuid: Uuid,
    pub barcode: String,
    pub purpose: PurposeId,
    #[serde(default)]
    pub state: Option<StateName>,
    pub asset_kind: AssetKind,
}

/// A stored QC measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcResult {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub units: Option<String>,
}

/// The purpose reference carried by a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurposeRef {
    pub id: PurposeId,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<&str> for PurposeRef {
    fn from(id: &str) -> Self {
        Self {
            id: PurposeId::from(id),
            name: None,
        }
    }
}

/// Point-in-time copy of a labware item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabwareSnapshot {
    pub uuid: Uuid,
    pub barcode: String,
    pub purpose: PurposeRef,
    pub state: StateName,
    pub asset_kind: AssetKind,
    #[serde(default)]
    pub receptacles: Vec<Receptacle>,
    #[serde(default)]
    pub parents: Vec<RelatedLabware>,
    #[serde(default)]
    pub descendants: Vec<RelatedLabware>,
    #[serde(default)]
    pub qc_results: Vec<QcResult>,
    /// Automation location reported by the backend, if tracked
    #[serde(default)]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LabwareSnapshot {
    pub fn filled_receptacles(&self) -> impl Iterator<Item = &Receptacle> {
        self.receptacles.iter().filter(|receptacle| receptacle.is_filled())
    }

    pub fn has_filled_receptacles(&self) -> bool {
        self.filled_receptacles().next().is_some()
    }

    pub fn failable_receptacles(&self) -> impl Iterator<Item = &Receptacle> {
        self.receptacles.iter().filter(|receptacle| receptacle.is_failable())
    }

    /// Active requests on filled receptacles only
    pub fn active_requests(&self) -> impl Iterator<Item = &Request> {
        self.filled_receptacles()
            .flat_map(|receptacle| receptacle.active_requests())
    }

    pub fn has_qc_data(&self) -> bool {
        !self.qc_results.is_empty()
    }

    pub fn descendant_tubes(&self) -> impl Iterator<Item = &RelatedLabware> {
        self.descendants
            .iter()
            .filter(|labware| labware.asset_kind == AssetKind::Tube)
    }
}

/// Who is asking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<String>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(login: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user: Some(login.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn receptacle(location: &str, aliquots: u32) -> Receptacle {
        Receptacle {
            location: location.to_string(),
            aliquots,
            state: None,
            requests: Vec::new(),
        }
    }

    pub fn request(request_type_key: &str, library_type: Option<&str>) -> Request {
        Request {
            request_type_key: request_type_key.to_string(),
            library_type: library_type.map(str::to_string),
            state: "pending".to_string(),
        }
    }

    pub fn plate(purpose: &str, state: &str) -> LabwareSnapshot {
        LabwareSnapshot {
            uuid: Uuid::from_u128(0x5eed),
            barcode: "DN1000001A".to_string(),
            purpose: PurposeRef::from(purpose),
            state: StateName::from(state),
            asset_kind: AssetKind::Plate,
            receptacles: vec![receptacle("A1", 1), receptacle("B1", 1), receptacle("C1", 0)],
            parents: Vec::new(),
            descendants: Vec::new(),
            qc_results: Vec::new(),
            location: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    pub fn related(barcode: &str, purpose: &str, asset_kind: AssetKind) -> RelatedLabware {
        RelatedLabware {
            uuid: Uuid::new_v4(),
            barcode: barcode.to_string(),
            purpose: PurposeId::from(purpose),
            state: Some(StateName::from("passed")),
            asset_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_filled_and_failable_receptacles() {
        let mut labware = plate("LB Cherrypick", "passed");
        labware.receptacles[1].state = Some(StateName::from("failed"));

        assert_eq!(labware.filled_receptacles().count(), 2);
        let failable: Vec<_> = labware
            .failable_receptacles()
            .map(|receptacle| receptacle.location.as_str())
            .collect();
        assert_eq!(failable, vec!["A1"]);
    }

    #[test]
    fn test_active_requests_ignore_empty_wells_and_closed_requests() {
        let mut labware = plate("LB Cherrypick", "passed");
        labware.receptacles[0].requests.push(request("limber_wgs", None));
        let mut closed = request("limber_isc", None);
        closed.state = "passed".to_string();
        labware.receptacles[1].requests.push(closed);
        labware.receptacles[2].requests.push(request("limber_rna", None));

        let keys: Vec<_> = labware
            .active_requests()
            .map(|request| request.request_type_key.as_str())
            .collect();
        assert_eq!(keys, vec!["limber_wgs"]);
    }

    #[test]
    fn test_snapshot_deserializes_with_defaults() {
        let json = r#"{
            "uuid": "6f1c2a8e-1b1a-4c55-9a4e-0c3a3f0f2b11",
            "barcode": "DN1S",
            "purpose": {"id": "LB Shear"},
            "state": "pending",
            "asset_kind": "plate",
            "created_at": "2024-03-01T09:30:00Z"
        }"#;
        let labware: LabwareSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(labware.state, "pending");
        assert!(labware.receptacles.is_empty());
        assert!(!labware.has_filled_receptacles());
    }
}
