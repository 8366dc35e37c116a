// Shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use std::sync::Arc;
use uuid::Uuid;

use purpose_presenter::labware::{AssetKind, PurposeRef, Receptacle, Request};
use purpose_presenter::{LabwareSnapshot, PurposeRegistry, StateName};

pub const REGISTRY_TOML: &str = include_str!("registry.toml");

pub static REGISTRY: Lazy<Arc<PurposeRegistry>> = Lazy::new(|| {
    Arc::new(PurposeRegistry::from_toml_str(REGISTRY_TOML).expect("fixture registry is valid"))
});

pub fn registry() -> Arc<PurposeRegistry> {
    Arc::clone(&REGISTRY)
}

fn well(location: &str, aliquots: u32) -> Receptacle {
    Receptacle {
        location: location.to_string(),
        aliquots,
        state: None,
        requests: if aliquots > 0 {
            vec![Request {
                request_type_key: "limber_wgs".to_string(),
                library_type: Some("Standard".to_string()),
                state: "started".to_string(),
            }]
        } else {
            Vec::new()
        },
    }
}

/// A plate with two filled wells carrying WGS requests and one empty well
pub fn plate(purpose: &str, state: &str) -> LabwareSnapshot {
    LabwareSnapshot {
        uuid: Uuid::from_u128(0xfeed),
        barcode: "DN2000002B".to_string(),
        purpose: PurposeRef::from(purpose),
        state: StateName::from(state),
        asset_kind: AssetKind::Plate,
        receptacles: vec![well("A1", 1), well("B1", 2), well("C1", 0)],
        parents: Vec::new(),
        descendants: Vec::new(),
        qc_results: Vec::new(),
        location: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 14, 11, 0, 0).unwrap(),
    }
}

/// Same plate with nothing in any well
pub fn empty_plate(purpose: &str, state: &str) -> LabwareSnapshot {
    let mut labware = plate(purpose, state);
    for receptacle in &mut labware.receptacles {
        receptacle.aliquots = 0;
        receptacle.requests.clear();
    }
    labware
}
