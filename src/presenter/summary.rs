// Summary panel rows

use crate::labware::LabwareSnapshot;
use crate::purposes::SummaryField;

impl SummaryField {
    pub fn label(self) -> &'static str {
        match self {
            SummaryField::Barcode => "Barcode",
            SummaryField::Purpose => "Labware type",
            SummaryField::State => "State",
            SummaryField::CreatedAt => "Created on",
            SummaryField::FilledReceptacles => "Filled receptacles",
            SummaryField::InputBarcode => "Input barcode",
            SummaryField::Descendants => "Descendants",
            SummaryField::TubeState => "Tube state",
            SummaryField::Location => "Location",
        }
    }
}

/// Ordered `(label, value)` pairs for `fields`.
///
/// `tube_state` is only present for presenters that mirror it; the row is
/// left out otherwise.
pub fn summary_rows(
    fields: &[SummaryField],
    labware: &LabwareSnapshot,
    purpose_name: &str,
    tube_state: Option<&str>,
) -> Vec<(String, String)> {
    fields
        .iter()
        .filter_map(|field| {
            let value = match field {
                SummaryField::Barcode => labware.barcode.clone(),
                SummaryField::Purpose => purpose_name.to_string(),
                SummaryField::State => labware.state.to_string(),
                SummaryField::CreatedAt => labware.created_at.format("%Y-%m-%d %H:%M").to_string(),
                SummaryField::FilledReceptacles => format!(
                    "{} of {}",
                    labware.filled_receptacles().count(),
                    labware.receptacles.len()
                ),
                SummaryField::InputBarcode => labware
                    .parents
                    .first()
                    .map(|parent| parent.barcode.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                SummaryField::Descendants => {
                    if labware.descendants.is_empty() {
                        "None".to_string()
                    } else {
                        labware
                            .descendants
                            .iter()
                            .map(|child| child.barcode.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    }
                }
                SummaryField::TubeState => tube_state?.to_string(),
                SummaryField::Location => labware
                    .location
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            };
            Some((field.label().to_string(), value))
        })
        .collect()
}
