// Which child purposes can be made from a labware right now.
//
// Candidates come from the active pipelines, narrowed by the purpose's
// configured children and then by each restriction in turn. Anything that
// falls out along the way is reported as a soft warning, never an error.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;

use crate::ids::PurposeId;
use crate::labware::{AssetKind, LabwareSnapshot};
use crate::purposes::{ChildCreationProfile, ChildRestriction, PurposeConfig, PurposeRegistry};
use crate::state_machine::ChildSelector;

/// One purpose that may be created next
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedChild {
    pub purpose: PurposeId,
    pub name: String,
    pub asset_kind: AssetKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChildSuggestions {
    pub children: Vec<SuggestedChild>,
    /// Why expected purposes are not on offer
    pub warnings: Vec<String>,
}

impl ChildSuggestions {
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn purposes(&self) -> Vec<PurposeId> {
        self.children.iter().map(|child| child.purpose.clone()).collect()
    }

    /// The child to preselect, if the state's selector picks one
    pub fn default_child(&self, selector: &ChildSelector) -> Option<&SuggestedChild> {
        let purposes = self.purposes();
        let chosen = selector.select(&purposes)?;
        self.children.iter().find(|child| &child.purpose == chosen)
    }

    fn warn(&mut self, message: String) {
        debug!(warning = %message, "Child purpose hidden");
        self.warnings.push(message);
    }
}

/// Children for a labware of `purpose`, using the registry's pipeline graph
pub fn suggested_children(
    labware: &LabwareSnapshot,
    purpose: &PurposeConfig,
    registry: &PurposeRegistry,
) -> ChildSuggestions {
    let profile = ChildCreationProfile::from(purpose);
    suggest(labware, &purpose.id, &profile, registry)
}

/// Same as [`suggested_children`] with the creation profile already assembled
pub fn suggest(
    labware: &LabwareSnapshot,
    purpose: &PurposeId,
    profile: &ChildCreationProfile<'_>,
    registry: &PurposeRegistry,
) -> ChildSuggestions {
    let mut suggestions = ChildSuggestions::default();

    if !labware.has_filled_receptacles() {
        debug!(labware = %labware.barcode, "No filled receptacles; nothing can be made");
        return suggestions;
    }

    let from_pipelines = registry.pipelines().children_for(labware);
    let mut candidates: IndexSet<PurposeId> = if from_pipelines.is_empty() {
        if profile.configured.is_empty() {
            suggestions.warn(format!(
                "no active pipeline matches {} and '{}' configures no children",
                labware.barcode, purpose
            ));
            return suggestions;
        }
        suggestions.warn(format!(
            "no active pipeline matches {}; offering the configured children of '{}'",
            labware.barcode, purpose
        ));
        profile.configured.iter().cloned().collect()
    } else if profile.configured.is_empty() {
        from_pipelines
    } else {
        let mut kept = IndexSet::new();
        for child in from_pipelines {
            if profile.configured.contains(&child) {
                kept.insert(child);
            } else {
                suggestions.warn(format!(
                    "purpose '{}' hidden because it is not a configured child of '{}'",
                    child, purpose
                ));
            }
        }
        kept
    };

    for restriction in profile.restrictions {
        apply_restriction(restriction, labware, registry, &mut candidates, &mut suggestions);
    }

    for child in candidates {
        match registry.purpose(child.as_str()) {
            Some(config) => suggestions.children.push(SuggestedChild {
                name: config.display_name().to_string(),
                asset_kind: config.asset_kind,
                purpose: child,
            }),
            None => suggestions.warn(format!(
                "purpose '{}' hidden because it is not in the registry",
                child
            )),
        }
    }

    suggestions
}

fn apply_restriction(
    restriction: &ChildRestriction,
    labware: &LabwareSnapshot,
    registry: &PurposeRegistry,
    candidates: &mut IndexSet<PurposeId>,
    suggestions: &mut ChildSuggestions,
) {
    let before = std::mem::take(candidates);
    for child in before {
        if keeps(restriction, labware, registry, &child) {
            candidates.insert(child);
        } else {
            suggestions.warn(format!(
                "purpose '{}' hidden because of restriction {}",
                child,
                restriction_label(restriction)
            ));
        }
    }
}

fn keeps(
    restriction: &ChildRestriction,
    labware: &LabwareSnapshot,
    registry: &PurposeRegistry,
    child: &PurposeId,
) -> bool {
    match restriction {
        ChildRestriction::SingleTarget { purpose } => child == purpose,
        ChildRestriction::ExcludeQcOnly => !registry
            .purpose(child.as_str())
            .is_some_and(|config| config.qc_only),
        // a labware at an unmapped location keeps nothing
        ChildRestriction::ByLocation { locations } => labware
            .location
            .as_deref()
            .and_then(|location| locations.get(location))
            .is_some_and(|purposes| purposes.contains(child)),
    }
}

fn restriction_label(restriction: &ChildRestriction) -> &'static str {
    match restriction {
        ChildRestriction::SingleTarget { .. } => "single_target",
        ChildRestriction::ExcludeQcOnly => "exclude_qc_only",
        ChildRestriction::ByLocation { .. } => "by_location",
    }
}
