use indexmap::IndexSet;

use crate::ids::ActionId;
use crate::purposes::{PurposeBehaviorProfile, PurposeConfig, RegistryDefaults};
use crate::state_machine::{StateMachineVariant, TabTable};

/// Tabs listed for `state` in `table`.
///
/// A state missing from the table gets no tabs at all. Anonymous callers
/// keep only the entries also present in `anonymous_tabs`, in table order.
pub fn tabs_from_table(
    table: &TabTable,
    state: &str,
    authenticated: bool,
    anonymous_tabs: &[ActionId],
) -> IndexSet<ActionId> {
    let Some(tabs) = table.get(state) else {
        return IndexSet::new();
    };
    tabs.iter()
        .filter(|tab| authenticated || anonymous_tabs.contains(tab))
        .cloned()
        .collect()
}

/// Tabs for a labware of `purpose` in `state`; `None` is an unknown purpose
pub fn permitted_tabs(
    purpose: Option<&PurposeConfig>,
    variant: &StateMachineVariant,
    state: &str,
    authenticated: bool,
    defaults: &RegistryDefaults,
) -> IndexSet<ActionId> {
    let profile = match purpose {
        Some(purpose) => PurposeBehaviorProfile::assemble(purpose, variant, defaults),
        None => PurposeBehaviorProfile::inert(variant, defaults),
    };
    profile.tabs.permitted(state, authenticated)
}
