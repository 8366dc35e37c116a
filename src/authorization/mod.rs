// Authorization: tab visibility and gated controlled actions.
//
// Everything here is a pure function of its inputs; results must be
// recomputed after every observed state change.

pub mod controlled;
pub mod tabs;

pub use controlled::{
    controlled_action, ActionArgs, ActionContext, ActionScope, Capability, SubmissionSummary,
    UnknownCapability,
};
pub use tabs::{permitted_tabs, tabs_from_table};
