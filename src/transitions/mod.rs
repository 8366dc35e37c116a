// Transition hand-off
//
// The core only proposes. The backend performs the change, and the caller
// re-fetches and rebuilds its presenter from the new snapshot.

pub mod coordinator;
pub mod intent;
pub mod lifecycle;
#[cfg(test)]
pub mod mocks;
pub mod traits;

pub use coordinator::{TransitionCoordinator, TransitionOutcome};
pub use intent::TransitionIntent;
pub use lifecycle::{RequestEvent, RequestPhase, TransitionRequest};
pub use traits::{LabwareSource, TransitionSubmitter};
