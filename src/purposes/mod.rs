// Purpose registry: declarative configuration, its validated snapshot and
// the behaviour profiles presenters are built from

pub mod profile;
pub mod registry;
pub mod store;
pub mod types;

pub use profile::{
    ChildCreationProfile, PurposeBehaviorProfile, RobotBehaviour, SummaryProfile,
    TabVisibilityProfile,
};
pub use registry::{PurposeRegistry, RegistryDefaults, RegistryDocument, Resolution, UnknownPurpose};
pub use store::RegistryStore;
pub use types::{
    ChildRestriction, FileLink, PresenterKind, PurposeConfig, StateFilter, SubmissionOption,
    SummaryField,
};
