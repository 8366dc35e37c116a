// Purpose Presenter Library - labware decision engine
// This exposes the core components for testing and integration

pub mod authorization;
pub mod children;
pub mod cli;
pub mod config;
pub mod errors;
pub mod ids;
pub mod labware;
pub mod presenter;
pub mod purposes;
pub mod robots;
pub mod state_machine;
pub mod telemetry;
pub mod transitions;

// Re-export key types for easy access
pub use authorization::{controlled_action, permitted_tabs, ActionArgs, ActionContext, Capability};
pub use children::{suggested_children, ChildSuggestions, SuggestedChild};
pub use config::{config, init_config, AppConfig};
pub use errors::{ConfigError, DefinitionError, InvalidTransition, PresenterError, SourceError};
pub use ids::{ActionId, EventName, PurposeId, RobotId, StateName, VariantId};
pub use labware::{AssetKind, AuthContext, LabwareSnapshot};
pub use presenter::{DecisionSurface, Presenter};
pub use purposes::{PurposeRegistry, RegistryStore, Resolution};
pub use robots::{RobotChoice, RobotSummary};
pub use state_machine::{StateMachineEngine, StateMachineVariant};
pub use telemetry::{create_presenter_span, generate_correlation_id, init_telemetry};
pub use transitions::{LabwareSource, TransitionCoordinator, TransitionIntent, TransitionSubmitter};
