use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::ids::{EventName, PurposeId, StateName, VariantId};

/// Structural problems in a state machine definition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("state machine '{variant}' declares no states")]
    NoStates { variant: VariantId },
    #[error("initial state '{state}' is not declared in '{variant}'")]
    UndeclaredInitial { variant: VariantId, state: StateName },
    #[error("event '{event}' in '{variant}' references undeclared state '{state}'")]
    UndeclaredState {
        variant: VariantId,
        event: EventName,
        state: StateName,
    },
    #[error("event '{event}' in '{variant}' has more than one edge leaving '{state}'")]
    AmbiguousEvent {
        variant: VariantId,
        event: EventName,
        state: StateName,
    },
    #[error("capabilities in '{variant}' reference undeclared state '{state}'")]
    UndeclaredCapabilityState { variant: VariantId, state: StateName },
}

/// Errors raised while loading or validating the purpose registry
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read registry file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse registry document: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {kind} identifier '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error("purpose '{purpose}' selects unknown state machine '{variant}'")]
    UnknownVariant { purpose: PurposeId, variant: VariantId },
    #[error("state machine '{0}' is defined more than once")]
    DuplicateVariant(VariantId),
    #[error("purpose graph contains a cycle through '{0}'")]
    CyclicPurposeGraph(PurposeId),
    #[error("purpose '{purpose}' configures tabs for undeclared state '{state}'")]
    UndeclaredTabState { purpose: PurposeId, state: StateName },
    #[error("purpose '{purpose}' hands undeclared state '{state}' to a robot")]
    UndeclaredRobotState { purpose: PurposeId, state: StateName },
}

/// An event that is not legal from the current state.
///
/// Returned before any external call is made; producing it never changes
/// anything the presenter reports afterwards.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("event '{event}' is not allowed from state '{current_state}'")]
pub struct InvalidTransition {
    pub event: EventName,
    pub current_state: StateName,
    pub legal_events: Vec<EventName>,
}

/// Failures reported by the external fetch/mutation layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("labware {0} was not found")]
    NotFound(Uuid),
    #[error("tracking service unavailable: {0}")]
    Unavailable(String),
    #[error("tracking service rejected the request: {0}")]
    Rejected(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Unavailable(_))
    }
}

/// Errors surfaced to callers of the transition hand-off
#[derive(Debug, Error)]
pub enum PresenterError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error("transition submission for {uuid} failed: {source}")]
    Submission {
        uuid: Uuid,
        #[source]
        source: SourceError,
    },
    #[error("labware {uuid} changed but could not be re-fetched: {source}")]
    StaleSnapshot {
        uuid: Uuid,
        #[source]
        source: SourceError,
    },
}

impl PresenterError {
    /// A failed re-fetch can always be retried; the transition itself was accepted.
    pub fn is_retryable(&self) -> bool {
        match self {
            PresenterError::InvalidTransition(_) => false,
            PresenterError::Submission { source, .. } => source.is_retryable(),
            PresenterError::StaleSnapshot { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let error = InvalidTransition {
            event: EventName::from("pass"),
            current_state: StateName::from("cancelled"),
            legal_events: Vec::new(),
        };
        assert_eq!(
            error.to_string(),
            "event 'pass' is not allowed from state 'cancelled'"
        );
    }

    #[test]
    fn test_retryable_classification() {
        let uuid = Uuid::nil();
        let stale = PresenterError::StaleSnapshot {
            uuid,
            source: SourceError::NotFound(uuid),
        };
        assert!(stale.is_retryable());

        let rejected = PresenterError::Submission {
            uuid,
            source: SourceError::Rejected("locked".to_string()),
        };
        assert!(!rejected.is_retryable());

        let unavailable = PresenterError::Submission {
            uuid,
            source: SourceError::Unavailable("timeout".to_string()),
        };
        assert!(unavailable.is_retryable());
    }
}
