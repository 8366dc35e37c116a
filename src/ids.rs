// String identifiers used across the registry and the decision engine.
// Each one is a transparent newtype so TOML/JSON keys map onto them directly.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id!(
    /// Registry key of a labware purpose, e.g. `LB Cherrypick`
    PurposeId
);
string_id!(
    /// Lifecycle state tag as reported by the tracking backend
    StateName
);
string_id!(
    /// Name of a transition event, e.g. `take_default_path`
    EventName
);
string_id!(
    /// Identifier of a tab or action offered to the user
    ActionId
);
string_id!(
    /// Selects a state machine definition and its capability table
    VariantId
);
string_id!(
    /// Registry key of an automation profile
    RobotId
);

/// The canonical single-hop forward event.
pub const TAKE_DEFAULT_PATH: &str = "take_default_path";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_ids_compare_with_str() {
        let state = StateName::from("passed");
        assert_eq!(state, "passed");
        assert_eq!(state.as_str(), "passed");
        assert_eq!(state.to_string(), "passed");
    }

    #[test]
    fn test_ids_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(PurposeId::from("LB Cherrypick"), 1);
        assert_eq!(map.get("LB Cherrypick"), Some(&1));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&EventName::from("pass")).unwrap();
        assert_eq!(json, "\"pass\"");
        let back: EventName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, "pass");
    }
}
