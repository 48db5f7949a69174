//! Typed identifiers shared across the flowdeck crates.
//!
//! Every id renders as `<prefix>_<ulid>` (for example `run_01J9ZK...`), and
//! the prefix is part of the wire contract: parsing requires it, so a run id
//! string can never be mistaken for an automation id. Node ids are not here;
//! they are authored in the visual editor and live in the engine crate as a
//! string newtype.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when an id string does not match its expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    /// The string does not start with the type's `<prefix>_` marker.
    MissingPrefix { expected: &'static str },
    /// The part after the prefix is not a valid ULID.
    InvalidUlid { reason: String },
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix { expected } => {
                write!(f, "id is missing the '{expected}_' prefix")
            }
            Self::InvalidUlid { reason } => write!(f, "id is not a valid ulid: {reason}"),
        }
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Mints a fresh id.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let Some(raw) = s.strip_prefix(concat!($prefix, "_")) else {
                    return Err(ParseIdError::MissingPrefix { expected: $prefix });
                };
                let ulid = raw.parse::<Ulid>().map_err(|e| ParseIdError::InvalidUlid {
                    reason: e.to_string(),
                })?;
                Ok(Self(ulid))
            }
        }
    };
}

typed_id!(
    /// Identifier of an automation definition.
    AutomationId => "auto"
);

typed_id!(
    /// Identifier of a single execution (run) of an automation.
    RunId => "run"
);

typed_id!(
    /// Handle to a registered progress listener.
    ListenerId => "lsn"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_type_prefix() {
        assert!(AutomationId::new().to_string().starts_with("auto_"));
        assert!(RunId::new().to_string().starts_with("run_"));
        assert!(ListenerId::new().to_string().starts_with("lsn_"));
    }

    #[test]
    fn display_roundtrips_through_parse() {
        let id = RunId::new();
        let parsed: RunId = id.to_string().parse().expect("parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn bare_ulid_is_rejected() {
        let err = Ulid::new().to_string().parse::<AutomationId>().unwrap_err();
        assert_eq!(err, ParseIdError::MissingPrefix { expected: "auto" });
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        // a run id string must not parse as an automation id
        let rendered = RunId::new().to_string();
        assert!(rendered.parse::<AutomationId>().is_err());
    }

    #[test]
    fn garbage_after_prefix_is_rejected() {
        let err = "run_not-a-ulid".parse::<RunId>().unwrap_err();
        assert!(matches!(err, ParseIdError::InvalidUlid { .. }));
    }

    #[test]
    fn ids_are_usable_as_set_keys() {
        let id = ListenerId::new();
        let mut set = std::collections::HashSet::from([id, ListenerId::new()]);
        set.insert(id);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serde_encodes_the_bare_ulid() {
        let id = AutomationId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert!(!json.contains("auto_"));
        let back: AutomationId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }
}
