//! Strongly-typed identifiers for Grafana resources.
//!
//! Grafana identifies most entities with a 64-bit integer. Wrapping each kind in its
//! own type prevents passing an org id where an annotation id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Macro to generate strongly-typed integer identifier types.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Parses an identifier from a decimal string.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is not a valid integer.
            pub fn parse_str(input: &str) -> Result<Self> {
                input
                    .trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| {
                        Error::ValidationError(format!(
                            "invalid {}: {input}",
                            stringify!($name)
                        ))
                    })
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse_str(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(AnnotationId, "Annotation identifier");
id_type!(AlertId, "Alert identifier");
id_type!(DashboardId, "Dashboard identifier");
id_type!(PanelId, "Dashboard panel identifier");
id_type!(RegionId, "Region identifier shared by the two ends of a region annotation");
id_type!(UserId, "User identifier");
id_type!(OrgId, "Organization identifier");
id_type!(DataSourceId, "Datasource identifier");
id_type!(FolderId, "Dashboard folder identifier");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_get() {
        let id = AnnotationId::new(42);
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn test_id_parse() {
        assert_eq!(OrgId::parse_str(" 7 ").unwrap(), OrgId::new(7));
        assert_eq!("12".parse::<UserId>().unwrap(), UserId::new(12));

        let err = OrgId::parse_str("seven").unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
        assert!(err.to_string().contains("OrgId"));
    }

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&DashboardId::new(3)).unwrap();
        assert_eq!(json, "3");

        let parsed: PanelId = serde_json::from_str("9").unwrap();
        assert_eq!(parsed, PanelId::new(9));
    }

    #[test]
    fn test_id_default_is_zero() {
        assert_eq!(RegionId::default().get(), 0);
    }
}
