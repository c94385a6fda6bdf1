//! Strongly-typed external identifiers for Prism resources.
//!
//! Prism Central hands out opaque, stable `extId` strings. Most are UUIDs, but
//! some (task identifiers for instance) carry a base64 cluster prefix, so the
//! wrappers hold strings and only reject values that cannot be placed in a URL
//! path segment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Macro to generate strongly-typed external identifier wrappers.
macro_rules! ext_id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parses an identifier, rejecting values unusable as a path segment.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is empty or contains `/`, `?`, `#`
            /// or whitespace.
            pub fn parse_str(input: &str) -> Result<Self> {
                validate_ext_id(input).map(|value| Self(value.to_string()))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Converts into the inner string.
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
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
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

ext_id_type!(VmExtId, "Virtual machine external identifier");
ext_id_type!(ClusterExtId, "Cluster external identifier");
ext_id_type!(HostExtId, "Host (hypervisor node) external identifier");
ext_id_type!(CategoryExtId, "Category external identifier");

/// Validates an external identifier string.
///
/// # Errors
///
/// Returns an error if the string is empty or contains characters that would
/// break out of a URL path segment.
pub fn validate_ext_id(s: &str) -> Result<&str> {
    if s.is_empty() {
        return Err(Error::InvalidEndpoint(
            "external identifier must not be empty".to_string(),
        ));
    }
    if s.chars()
        .any(|c| c == '/' || c == '?' || c == '#' || c.is_whitespace())
    {
        return Err(Error::InvalidEndpoint(format!(
            "external identifier `{s}` contains reserved characters"
        )));
    }
    Ok(s)
}
