//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Vehicle identification number: the sole identity of a car record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

/// Canonical organization identifier (e.g. `"rr"` for `"rr.example.com"`).
///
/// The empty value means "unset" when it appears inside a part claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(String);

/// Identifier of a single ledger transaction (one invocation).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(Uuid);

macro_rules! impl_string_newtype {
    ($t:ty) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl PartialEq<str> for $t {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $t {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

impl_string_newtype!(Vin);
impl_string_newtype!(OrgId);

impl FromStr for Vin {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(DomainError::invalid_id("Vin: must not be empty"));
        }
        Ok(Self(s.to_string()))
    }
}

impl OrgId {
    /// Whether this is the "unset" organization of an unclaimed part.
    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }
}

impl TxId {
    /// Fresh time-ordered (UUIDv7) identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TxId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_vin_is_rejected() {
        assert!(matches!("".parse::<Vin>(), Err(DomainError::InvalidId(_))));
        assert!(matches!("  ".parse::<Vin>(), Err(DomainError::InvalidId(_))));
        assert_eq!("VIN1".parse::<Vin>().unwrap(), "VIN1");
    }

    #[test]
    fn default_org_is_unset() {
        assert!(OrgId::default().is_unset());
        assert!(!OrgId::from("gm").is_unset());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&OrgId::from("rr")).unwrap();
        assert_eq!(json, "\"rr\"");
        let vin: Vin = serde_json::from_str("\"VIN9\"").unwrap();
        assert_eq!(vin.as_str(), "VIN9");
    }
}
