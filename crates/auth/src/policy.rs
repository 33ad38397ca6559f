//! Data-driven access policy table.
//!
//! The table is plain data: it can be built in code, deserialized from JSON at
//! startup, or swapped out in tests. [`AccessPolicy::default`] is the standard
//! supply-chain table (factory assigns engine makers, gm supplies bodies, the
//! engine makers rr/ferrari/gm supply engines).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use carchain_core::{OrgId, PartKind};

/// Predicate over the caller's organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgRule {
    /// Any caller, including one whose identity cannot be resolved.
    Any,
    /// Only callers from one of these organizations.
    OneOf(BTreeSet<OrgId>),
}

impl OrgRule {
    pub fn one_of<I, O>(orgs: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<OrgId>,
    {
        Self::OneOf(orgs.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, org: &OrgId) -> bool {
        match self {
            OrgRule::Any => true,
            OrgRule::OneOf(orgs) => orgs.contains(org),
        }
    }

    /// Whether the caller's identity has to be resolved to evaluate this rule.
    pub fn requires_identity(&self) -> bool {
        !matches!(self, OrgRule::Any)
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            OrgRule::Any => "any organization".to_string(),
            OrgRule::OneOf(orgs) => {
                let names: Vec<&str> = orgs.iter().map(OrgId::as_str).collect();
                format!("{{{}}}", names.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignMakerRule {
    pub callers: OrgRule,
    pub assignable_parts: BTreeSet<PartKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupplyRule {
    /// The one organization allowed to supply (and stamp) bodies.
    pub body_supplier: OrgId,
    /// Organizations that may supply engines, provided they are also the
    /// engine's assigned maker.
    pub engine_suppliers: OrgRule,
}

/// Operation → allowed-organization table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AccessPolicy {
    pub create: OrgRule,
    pub query: OrgRule,
    pub assign_maker: AssignMakerRule,
    pub supply: SupplyRule,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            create: OrgRule::Any,
            query: OrgRule::Any,
            assign_maker: AssignMakerRule {
                callers: OrgRule::one_of(["factory"]),
                assignable_parts: BTreeSet::from([PartKind::Engine]),
            },
            supply: SupplyRule {
                body_supplier: OrgId::from("gm"),
                engine_suppliers: OrgRule::one_of(["rr", "ferrari", "gm"]),
            },
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("failed to parse policy: {0}")]
    Parse(String),

    #[error("invalid policy: {0}")]
    Invalid(String),
}

impl AccessPolicy {
    /// Parse and validate a JSON policy table.
    ///
    /// Missing top-level sections fall back to the default table.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let policy: AccessPolicy =
            serde_json::from_str(json).map_err(|e| PolicyError::Parse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Reject tables that would lock every caller out of an operation or
    /// stamp bodies with an empty maker.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.supply.body_supplier.is_unset() {
            return Err(PolicyError::Invalid("body_supplier must not be empty".into()));
        }
        for (name, rule) in [
            ("create", &self.create),
            ("query", &self.query),
            ("assign_maker.callers", &self.assign_maker.callers),
            ("supply.engine_suppliers", &self.supply.engine_suppliers),
        ] {
            if let OrgRule::OneOf(orgs) = rule {
                if orgs.is_empty() {
                    return Err(PolicyError::Invalid(format!("{name} allows no organization")));
                }
                if orgs.iter().any(OrgId::is_unset) {
                    return Err(PolicyError::Invalid(format!(
                        "{name} contains an empty organization"
                    )));
                }
            }
        }
        if self.assign_maker.assignable_parts.is_empty() {
            return Err(PolicyError::Invalid(
                "assign_maker.assignable_parts must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let policy = AccessPolicy::default();
        assert!(policy.validate().is_ok());
        assert!(policy.assign_maker.callers.allows(&OrgId::from("factory")));
        assert!(!policy.assign_maker.callers.allows(&OrgId::from("gm")));
        assert!(policy.supply.engine_suppliers.allows(&OrgId::from("ferrari")));
        assert!(!policy.create.requires_identity());
    }

    #[test]
    fn parses_partial_json_over_defaults() {
        let policy = AccessPolicy::from_json(
            r#"{
                "supply": {
                    "body_supplier": "pininfarina",
                    "engine_suppliers": { "one_of": ["rr"] }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(policy.supply.body_supplier, "pininfarina");
        assert!(!policy.supply.engine_suppliers.allows(&OrgId::from("gm")));
        assert_eq!(policy.assign_maker, AccessPolicy::default().assign_maker);
        assert_eq!(policy.query, OrgRule::Any);
    }

    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&AccessPolicy::default()).unwrap();
        assert_eq!(AccessPolicy::from_json(&json).unwrap(), AccessPolicy::default());
    }

    #[test]
    fn rejects_unknown_fields_and_empty_sets() {
        assert!(matches!(
            AccessPolicy::from_json(r#"{ "delete": "any" }"#),
            Err(PolicyError::Parse(_))
        ));

        let err = AccessPolicy::from_json(
            r#"{ "assign_maker": {
                "callers": { "one_of": [] },
                "assignable_parts": ["engine"]
            } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::Invalid(msg) if msg.contains("assign_maker.callers")));

        let err = AccessPolicy::from_json(
            r#"{ "supply": { "body_supplier": "", "engine_suppliers": "any" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::Invalid(_)));
    }

    #[test]
    fn describes_rules_for_denial_messages() {
        assert_eq!(OrgRule::one_of(["rr", "gm"]).describe(), "{gm, rr}");
        assert_eq!(OrgRule::Any.describe(), "any organization");
    }
}
