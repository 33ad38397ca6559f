//! Invocation vocabulary shared by the policy and the state machine.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Operation exposed on the invocation surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    AssignMaker,
    Supply,
    Query,
}

impl Operation {
    /// Name used on the invocation surface.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::AssignMaker => "assignMaker",
            Operation::Supply => "supply",
            Operation::Query => "query",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = DomainError;

    // "order" and "setMaker" are the names older clients still send.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" | "order" => Ok(Operation::Create),
            "assignMaker" | "setMaker" => Ok(Operation::AssignMaker),
            "supply" => Ok(Operation::Supply),
            "query" => Ok(Operation::Query),
            other => Err(DomainError::validation(format!("unknown function '{other}'"))),
        }
    }
}

/// Physical component of a vehicle that can be claimed and supplied.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Engine,
    Body,
}

impl PartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartKind::Engine => "engine",
            PartKind::Body => "body",
        }
    }
}

impl core::fmt::Display for PartKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PartKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "engine" => Ok(PartKind::Engine),
            "body" => Ok(PartKind::Body),
            other => Err(DomainError::validation(format!("unsupported part '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_operation_names_are_accepted() {
        assert_eq!("order".parse::<Operation>().unwrap(), Operation::Create);
        assert_eq!("setMaker".parse::<Operation>().unwrap(), Operation::AssignMaker);
        assert!("delete".parse::<Operation>().is_err());
    }

    #[test]
    fn part_names_are_case_sensitive() {
        assert_eq!("engine".parse::<PartKind>().unwrap(), PartKind::Engine);
        assert!(matches!("Engine".parse::<PartKind>(), Err(DomainError::Validation(_))));
        assert!(matches!("wheel".parse::<PartKind>(), Err(DomainError::Validation(_))));
    }
}
