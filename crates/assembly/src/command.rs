use serde::{Deserialize, Serialize};

use carchain_core::{Operation, OrgId, PartKind, Vin};

/// Command: Create (order a new car record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Create {
    pub vin: Vin,
}

/// Command: AssignMaker (choose which organization builds a part).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignMaker {
    pub vin: Vin,
    pub part: PartKind,
    pub maker: OrgId,
}

/// Command: Supply (record the serial of a delivered part).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supply {
    pub vin: Vin,
    pub part: PartKind,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CarCommand {
    Create(Create),
    AssignMaker(AssignMaker),
    Supply(Supply),
    Query,
}

impl CarCommand {
    pub fn operation(&self) -> Operation {
        match self {
            CarCommand::Create(_) => Operation::Create,
            CarCommand::AssignMaker(_) => Operation::AssignMaker,
            CarCommand::Supply(_) => Operation::Supply,
            CarCommand::Query => Operation::Query,
        }
    }

    /// Vin targeted by the command, if any.
    pub fn vin(&self) -> Option<&Vin> {
        match self {
            CarCommand::Create(c) => Some(&c.vin),
            CarCommand::AssignMaker(c) => Some(&c.vin),
            CarCommand::Supply(c) => Some(&c.vin),
            CarCommand::Query => None,
        }
    }
}
