use serde::{Deserialize, Serialize};
use thiserror::Error;

use carchain_assembly::{AssignMaker, CarCommand, Create, Supply};
use carchain_core::{Operation, OrgId, PartKind, Vin};

/// Operation name plus ordered string arguments, as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub function: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        function: Operation,
        expected: usize,
        got: usize,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Invocation {
    pub fn new<I, S>(function: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate names and arity, and turn the arguments into a typed command.
    pub fn parse(&self) -> Result<CarCommand, InvocationError> {
        let operation: Operation = self
            .function
            .parse()
            .map_err(|_| InvocationError::UnknownFunction(self.function.clone()))?;

        match operation {
            Operation::Create => {
                let [vin] = self.arity::<1>(operation)?;
                Ok(CarCommand::Create(Create { vin: parse_vin(vin)? }))
            }
            Operation::AssignMaker => {
                let [vin, part, maker] = self.arity::<3>(operation)?;
                Ok(CarCommand::AssignMaker(AssignMaker {
                    vin: parse_vin(vin)?,
                    part: parse_part(part)?,
                    maker: OrgId::new(non_empty("maker", maker)?),
                }))
            }
            Operation::Supply => {
                let [vin, part, id] = self.arity::<3>(operation)?;
                Ok(CarCommand::Supply(Supply {
                    vin: parse_vin(vin)?,
                    part: parse_part(part)?,
                    id: non_empty("id", id)?.to_string(),
                }))
            }
            Operation::Query => {
                let [] = self.arity::<0>(operation)?;
                Ok(CarCommand::Query)
            }
        }
    }

    fn arity<const N: usize>(&self, function: Operation) -> Result<[&str; N], InvocationError> {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        args.try_into().map_err(|args: Vec<&str>| InvocationError::ArgumentCount {
            function,
            expected: N,
            got: args.len(),
        })
    }
}

fn parse_vin(raw: &str) -> Result<Vin, InvocationError> {
    raw.parse()
        .map_err(|e: carchain_core::DomainError| InvocationError::InvalidArgument(e.to_string()))
}

fn parse_part(raw: &str) -> Result<PartKind, InvocationError> {
    raw.parse()
        .map_err(|e: carchain_core::DomainError| InvocationError::InvalidArgument(e.to_string()))
}

fn non_empty<'a>(name: &str, raw: &'a str) -> Result<&'a str, InvocationError> {
    if raw.trim().is_empty() {
        return Err(InvocationError::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(raw)
}
