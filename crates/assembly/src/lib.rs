//! Vehicle assembly domain module.
//!
//! This crate contains the car record model and its field-level transitions,
//! implemented purely as deterministic domain logic (no IO, no identity, no
//! storage). Authorization is decided by `carchain-auth` before any of these
//! transitions run.

pub mod car;
pub mod command;

pub use car::{AssemblyStage, CarRecord, Part};
pub use command::{AssignMaker, CarCommand, Create, Supply};
