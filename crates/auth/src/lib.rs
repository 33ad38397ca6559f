//! `carchain-auth`: identity and authorization boundary.
//!
//! Resolves a caller's organization from its raw credential and decides, from
//! a data-driven policy table, whether that organization may run an operation.
//! This crate is intentionally decoupled from storage and transport.

pub mod authorize;
pub mod identity;
pub mod organization;
pub mod policy;

pub use authorize::{AccessRequest, AuthzError};
pub use identity::{
    IdentityError, IdentityResolver, SyntheticIdentityResolver, X509IdentityResolver,
};
pub use organization::canonical_organization;
pub use policy::{AccessPolicy, AssignMakerRule, OrgRule, PolicyError, SupplyRule};
