//! Optimistic concurrency expectations.
//!
//! Versions are owned by the store: every committed write of a key bumps its
//! version by one, and version `0` means the key has never been written.

use crate::error::{DomainError, DomainResult};

/// Optimistic concurrency expectation for a stored value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (blind writes).
    Any,
    /// Require the value to be at an exact version (`0` = absent).
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
