//! Ledger stub boundary.
//!
//! The hosting runtime owns the real store: it executes each invocation
//! against a per-transaction stub, then validates and commits the resulting
//! read/write set atomically. This module defines the stub interface the
//! contract logic sees, the composite key encoding, and an in-memory MVCC
//! ledger used for tests and local runs.

pub mod in_memory;
pub mod key;
pub mod r#trait;

pub use in_memory::{InMemoryLedger, RangeRead, ReadWriteSet, TxSimulator};
pub use key::CompositeKey;
pub use r#trait::{KeyValue, LedgerStub, StateIterator, StoreError};
