use thiserror::Error;

use carchain_core::TxId;

/// Ledger stub operation error.
///
/// These are **infrastructure errors** (key encoding, commit-time validation,
/// backend failures) as opposed to domain errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The transaction read a version that a concurrent commit has since
    /// replaced. Retrying the whole invocation may succeed.
    #[error("read conflict: {0}")]
    Conflict(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// One entry returned by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

/// Per-transaction view of the store handed to the contract by the runtime.
///
/// Reads observe committed state only (not this transaction's own writes);
/// writes are buffered and become visible only if the runtime commits them.
pub trait LedgerStub {
    /// Identifier of the transaction this stub executes.
    fn tx_id(&self) -> TxId;

    /// Raw credential of the invoking client.
    fn creator(&self) -> &[u8];

    /// Point read. `None` when the key has never been written.
    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Buffer a full-value write of `key`.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Scan every key starting with `prefix`, in ascending key order.
    fn get_state_by_prefix(&mut self, prefix: &str) -> Result<StateIterator, StoreError>;
}

impl<L> LedgerStub for &mut L
where
    L: LedgerStub + ?Sized,
{
    fn tx_id(&self) -> TxId {
        (**self).tx_id()
    }

    fn creator(&self) -> &[u8] {
        (**self).creator()
    }

    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get_state(key)
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        (**self).put_state(key, value)
    }

    fn get_state_by_prefix(&mut self, prefix: &str) -> Result<StateIterator, StoreError> {
        (**self).get_state_by_prefix(prefix)
    }
}

type Entries = Box<dyn Iterator<Item = Result<KeyValue, StoreError>>>;

/// Scan cursor holding a backend resource.
///
/// The resource is released exactly once: by [`StateIterator::close`], or on
/// drop if the cursor is abandoned (early return, `?`, panic unwinding).
pub struct StateIterator {
    entries: Entries,
    release: Option<Box<dyn FnOnce()>>,
}

impl StateIterator {
    pub fn new<I, F>(entries: I, release: F) -> Self
    where
        I: Iterator<Item = Result<KeyValue, StoreError>> + 'static,
        F: FnOnce() + 'static,
    {
        Self {
            entries: Box::new(entries),
            release: Some(Box::new(release)),
        }
    }

    /// Release the backend resource now.
    pub fn close(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Iterator for StateIterator {
    type Item = Result<KeyValue, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.release.is_none() {
            return None;
        }
        self.entries.next()
    }
}

impl Drop for StateIterator {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl core::fmt::Debug for StateIterator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StateIterator")
            .field("open", &self.release.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn entries(n: usize) -> impl Iterator<Item = Result<KeyValue, StoreError>> {
        (0..n).map(|i| {
            Ok(KeyValue {
                key: format!("k{i}"),
                value: vec![i as u8],
            })
        })
    }

    #[test]
    fn close_releases_once() {
        let released = Rc::new(Cell::new(0));
        let counter = released.clone();
        let mut it = StateIterator::new(entries(2), move || counter.set(counter.get() + 1));

        assert_eq!(it.next().unwrap().unwrap().key, "k0");
        it.close();
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn drop_releases_abandoned_cursor() {
        let released = Rc::new(Cell::new(0));
        {
            let counter = released.clone();
            let _it = StateIterator::new(entries(3), move || counter.set(counter.get() + 1));
        }
        assert_eq!(released.get(), 1);
    }

    #[test]
    fn exhausted_cursor_still_releases_exactly_once() {
        let released = Rc::new(Cell::new(0));
        let counter = released.clone();
        let mut it = StateIterator::new(entries(1), move || counter.set(counter.get() + 1));

        assert_eq!(it.by_ref().count(), 1);
        assert!(it.next().is_none());
        it.close();
        assert_eq!(released.get(), 1);
    }
}
