use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use carchain_core::{ExpectedVersion, TxId};

use super::r#trait::{KeyValue, LedgerStub, StateIterator, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
struct VersionedValue {
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug, Default)]
struct ScanCounters {
    opened: AtomicUsize,
    released: AtomicUsize,
}

/// In-memory multi-version ledger.
///
/// Intended for tests and local runs. Transactions are simulated against the
/// committed state with [`InMemoryLedger::begin`] and validated on
/// [`InMemoryLedger::commit`]: if any key (or prefix range) a transaction read
/// has been committed to since, the whole transaction is rejected.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<BTreeMap<String, VersionedValue>>,
    scans: Arc<ScanCounters>,
}

/// Keys observed by one prefix scan, with the versions seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeRead {
    pub prefix: String,
    pub observed: Vec<(String, u64)>,
}

/// Everything a simulated transaction read and wants to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadWriteSet {
    pub tx_id: TxId,
    pub reads: BTreeMap<String, u64>,
    pub range_reads: Vec<RangeRead>,
    pub writes: BTreeMap<String, Vec<u8>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start simulating a transaction on behalf of `creator`.
    pub fn begin(&self, creator: impl Into<Vec<u8>>) -> TxSimulator<'_> {
        TxSimulator {
            ledger: self,
            tx_id: TxId::new(),
            creator: creator.into(),
            reads: BTreeMap::new(),
            range_reads: Vec::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Validate a read/write set against the current state and apply it.
    ///
    /// All-or-nothing: on conflict nothing is written.
    pub fn commit(&self, rw_set: ReadWriteSet) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;

        for (key, observed) in &rw_set.reads {
            let current = state.get(key).map(|v| v.version).unwrap_or(0);
            ExpectedVersion::Exact(*observed).check(current).map_err(|err| {
                StoreError::Conflict(format!("tx {}: key {key:?}: {err}", rw_set.tx_id))
            })?;
        }

        for range in &rw_set.range_reads {
            let current = versions_with_prefix(&state, &range.prefix);
            if current != range.observed {
                return Err(StoreError::Conflict(format!(
                    "tx {}: range {:?} changed since it was scanned",
                    rw_set.tx_id, range.prefix
                )));
            }
        }

        for (key, value) in rw_set.writes {
            let version = state.get(&key).map(|v| v.version).unwrap_or(0) + 1;
            state.insert(key, VersionedValue { value, version });
        }

        Ok(())
    }

    /// Write directly to committed state, bypassing simulation (fixtures).
    pub fn put_committed(
        &self,
        key: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        let key = key.into();
        let version = state.get(&key).map(|v| v.version).unwrap_or(0) + 1;
        state.insert(
            key,
            VersionedValue {
                value: value.into(),
                version,
            },
        );
        Ok(())
    }

    /// Committed value of `key`, if any.
    pub fn committed(&self, key: &str) -> Option<Vec<u8>> {
        let state = self.state.read().ok()?;
        state.get(key).map(|v| v.value.clone())
    }

    /// Committed version of `key` (`0` = never written).
    pub fn version(&self, key: &str) -> u64 {
        self.state
            .read()
            .ok()
            .and_then(|s| s.get(key).map(|v| v.version))
            .unwrap_or(0)
    }

    /// Number of scan cursors opened but not yet released.
    pub fn open_scans(&self) -> usize {
        self.scans_opened() - self.scans_released()
    }

    pub fn scans_opened(&self) -> usize {
        self.scans.opened.load(Ordering::SeqCst)
    }

    pub fn scans_released(&self) -> usize {
        self.scans.released.load(Ordering::SeqCst)
    }

    fn read(&self, key: &str) -> Result<Option<VersionedValue>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(state.get(key).cloned())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, VersionedValue)>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        Ok(state
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

fn versions_with_prefix(
    state: &BTreeMap<String, VersionedValue>,
    prefix: &str,
) -> Vec<(String, u64)> {
    state
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.version))
        .collect()
}

/// Simulation of one transaction: records reads, buffers writes.
#[derive(Debug)]
pub struct TxSimulator<'l> {
    ledger: &'l InMemoryLedger,
    tx_id: TxId,
    creator: Vec<u8>,
    reads: BTreeMap<String, u64>,
    range_reads: Vec<RangeRead>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl TxSimulator<'_> {
    pub fn into_rw_set(self) -> ReadWriteSet {
        ReadWriteSet {
            tx_id: self.tx_id,
            reads: self.reads,
            range_reads: self.range_reads,
            writes: self.writes,
        }
    }

    /// Validate and apply this transaction's writes.
    pub fn commit(self) -> Result<(), StoreError> {
        let ledger = self.ledger;
        ledger.commit(self.into_rw_set())
    }

    pub fn pending_writes(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.writes
    }
}

impl LedgerStub for TxSimulator<'_> {
    fn tx_id(&self) -> TxId {
        self.tx_id
    }

    fn creator(&self) -> &[u8] {
        &self.creator
    }

    fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let current = self.ledger.read(key)?;
        let version = current.as_ref().map(|v| v.version).unwrap_or(0);
        self.reads.entry(key.to_string()).or_insert(version);
        Ok(current.map(|v| v.value).filter(|v| !v.is_empty()))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("key must not be empty".into()));
        }
        self.writes.insert(key.to_string(), value);
        Ok(())
    }

    fn get_state_by_prefix(&mut self, prefix: &str) -> Result<StateIterator, StoreError> {
        let snapshot = self.ledger.scan(prefix)?;
        self.range_reads.push(RangeRead {
            prefix: prefix.to_string(),
            observed: snapshot.iter().map(|(k, v)| (k.clone(), v.version)).collect(),
        });

        let counters = self.ledger.scans.clone();
        counters.opened.fetch_add(1, Ordering::SeqCst);
        // Empty values read as absent, same as `get_state`.
        let entries = snapshot
            .into_iter()
            .filter(|(_, v)| !v.value.is_empty())
            .map(|(key, v)| Ok(KeyValue { key, value: v.value }));
        Ok(StateIterator::new(entries, move || {
            counters.released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
