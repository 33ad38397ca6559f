//! Query engine: the full, unfiltered listing of car records.
//!
//! Visits the namespace in ascending key (= vin) order and serializes the whole
//! sequence. The scan cursor is released once the last entry is consumed, or
//! by drop on any early error return.

use carchain_assembly::CarRecord;

use crate::ledger::LedgerStub;
use crate::record_store::{RecordStore, RecordStoreError};

/// Every record in the namespace, in scan order.
pub fn query_all<L>(stub: &mut L, namespace: &str) -> Result<Vec<CarRecord>, RecordStoreError>
where
    L: LedgerStub + ?Sized,
{
    let mut store = RecordStore::new(stub, namespace);
    let mut scan = store.scan()?;

    let mut records = Vec::new();
    for record in scan.by_ref() {
        records.push(record?);
    }
    scan.close();

    Ok(records)
}

/// JSON array payload for a query response.
pub fn encode_records(records: &[CarRecord]) -> Result<Vec<u8>, RecordStoreError> {
    serde_json::to_vec(records).map_err(|e| RecordStoreError::Encode(e.to_string()))
}
