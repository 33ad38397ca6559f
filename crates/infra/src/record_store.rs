//! Record store adapter: car records over the ledger stub.
//!
//! One entry per vin under a single namespace token. Values are the full JSON
//! record; every mutation is read-full → mutate-in-memory → write-full so the
//! runtime's whole-value versioning sees each change.

use thiserror::Error;

use carchain_assembly::CarRecord;
use carchain_core::{Entity, Vin};

use crate::ledger::{CompositeKey, LedgerStub, StateIterator, StoreError};

/// Namespace token car keys live under unless configured otherwise.
pub const CAR_NAMESPACE: &str = "Car";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    #[error("car '{0}' does not exist")]
    NotFound(Vin),

    #[error("stored record is malformed: {0}")]
    Malformed(String),

    #[error("failed to encode record: {0}")]
    Encode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct RecordStore<'s, L: ?Sized> {
    stub: &'s mut L,
    namespace: &'s str,
}

impl<'s, L> RecordStore<'s, L>
where
    L: LedgerStub + ?Sized,
{
    pub fn new(stub: &'s mut L, namespace: &'s str) -> Self {
        Self { stub, namespace }
    }

    pub fn key_for(&self, vin: &Vin) -> Result<CompositeKey, RecordStoreError> {
        Ok(CompositeKey::new(self.namespace, &[vin.as_str()])?)
    }

    /// Point read; `None` when no record exists for `vin`.
    pub fn get(&mut self, vin: &Vin) -> Result<Option<CarRecord>, RecordStoreError> {
        let key = self.key_for(vin)?;
        match self.stub.get_state(key.as_str())? {
            Some(bytes) => decode_record(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Point read that requires the record to exist.
    pub fn load(&mut self, vin: &Vin) -> Result<CarRecord, RecordStoreError> {
        self.get(vin)?
            .ok_or_else(|| RecordStoreError::NotFound(vin.clone()))
    }

    /// Write the whole record under its vin, replacing whatever was there.
    pub fn put(&mut self, record: &CarRecord) -> Result<(), RecordStoreError> {
        let key = self.key_for(record.id())?;
        let value =
            serde_json::to_vec(record).map_err(|e| RecordStoreError::Encode(e.to_string()))?;
        self.stub.put_state(key.as_str(), value)?;
        Ok(())
    }

    /// Open a cursor over every record in the namespace, in ascending vin order.
    pub fn scan(&mut self) -> Result<RecordScan, RecordStoreError> {
        let prefix = CompositeKey::new(self.namespace, &[])?;
        let cursor = self.stub.get_state_by_prefix(prefix.as_str())?;
        Ok(RecordScan { cursor })
    }
}

/// Decoding cursor over a namespace scan.
///
/// Dropping it (or calling [`RecordScan::close`]) releases the underlying
/// ledger cursor.
#[derive(Debug)]
pub struct RecordScan {
    cursor: StateIterator,
}

impl RecordScan {
    pub fn close(self) {
        self.cursor.close();
    }
}

impl Iterator for RecordScan {
    type Item = Result<CarRecord, RecordStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.cursor.next()?;
        Some(
            entry
                .map_err(RecordStoreError::from)
                .and_then(|kv| decode_record(&kv.value)),
        )
    }
}

fn decode_record(bytes: &[u8]) -> Result<CarRecord, RecordStoreError> {
    let record: CarRecord =
        serde_json::from_slice(bytes).map_err(|e| RecordStoreError::Malformed(e.to_string()))?;
    record
        .check_invariants()
        .map_err(|e| RecordStoreError::Malformed(e.to_string()))?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use carchain_core::{OrgId, PartKind};

    use super::*;
    use crate::ledger::InMemoryLedger;

    #[test]
    fn put_then_get_after_commit() {
        let ledger = InMemoryLedger::new();
        let vin = Vin::new("VIN1");

        let mut tx = ledger.begin("creator");
        let mut store = RecordStore::new(&mut tx, CAR_NAMESPACE);
        assert_eq!(store.get(&vin).unwrap(), None);
        store.put(&CarRecord::ordered(vin.clone())).unwrap();
        tx.commit().unwrap();

        let mut tx = ledger.begin("creator");
        let mut store = RecordStore::new(&mut tx, CAR_NAMESPACE);
        assert_eq!(store.load(&vin).unwrap(), CarRecord::ordered(vin.clone()));

        let key = CompositeKey::new(CAR_NAMESPACE, &["VIN1"]).unwrap();
        let stored: serde_json::Value =
            serde_json::from_slice(&ledger.committed(key.as_str()).unwrap()).unwrap();
        assert_eq!(stored["engine"]["maker"], "");
        assert_eq!(stored["vin"], "VIN1");
    }

    #[test]
    fn load_of_missing_vin_is_not_found() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin("creator");
        let mut store = RecordStore::new(&mut tx, CAR_NAMESPACE);
        let err = store.load(&Vin::new("NOPE")).unwrap_err();
        assert_eq!(err, RecordStoreError::NotFound(Vin::new("NOPE")));
    }

    #[test]
    fn undecodable_value_is_malformed() {
        let ledger = InMemoryLedger::new();
        let key = CompositeKey::new(CAR_NAMESPACE, &["VIN1"]).unwrap();
        ledger.put_committed(key.as_str(), b"{not json".to_vec()).unwrap();

        let mut tx = ledger.begin("creator");
        let mut store = RecordStore::new(&mut tx, CAR_NAMESPACE);
        assert!(matches!(
            store.get(&Vin::new("VIN1")),
            Err(RecordStoreError::Malformed(_))
        ));
    }

    #[test]
    fn vin_with_reserved_character_is_an_invalid_key() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin("creator");
        let mut store = RecordStore::new(&mut tx, CAR_NAMESPACE);
        let err = store.put(&CarRecord::ordered(Vin::new("bad\u{0}vin"))).unwrap_err();
        assert!(matches!(err, RecordStoreError::Store(StoreError::InvalidKey(_))));
    }

    #[test]
    fn scan_ignores_other_namespaces() {
        let ledger = InMemoryLedger::new();
        let mut car = CarRecord::ordered(Vin::new("VIN2"));
        car.assign_maker(PartKind::Engine, OrgId::from("rr")).unwrap();

        let mut tx = ledger.begin("creator");
        {
            let mut cars = RecordStore::new(&mut tx, CAR_NAMESPACE);
            cars.put(&car).unwrap();
            cars.put(&CarRecord::ordered(Vin::new("VIN1"))).unwrap();
        }
        let mut trucks = RecordStore::new(&mut tx, "Truck");
        trucks.put(&CarRecord::ordered(Vin::new("T1"))).unwrap();
        tx.commit().unwrap();

        let mut tx = ledger.begin("creator");
        let mut store = RecordStore::new(&mut tx, CAR_NAMESPACE);
        let vins: Vec<String> = store
            .scan()
            .unwrap()
            .map(|r| r.unwrap().vin().to_string())
            .collect();
        assert_eq!(vins, vec!["VIN1".to_string(), "VIN2".to_string()]);
        assert_eq!(ledger.open_scans(), 0);
    }
}
