//! Infrastructure layer: ledger stub boundary, record storage, query, command
//! dispatch and configuration.

pub mod command_dispatcher;
pub mod config;
pub mod ledger;
pub mod query;
pub mod record_store;


pub use command_dispatcher::{CommandDispatcher, DispatchError, DispatchOutcome};
pub use config::ContractConfig;
pub use ledger::{InMemoryLedger, LedgerStub, StoreError};
pub use record_store::{CAR_NAMESPACE, RecordStore, RecordStoreError};
