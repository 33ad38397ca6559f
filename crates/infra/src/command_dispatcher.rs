//! Command execution pipeline (the record state machine).
//!
//! ```text
//! CarCommand
//!   ↓
//! 1. Resolve the caller's organization (only if the policy row needs it)
//!   ↓
//! 2. Authorize against the policy table
//!   ↓
//! 3. Load the full record (assign-maker / supply)
//!   ↓
//! 4. Apply the field change in memory (and the record-dependent rule)
//!   ↓
//! 5. Write the full record back
//! ```
//!
//! Nothing here retries or commits: the stub buffers writes and the hosting
//! runtime decides whether they become visible.

use thiserror::Error;

use carchain_assembly::{AssignMaker, CarCommand, CarRecord, Create, Supply};
use carchain_auth::{AccessPolicy, AccessRequest, AuthzError, IdentityError, IdentityResolver};
use carchain_core::{DomainError, Operation, OrgId, PartKind, Vin};
use carchain_observability::Logger;

use crate::config::ContractConfig;
use crate::ledger::{LedgerStub, StoreError};
use crate::query::{encode_records, query_all};
use crate::record_store::{RecordStore, RecordStoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Structurally invalid request (unsupported part, bad arguments).
    #[error("{0}")]
    InvalidRequest(String),
    /// The caller's organization does not satisfy the policy.
    #[error("{0}")]
    Unauthorized(String),
    /// The caller's organization could not be resolved at all.
    #[error("caller identity could not be resolved: {0}")]
    Unauthenticated(IdentityError),
    /// The referenced car does not exist.
    #[error("car '{0}' does not exist")]
    NotFound(Vin),
    /// A stored record could not be decoded.
    #[error("malformed record: {0}")]
    Malformed(String),
    /// A record could not be encoded.
    #[error("failed to encode: {0}")]
    Encode(String),
    /// The ledger stub failed (get/put/scan or commit-time validation).
    #[error("store failure: {0}")]
    Store(StoreError),
}

impl DispatchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Store(e) if e.is_retryable())
    }
}

impl From<AuthzError> for DispatchError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthorized(msg) => DispatchError::Unauthorized(msg),
            AuthzError::InvalidRequest(msg) => DispatchError::InvalidRequest(msg),
            AuthzError::Unauthenticated(err) => DispatchError::Unauthenticated(err),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                DispatchError::InvalidRequest(msg)
            }
            DomainError::Malformed(msg) => DispatchError::Malformed(msg),
            DomainError::Conflict(msg) => DispatchError::Store(StoreError::Conflict(msg)),
        }
    }
}

impl From<RecordStoreError> for DispatchError {
    fn from(value: RecordStoreError) -> Self {
        match value {
            RecordStoreError::NotFound(vin) => DispatchError::NotFound(vin),
            RecordStoreError::Malformed(msg) => DispatchError::Malformed(msg),
            RecordStoreError::Encode(msg) => DispatchError::Encode(msg),
            RecordStoreError::Store(StoreError::InvalidKey(msg)) => {
                DispatchError::InvalidRequest(msg)
            }
            RecordStoreError::Store(err) => DispatchError::Store(err),
        }
    }
}

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The full record as written back to the stub.
    Written(CarRecord),
    /// Serialized query payload and the number of records in it.
    Listed { count: usize, payload: Vec<u8> },
}

/// Executes car commands against a ledger stub.
///
/// Generic over the identity resolver so authorization can be exercised with
/// synthetic identities.
#[derive(Debug)]
pub struct CommandDispatcher<R> {
    resolver: R,
    policy: AccessPolicy,
    namespace: String,
    logger: Logger,
}

impl<R> CommandDispatcher<R> {
    pub fn new(resolver: R, config: ContractConfig, logger: Logger) -> Self {
        Self {
            resolver,
            policy: config.policy,
            namespace: config.namespace,
            logger,
        }
    }
}

impl<R> CommandDispatcher<R>
where
    R: IdentityResolver,
{
    /// Run one command inside the current transaction.
    ///
    /// On error nothing has been written to the stub, except when the stub
    /// itself failed mid-write; either way the runtime must not commit.
    pub fn dispatch<L>(
        &self,
        stub: &mut L,
        command: CarCommand,
    ) -> Result<DispatchOutcome, DispatchError>
    where
        L: LedgerStub + ?Sized,
    {
        self.logger.scope(|| {
            let operation = command.operation();
            let span = tracing::info_span!(
                "dispatch",
                tx_id = %stub.tx_id(),
                operation = %operation,
                vin = command.vin().map(Vin::as_str).unwrap_or_default(),
            );
            let _entered = span.enter();

            let result = match command {
                CarCommand::Create(cmd) => self.create(stub, cmd),
                CarCommand::AssignMaker(cmd) => self.assign_maker(stub, cmd),
                CarCommand::Supply(cmd) => self.supply(stub, cmd),
                CarCommand::Query => self.query(stub),
            };

            match &result {
                Ok(DispatchOutcome::Written(record)) => {
                    tracing::info!(stage = ?record.stage(), "record written");
                }
                Ok(DispatchOutcome::Listed { count, .. }) => {
                    tracing::info!(count, "records listed");
                }
                Err(err) => tracing::warn!(error = %err, "command rejected"),
            }
            result
        })
    }

    fn resolve_caller<L>(
        &self,
        stub: &L,
        operation: Operation,
    ) -> Result<Option<OrgId>, DispatchError>
    where
        L: LedgerStub + ?Sized,
    {
        if !self.policy.requires_identity(operation) {
            return Ok(None);
        }
        let org = self
            .resolver
            .resolve_organization(stub.creator())
            .map_err(AuthzError::from)?;
        tracing::debug!(org = %org, "caller resolved");
        Ok(Some(org))
    }

    fn authorize(
        &self,
        operation: Operation,
        part: Option<PartKind>,
        caller: Option<&OrgId>,
    ) -> Result<(), DispatchError> {
        self.policy.authorize(&AccessRequest {
            operation,
            part,
            caller,
        })?;
        Ok(())
    }

    fn create<L>(&self, stub: &mut L, cmd: Create) -> Result<DispatchOutcome, DispatchError>
    where
        L: LedgerStub + ?Sized,
    {
        let caller = self.resolve_caller(stub, Operation::Create)?;
        self.authorize(Operation::Create, None, caller.as_ref())?;

        // Blind write: an existing record for this vin is replaced.
        let record = CarRecord::ordered(cmd.vin);
        RecordStore::new(stub, &self.namespace).put(&record)?;
        Ok(DispatchOutcome::Written(record))
    }

    fn assign_maker<L>(
        &self,
        stub: &mut L,
        cmd: AssignMaker,
    ) -> Result<DispatchOutcome, DispatchError>
    where
        L: LedgerStub + ?Sized,
    {
        let caller = self.resolve_caller(stub, Operation::AssignMaker)?;
        self.authorize(Operation::AssignMaker, Some(cmd.part), caller.as_ref())?;

        let mut store = RecordStore::new(stub, &self.namespace);
        let mut record = store.load(&cmd.vin)?;
        record.assign_maker(cmd.part, cmd.maker)?;
        store.put(&record)?;
        Ok(DispatchOutcome::Written(record))
    }

    fn supply<L>(&self, stub: &mut L, cmd: Supply) -> Result<DispatchOutcome, DispatchError>
    where
        L: LedgerStub + ?Sized,
    {
        let caller = self.resolve_caller(stub, Operation::Supply)?;
        self.authorize(Operation::Supply, Some(cmd.part), caller.as_ref())?;
        let caller = caller.ok_or_else(|| {
            DispatchError::Unauthorized("supply requires an authenticated organization".into())
        })?;

        let mut store = RecordStore::new(stub, &self.namespace);
        let mut record = store.load(&cmd.vin)?;
        match cmd.part {
            PartKind::Body => record.supply_body(caller, cmd.id),
            PartKind::Engine => {
                self.policy
                    .authorize_engine_claim(&caller, &record.engine().maker)?;
                record.supply_engine(cmd.id);
            }
        }
        store.put(&record)?;
        Ok(DispatchOutcome::Written(record))
    }

    fn query<L>(&self, stub: &mut L) -> Result<DispatchOutcome, DispatchError>
    where
        L: LedgerStub + ?Sized,
    {
        let caller = self.resolve_caller(stub, Operation::Query)?;
        self.authorize(Operation::Query, None, caller.as_ref())?;

        let records = query_all(stub, &self.namespace)?;
        let payload = encode_records(&records)?;
        Ok(DispatchOutcome::Listed {
            count: records.len(),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use carchain_auth::SyntheticIdentityResolver;
    use carchain_core::TxId;

    use super::*;
    use crate::ledger::{InMemoryLedger, StateIterator};
    use crate::record_store::CAR_NAMESPACE;

    fn dispatcher() -> CommandDispatcher<SyntheticIdentityResolver> {
        CommandDispatcher::new(
            SyntheticIdentityResolver,
            ContractConfig::default(),
            Logger::for_tests(),
        )
    }

    fn create(vin: &str) -> CarCommand {
        CarCommand::Create(Create { vin: Vin::new(vin) })
    }

    fn run(
        ledger: &InMemoryLedger,
        org: &str,
        command: CarCommand,
    ) -> Result<DispatchOutcome, DispatchError> {
        let mut tx = ledger.begin(org.as_bytes().to_vec());
        let outcome = dispatcher().dispatch(&mut tx, command)?;
        tx.commit().map_err(DispatchError::Store)?;
        Ok(outcome)
    }

    fn stored(ledger: &InMemoryLedger, vin: &str) -> CarRecord {
        let mut tx = ledger.begin(Vec::new());
        RecordStore::new(&mut tx, CAR_NAMESPACE)
            .load(&Vin::new(vin))
            .unwrap()
    }

    #[test]
    fn create_needs_no_resolvable_identity() {
        let ledger = InMemoryLedger::new();
        let outcome = run(&ledger, "", create("VIN1")).unwrap();
        assert_eq!(outcome, DispatchOutcome::Written(CarRecord::ordered(Vin::new("VIN1"))));
    }

    #[test]
    fn create_overwrites_existing_record() {
        let ledger = InMemoryLedger::new();
        run(&ledger, "any", create("VIN1")).unwrap();
        run(
            &ledger,
            "factory",
            CarCommand::AssignMaker(AssignMaker {
                vin: Vin::new("VIN1"),
                part: PartKind::Engine,
                maker: OrgId::from("rr"),
            }),
        )
        .unwrap();

        run(&ledger, "any", create("VIN1")).unwrap();
        assert_eq!(stored(&ledger, "VIN1"), CarRecord::ordered(Vin::new("VIN1")));
    }

    #[test]
    fn assign_maker_by_non_factory_is_unauthorized_and_writes_nothing() {
        let ledger = InMemoryLedger::new();
        run(&ledger, "any", create("VIN1")).unwrap();

        let mut tx = ledger.begin(b"gm".to_vec());
        let err = dispatcher()
            .dispatch(
                &mut tx,
                CarCommand::AssignMaker(AssignMaker {
                    vin: Vin::new("VIN1"),
                    part: PartKind::Engine,
                    maker: OrgId::from("gm"),
                }),
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::Unauthorized(_)));
        assert!(tx.pending_writes().is_empty());
    }

    #[test]
    fn assign_maker_on_missing_vin_is_not_found() {
        let ledger = InMemoryLedger::new();
        let err = run(
            &ledger,
            "factory",
            CarCommand::AssignMaker(AssignMaker {
                vin: Vin::new("GHOST"),
                part: PartKind::Engine,
                maker: OrgId::from("rr"),
            }),
        )
        .unwrap_err();
        assert_eq!(err, DispatchError::NotFound(Vin::new("GHOST")));
    }

    #[test]
    fn unresolvable_identity_is_rejected_for_gated_operations() {
        let ledger = InMemoryLedger::new();
        run(&ledger, "any", create("VIN1")).unwrap();

        let err = run(
            &ledger,
            "",
            CarCommand::Supply(Supply {
                vin: Vin::new("VIN1"),
                part: PartKind::Body,
                id: "B1".into(),
            }),
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::Unauthenticated(_)));
        assert_eq!(stored(&ledger, "VIN1").body().id, "");
    }

    #[test]
    fn engine_supply_before_assignment_is_unauthorized() {
        let ledger = InMemoryLedger::new();
        run(&ledger, "any", create("VIN1")).unwrap();

        let err = run(
            &ledger,
            "rr",
            CarCommand::Supply(Supply {
                vin: Vin::new("VIN1"),
                part: PartKind::Engine,
                id: "E1".into(),
            }),
        )
        .unwrap_err();
        assert!(
            matches!(err, DispatchError::Unauthorized(msg) if msg.contains("not been assigned"))
        );
    }

    #[test]
    fn query_lists_latest_state() {
        let ledger = InMemoryLedger::new();
        run(&ledger, "any", create("VIN2")).unwrap();
        run(&ledger, "any", create("VIN1")).unwrap();
        run(
            &ledger,
            "gm.example.com",
            CarCommand::Supply(Supply {
                vin: Vin::new("VIN2"),
                part: PartKind::Body,
                id: "B9".into(),
            }),
        )
        .unwrap();

        let outcome = run(&ledger, "", CarCommand::Query).unwrap();
        let DispatchOutcome::Listed { count, payload } = outcome else {
            panic!("expected a listing");
        };
        assert_eq!(count, 2);
        let records: Vec<CarRecord> = serde_json::from_slice(&payload).unwrap();
        assert_eq!(records[0].vin(), "VIN1");
        assert_eq!(records[1].body().maker, "gm");
        assert_eq!(records[1].body().id, "B9");
    }

    struct FailingStub;

    impl LedgerStub for FailingStub {
        fn tx_id(&self) -> TxId {
            TxId::new()
        }

        fn creator(&self) -> &[u8] {
            b"factory"
        }

        fn get_state(&mut self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            Err(StoreError::Backend("disk on fire".into()))
        }

        fn put_state(&mut self, _key: &str, _value: Vec<u8>) -> Result<(), StoreError> {
            Err(StoreError::Backend("disk on fire".into()))
        }

        fn get_state_by_prefix(&mut self, _prefix: &str) -> Result<StateIterator, StoreError> {
            Err(StoreError::Backend("disk on fire".into()))
        }
    }

    #[test]
    fn store_failures_propagate_verbatim() {
        let dispatcher = dispatcher();
        let expected = DispatchError::Store(StoreError::Backend("disk on fire".into()));

        assert_eq!(dispatcher.dispatch(&mut FailingStub, create("VIN1")).unwrap_err(), expected);
        assert_eq!(dispatcher.dispatch(&mut FailingStub, CarCommand::Query).unwrap_err(), expected);
        let err = dispatcher
            .dispatch(
                &mut FailingStub,
                CarCommand::AssignMaker(AssignMaker {
                    vin: Vin::new("VIN1"),
                    part: PartKind::Engine,
                    maker: OrgId::from("rr"),
                }),
            )
            .unwrap_err();
        assert_eq!(err, expected);
        assert!(!err.is_retryable());
    }
}
