//! Local stand-in for the hosting runtime.
//!
//! Each submission is simulated against a fresh transaction on an
//! [`InMemoryLedger`] and committed only if the contract succeeded. A
//! commit-time read conflict is reported as a retryable response; it is never
//! retried here.

use carchain_auth::IdentityResolver;
use carchain_infra::ledger::{InMemoryLedger, LedgerStub};
use carchain_observability::Logger;

use crate::contract::CarContract;
use crate::errors::store_error_to_response;
use crate::invocation::Invocation;
use crate::response::Response;

#[derive(Debug)]
pub struct LocalRuntime<R> {
    ledger: InMemoryLedger,
    contract: CarContract<R>,
    logger: Logger,
}

impl<R> LocalRuntime<R>
where
    R: IdentityResolver,
{
    pub fn new(contract: CarContract<R>, logger: Logger) -> Self {
        Self::with_ledger(InMemoryLedger::new(), contract, logger)
    }

    pub fn with_ledger(ledger: InMemoryLedger, contract: CarContract<R>, logger: Logger) -> Self {
        Self {
            ledger,
            contract,
            logger,
        }
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    pub fn contract(&self) -> &CarContract<R> {
        &self.contract
    }

    /// Run the contract's instantiation hook.
    pub fn instantiate(&self, creator: impl Into<Vec<u8>>) -> Response {
        let mut tx = self.ledger.begin(creator);
        let response = self.contract.init(&mut tx);
        if !response.is_success() {
            return response;
        }
        match tx.commit() {
            Ok(()) => response,
            Err(err) => store_error_to_response(err),
        }
    }

    /// Simulate, then commit on success.
    pub fn submit(&self, creator: impl Into<Vec<u8>>, invocation: &Invocation) -> Response {
        let mut tx = self.ledger.begin(creator);
        let tx_id = tx.tx_id();
        let response = self.contract.invoke(&mut tx, invocation);
        if !response.is_success() {
            // Dropping the simulator discards its buffered writes.
            return response;
        }

        match tx.commit() {
            Ok(()) => {
                self.logger
                    .scope(|| tracing::debug!(tx_id = %tx_id, "transaction committed"));
                response
            }
            Err(err) => {
                self.logger.scope(|| {
                    tracing::warn!(tx_id = %tx_id, error = %err, "transaction rejected at commit")
                });
                store_error_to_response(err)
            }
        }
    }

    /// Simulate without committing (read-only evaluation).
    pub fn evaluate(&self, creator: impl Into<Vec<u8>>, invocation: &Invocation) -> Response {
        let mut tx = self.ledger.begin(creator);
        self.contract.invoke(&mut tx, invocation)
    }
}
