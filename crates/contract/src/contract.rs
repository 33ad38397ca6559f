use carchain_auth::{IdentityResolver, X509IdentityResolver};
use carchain_infra::command_dispatcher::{CommandDispatcher, DispatchOutcome};
use carchain_infra::config::ContractConfig;
use carchain_infra::ledger::LedgerStub;
use carchain_observability::Logger;

use crate::errors::{dispatch_error_to_response, invocation_error_to_response};
use crate::invocation::Invocation;
use crate::response::Response;

/// The car contract as seen by the hosting runtime.
///
/// Every call runs against the stub of the current transaction and returns a
/// [`Response`]; whether its writes are committed is up to the runtime.
#[derive(Debug)]
pub struct CarContract<R> {
    dispatcher: CommandDispatcher<R>,
    logger: Logger,
}

impl CarContract<X509IdentityResolver> {
    /// Contract resolving callers from X.509 credentials.
    pub fn with_x509(config: ContractConfig, logger: Logger) -> Self {
        Self::new(X509IdentityResolver::new(logger.clone()), config, logger)
    }
}

impl<R> CarContract<R>
where
    R: IdentityResolver,
{
    pub fn new(resolver: R, config: ContractConfig, logger: Logger) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(resolver, config, logger.clone()),
            logger,
        }
    }

    /// Instantiation hook. There is no state to seed.
    pub fn init<L>(&self, stub: &mut L) -> Response
    where
        L: LedgerStub + ?Sized,
    {
        self.logger
            .scope(|| tracing::info!(tx_id = %stub.tx_id(), "contract instantiated"));
        Response::success()
    }

    pub fn invoke<L>(&self, stub: &mut L, invocation: &Invocation) -> Response
    where
        L: LedgerStub + ?Sized,
    {
        let command = match invocation.parse() {
            Ok(command) => command,
            Err(err) => {
                self.logger.scope(|| {
                    tracing::warn!(
                        tx_id = %stub.tx_id(),
                        function = %invocation.function,
                        error = %err,
                        "invocation rejected"
                    )
                });
                return invocation_error_to_response(err);
            }
        };

        match self.dispatcher.dispatch(stub, command) {
            Ok(DispatchOutcome::Written(_)) => Response::success(),
            Ok(DispatchOutcome::Listed { payload, .. }) => Response::success_with_payload(payload),
            Err(err) => dispatch_error_to_response(err),
        }
    }
}
