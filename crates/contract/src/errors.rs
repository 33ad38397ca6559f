use carchain_infra::command_dispatcher::DispatchError;
use carchain_infra::ledger::StoreError;

use crate::invocation::InvocationError;
use crate::response::{Response, StatusClass};

pub fn dispatch_error_to_response(err: DispatchError) -> Response {
    let message = err.to_string();
    match err {
        DispatchError::InvalidRequest(_)
        | DispatchError::NotFound(_)
        | DispatchError::Malformed(_) => Response::error(StatusClass::ClientError, message),
        DispatchError::Unauthorized(_) | DispatchError::Unauthenticated(_) => {
            Response::error(StatusClass::Unauthorized, message)
        }
        DispatchError::Encode(_) => Response::error(StatusClass::ServerError, message),
        DispatchError::Store(e) => store_error_to_response(e),
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    let status = match err {
        StoreError::InvalidKey(_) => StatusClass::ClientError,
        StoreError::Conflict(_) => StatusClass::Conflict,
        StoreError::Backend(_) => StatusClass::ServerError,
    };
    Response::error(status, err.to_string())
}

pub fn invocation_error_to_response(err: InvocationError) -> Response {
    Response::error(StatusClass::ClientError, err.to_string())
}
