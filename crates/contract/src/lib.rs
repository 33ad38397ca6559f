//! Contract surface: invocation parsing, dispatch and response encoding.

pub mod contract;
pub mod errors;
pub mod invocation;
pub mod response;
pub mod runtime;

pub use contract::CarContract;
pub use invocation::{Invocation, InvocationError};
pub use response::{Response, StatusClass};
pub use runtime::LocalRuntime;
