//! Tracing and logging setup, handed to components as an explicit capability.
//!
//! Nothing in this crate installs a process-wide subscriber. Callers build a
//! [`Logger`] once and pass clones of it into each component.

pub mod logger;

pub use logger::Logger;
