//! Logging capability.
//!
//! A [`Logger`] owns a `tracing` dispatcher. Work that should be logged runs
//! inside [`Logger::scope`], which makes the dispatcher the default only for the
//! duration of the closure.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Explicitly constructed logging capability.
///
/// Cheap to clone; clones share the same subscriber.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
}

impl Logger {
    /// JSON logs on stderr, filtered by `RUST_LOG` (default `info`).
    pub fn from_env() -> Self {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        Self::to_writer(filter, std::io::stderr)
    }

    /// JSON logs + timestamps written to `writer`.
    pub fn to_writer<W>(filter: EnvFilter, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .with_writer(writer)
            .finish();

        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Human-readable logs captured by the libtest harness.
    pub fn for_tests() -> Self {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_test_writer()
            .finish();

        Self {
            dispatch: Dispatch::new(subscriber),
        }
    }

    /// Drops every event.
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Run `f` with this logger as the default `tracing` dispatcher.
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}
