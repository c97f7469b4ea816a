//! Test utilities, available to unit tests and behind the `test-utils` feature.

mod test_helpers;

pub use test_helpers::*;

use crate::config::ConnectionOptions;
use crate::executor::Executor;

/// An executor over a private in-memory database.
#[must_use]
pub fn memory_executor() -> Executor {
    Executor::from_options(ConnectionOptions::in_memory())
}

/// An executor over a fresh database file in `dir`.
#[must_use]
pub fn file_executor(dir: &std::path::Path, file_name: &str) -> Executor {
    let path = dir.join(file_name);
    Executor::from_options(ConnectionOptions::new(path.to_string_lossy()))
}
