//! Fluent SQL command building and execution over a single `SQLite` connection.
//!
//! An [`Executor`] owns one lazily opened connection, at most one transaction,
//! and one current command. Parameters are bound from typed descriptors
//! ([`SqlParameter`]), and result rows materialize as scalars, column-keyed
//! [`RowMap`]s, or records mapped through [`mapper::Record`].

pub mod config;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod parameter;
pub mod prelude;
pub mod results;
pub mod types;

mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConnectionOptions, ConnectionOptionsBuilder, ConnectionSettings};
pub use error::SqlCommandError;
pub use executor::{CommandKind, CommandState, DEFAULT_BUSY_TIMEOUT_MS, Executor, Query, RowIter};
pub use parameter::{BoundParameter, SqlParameter};
pub use results::RowMap;
pub use types::{RowValues, SqlDbType};
