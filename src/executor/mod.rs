//! The command executor: one connection, at most one transaction, one current command.
//!
//! ```rust
//! use sql_command_builder::prelude::*;
//!
//! # fn main() -> Result<(), SqlCommandError> {
//! let mut exec = Executor::from_options(ConnectionOptions::in_memory());
//! exec.set_command_text("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT)")
//!     .execute_command()?;
//!
//! let inserted = exec
//!     .set_command_text("INSERT INTO t (id, v) VALUES (@id, @v)")
//!     .with_dictionary_parameters([
//!         ("id", SqlParameter::new(SqlDbType::Int, 1)),
//!         ("v", SqlParameter::new(SqlDbType::VarChar, "one")),
//!     ])?
//!     .execute_command()?;
//! assert_eq!(inserted, 1);
//!
//! let values: Vec<String> = exec
//!     .set_command_text("SELECT v FROM t")
//!     .execute_query::<String>()?
//!     .collect_all()?;
//! assert_eq!(values, vec!["one".to_string()]);
//!
//! exec.close()
//! # }
//! ```

mod command;
mod query;
mod transaction;

use std::time::Duration;

use rusqlite::Connection;

use crate::config::{ConnectionOptions, ConnectionSettings};
use crate::error::SqlCommandError;

pub use command::{CommandKind, CommandState};
pub use query::{Query, RowIter};

/// Busy timeout used when neither the command nor the options set one.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Fluent command builder and executor over a single `SQLite` connection.
///
/// Not safe for concurrent use; the connection, transaction, and command are
/// owned exclusively. Release with [`Executor::close`]; dropping the executor
/// performs the same release and logs any failure.
pub struct Executor {
    options: ConnectionOptions,
    conn: Option<Connection>,
    command: Option<CommandState>,
    transaction: Option<transaction::TransactionState>,
    next_transaction_id: u64,
}

impl Executor {
    /// Create an executor for the named connection configuration.
    ///
    /// # Errors
    /// Returns `SqlCommandError::ConfigError` if `name` is not configured.
    pub fn new(name: &str, settings: &ConnectionSettings) -> Result<Self, SqlCommandError> {
        let options = settings.get(name)?.clone();
        tracing::debug!(connection = name, db_path = %options.db_path, "executor created");
        Ok(Self::from_options(options))
    }

    #[must_use]
    pub fn from_options(options: ConnectionOptions) -> Self {
        Self {
            options,
            conn: None,
            command: None,
            transaction: None,
            next_transaction_id: 1,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// Register (or replace) a stored procedure body for this executor.
    pub fn register_procedure(
        &mut self,
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> &mut Self {
        self.options.procedures.insert(name.into(), body.into());
        self
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Open the connection if it is not open yet.
    ///
    /// # Errors
    /// Returns `SqlCommandError::SqliteError` if the database cannot be opened.
    pub fn open(&mut self) -> Result<&mut Self, SqlCommandError> {
        self.ensure_open()?;
        Ok(self)
    }

    pub(crate) fn ensure_open(&mut self) -> Result<&Connection, SqlCommandError> {
        if self.conn.is_none() {
            tracing::debug!(db_path = %self.options.db_path, "opening connection");
            let conn = Connection::open(&self.options.db_path)?;
            self.conn = Some(conn);
        }
        self.conn
            .as_ref()
            .ok_or_else(|| SqlCommandError::ConnectionError("connection not open".into()))
    }

    pub(crate) fn effective_timeout(&self, command: &CommandState) -> Duration {
        Duration::from_millis(
            command
                .timeout_ms()
                .or(self.options.busy_timeout_ms)
                .unwrap_or(DEFAULT_BUSY_TIMEOUT_MS),
        )
    }

    /// Release the executor: roll back any active transaction, discard the
    /// command, and close the connection.
    ///
    /// # Errors
    /// Returns the first failure; the remaining resources are still released.
    pub fn close(mut self) -> Result<(), SqlCommandError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), SqlCommandError> {
        let rollback = if self.transaction.is_some() {
            self.rollback_transaction().map(|_| ())
        } else {
            Ok(())
        };
        self.transaction = None;
        self.command = None;

        let closed = match self.conn.take() {
            Some(conn) => {
                tracing::debug!(db_path = %self.options.db_path, "closing connection");
                conn.close().map_err(|(_conn, err)| SqlCommandError::SqliteError(err))
            }
            None => Ok(()),
        };
        rollback.and(closed)
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "executor release failed");
        }
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("db_path", &self.options.db_path)
            .field("open", &self.conn.is_some())
            .field("command", &self.command)
            .field("transaction", &self.transaction)
            .finish()
    }
}
