use crate::error::SqlCommandError;

use super::Executor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TransactionState {
    pub(crate) id: u64,
}

impl Executor {
    /// Begin a transaction, opening the connection if needed.
    ///
    /// The current command, if any, is associated with the new transaction.
    ///
    /// # Errors
    /// Returns `SqlCommandError::TransactionAlreadyActive` if a transaction is
    /// already open, or the engine's error if `BEGIN` fails.
    pub fn begin_transaction(&mut self) -> Result<&mut Self, SqlCommandError> {
        if let Some(active) = self.transaction {
            return Err(SqlCommandError::TransactionAlreadyActive(active.id));
        }
        self.ensure_open()?.execute_batch("BEGIN")?;

        let id = self.next_transaction_id;
        self.next_transaction_id += 1;
        self.transaction = Some(TransactionState { id });
        if let Some(command) = self.command.as_mut() {
            command.set_transaction(Some(id));
        }
        tracing::info!(transaction_id = id, "transaction started");
        Ok(self)
    }

    /// Commit the active transaction; a no-op when none is active, including
    /// when the engine has already ended it.
    ///
    /// The transaction reference is cleared even if `COMMIT` fails; in that case
    /// the transaction is rolled back before the error is returned.
    ///
    /// # Errors
    /// Returns the engine's error if `COMMIT` fails.
    pub fn commit_transaction(&mut self) -> Result<&mut Self, SqlCommandError> {
        let Some(tx) = self.take_transaction() else {
            return Ok(self);
        };
        let Some(conn) = self.conn.as_ref() else {
            return Ok(self);
        };
        if conn.is_autocommit() {
            tracing::warn!(
                transaction_id = tx.id,
                "transaction already ended by the engine; nothing to commit"
            );
            return Ok(self);
        }
        if let Err(err) = conn.execute_batch("COMMIT") {
            if !conn.is_autocommit() {
                if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                    tracing::warn!(
                        transaction_id = tx.id,
                        error = %rollback_err,
                        "rollback after failed commit failed"
                    );
                }
            }
            tracing::warn!(transaction_id = tx.id, error = %err, "commit failed");
            return Err(err.into());
        }
        tracing::info!(transaction_id = tx.id, "transaction committed");
        Ok(self)
    }

    /// Roll back the active transaction; a no-op when none is active.
    ///
    /// # Errors
    /// Returns the engine's error if `ROLLBACK` fails.
    pub fn rollback_transaction(&mut self) -> Result<&mut Self, SqlCommandError> {
        let Some(tx) = self.take_transaction() else {
            return Ok(self);
        };
        let Some(conn) = self.conn.as_ref() else {
            return Ok(self);
        };
        // the engine may already have rolled back after a failed statement
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        tracing::info!(transaction_id = tx.id, "transaction rolled back");
        Ok(self)
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Id of the active transaction.
    #[must_use]
    pub fn transaction_id(&self) -> Option<u64> {
        self.transaction.map(|tx| tx.id)
    }

    fn take_transaction(&mut self) -> Option<TransactionState> {
        let tx = self.transaction.take()?;
        if let Some(command) = self.command.as_mut() {
            command.set_transaction(None);
        }
        Some(tx)
    }

    /// Bring the current command's association in line with the active transaction.
    pub(crate) fn sync_command_transaction(&mut self) -> Result<(), SqlCommandError> {
        let active = self.transaction_id();
        let command = self.command_mut()?;
        if command.transaction_id() != active {
            tracing::debug!(?active, "command associated with active transaction");
            command.set_transaction(active);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConnectionOptions;
    use crate::error::SqlCommandError;
    use crate::executor::Executor;

    fn exec() -> Executor {
        Executor::from_options(ConnectionOptions::in_memory())
    }

    #[test]
    fn commit_and_rollback_without_transaction_are_noops() {
        let mut exec = exec();
        exec.commit_transaction().unwrap();
        exec.rollback_transaction().unwrap();
        exec.rollback_transaction().unwrap();
        assert!(!exec.in_transaction());
        assert!(!exec.is_open());
    }

    #[test]
    fn begin_opens_connection_and_associates_command() {
        let mut exec = exec();
        exec.set_command_text("SELECT 1");
        exec.begin_transaction().unwrap();
        assert!(exec.is_open());
        let id = exec.transaction_id().unwrap();
        assert_eq!(exec.command().unwrap().transaction_id(), Some(id));

        exec.set_command_text("SELECT 2");
        assert_eq!(exec.command().unwrap().transaction_id(), Some(id));

        exec.commit_transaction().unwrap();
        assert_eq!(exec.command().unwrap().transaction_id(), None);
    }

    #[test]
    fn nested_begin_fails_fast() {
        let mut exec = exec();
        exec.begin_transaction().unwrap();
        let first = exec.transaction_id().unwrap();
        assert!(matches!(
            exec.begin_transaction(),
            Err(SqlCommandError::TransactionAlreadyActive(id)) if id == first
        ));
        assert_eq!(exec.transaction_id(), Some(first));
        exec.rollback_transaction().unwrap();
    }

    #[test]
    fn transaction_ids_increase() {
        let mut exec = exec();
        exec.begin_transaction().unwrap();
        let first = exec.transaction_id().unwrap();
        exec.rollback_transaction().unwrap();
        exec.begin_transaction().unwrap();
        assert!(exec.transaction_id().unwrap() > first);
        exec.commit_transaction().unwrap();
    }

    #[test]
    fn commit_after_engine_ended_transaction_is_noop() {
        let mut exec = exec();
        exec.set_command_text("CREATE TABLE t (id INTEGER)")
            .execute_command()
            .unwrap();
        exec.begin_transaction().unwrap();
        exec.set_command_text("INSERT INTO t (id) VALUES (1)")
            .execute_command()
            .unwrap();
        exec.set_command_text("ROLLBACK").execute_command().unwrap();

        exec.commit_transaction().unwrap();
        assert!(!exec.in_transaction());
        let count: Vec<i64> = exec
            .set_command_text("SELECT COUNT(*) FROM t")
            .execute_query::<i64>()
            .unwrap()
            .collect_all()
            .unwrap();
        assert_eq!(count, vec![0]);
    }
}
