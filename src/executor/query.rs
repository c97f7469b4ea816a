use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection, Rows, Statement};

use crate::error::SqlCommandError;
use crate::mapper::FromRow;
use crate::results::{RowMap, build_column_index};
use crate::sqlite::params::bind_all;
use crate::sqlite::query::extract_row_values;

use super::{CommandState, Executor};

impl Executor {
    /// Resolve the current command against the open connection with its
    /// timeout applied.
    fn begin_current(&mut self) -> Result<(&Connection, &CommandState, String), SqlCommandError> {
        self.sync_command_transaction()?;
        self.ensure_open()?;

        let command = self
            .command
            .as_ref()
            .ok_or(SqlCommandError::CommandNotCreated)?;
        let sql = self.resolve_sql(command)?;
        let timeout = self.effective_timeout(command);
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| SqlCommandError::ConnectionError("connection not open".into()))?;
        conn.busy_timeout(timeout)?;
        tracing::debug!(
            sql = %sql,
            kind = ?command.kind(),
            parameters = command.parameters().len(),
            transaction_id = ?command.transaction_id(),
            "command started"
        );
        Ok((conn, command, sql))
    }

    /// Run the current command as a non-query and return the affected row count.
    ///
    /// Statements are prepared and run one at a time, so a statement may use
    /// objects an earlier one created. Rows a statement returns are read and
    /// discarded. The count covers only changes made by this command, so DDL
    /// reports 0.
    ///
    /// # Errors
    /// Returns `SqlCommandError::CommandNotCreated` without a current command;
    /// database errors pass through unmodified.
    pub fn execute_command(&mut self) -> Result<usize, SqlCommandError> {
        let (conn, command, sql) = self.begin_current()?;
        let before = conn.total_changes();
        let mut batch = Batch::new(conn, &sql);
        let mut statements = 0_usize;
        while let Some(mut stmt) = batch.next()? {
            bind_all(&mut stmt, command.parameters())?;
            run_to_completion(&mut stmt)?;
            statements += 1;
        }
        let delta = conn.total_changes().saturating_sub(before);
        let affected = usize::try_from(delta).unwrap_or(usize::MAX);
        tracing::debug!(statements, affected, "command executed");
        Ok(affected)
    }

    /// Run the current command as a query whose rows materialize as `T`.
    ///
    /// Scalar targets take the first column of each row; record targets are
    /// populated column by column. Rows are read lazily through
    /// [`Query::rows`]. When the command holds several statements, all are
    /// prepared first, the leading ones run to completion here, and the last one
    /// supplies the rows.
    ///
    /// # Errors
    /// Returns `SqlCommandError::CommandNotCreated` without a current command, or
    /// `SqlCommandError::EmptyCommand` if it holds no statement; database errors
    /// pass through unmodified.
    pub fn execute_query<T: FromRow>(&mut self) -> Result<Query<'_, T>, SqlCommandError> {
        let (conn, command, sql) = self.begin_current()?;
        let mut statements = Vec::new();
        let mut batch = Batch::new(conn, &sql);
        while let Some(mut stmt) = batch.next()? {
            bind_all(&mut stmt, command.parameters())?;
            statements.push(stmt);
        }
        let last = statements.pop().ok_or(SqlCommandError::EmptyCommand)?;
        for stmt in &mut statements {
            run_to_completion(stmt)?;
        }
        Ok(Query::new(last))
    }

    /// Run the current command as a query whose rows are column-name keyed maps.
    ///
    /// # Errors
    /// Same as [`Executor::execute_query`].
    pub fn to_array_of_dictionaries(&mut self) -> Result<Query<'_, RowMap>, SqlCommandError> {
        self.execute_query::<RowMap>()
    }
}

fn run_to_completion(stmt: &mut Statement<'_>) -> Result<(), SqlCommandError> {
    let mut rows = stmt.raw_query();
    while rows.next()?.is_some() {}
    Ok(())
}

/// A prepared query with its parameters bound.
///
/// Each call to [`Query::rows`] executes the statement again and returns a
/// single-pass iterator. Dropping that iterator resets the statement, releasing
/// the engine's reader even if iteration stopped early.
pub struct Query<'conn, T> {
    stmt: Statement<'conn>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    _target: PhantomData<fn() -> T>,
}

impl<'conn, T: FromRow> Query<'conn, T> {
    fn new(stmt: Statement<'conn>) -> Self {
        let column_names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let column_index = Arc::new(build_column_index(&column_names));
        Self {
            stmt,
            column_names: Arc::new(column_names),
            column_index,
            _target: PhantomData,
        }
    }

    /// Column names of the result set, in engine order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Execute and iterate the result rows.
    pub fn rows(&mut self) -> RowIter<'_, T> {
        RowIter {
            rows: self.stmt.raw_query(),
            column_names: Arc::clone(&self.column_names),
            column_index: Arc::clone(&self.column_index),
            finished: false,
            _target: PhantomData,
        }
    }

    /// Execute and drain every row into a `Vec`.
    ///
    /// # Errors
    /// Returns the first database or conversion error.
    pub fn collect_all(&mut self) -> Result<Vec<T>, SqlCommandError> {
        self.rows().collect()
    }
}

/// Lazy, single-pass iterator over one execution of a [`Query`].
pub struct RowIter<'stmt, T> {
    rows: Rows<'stmt>,
    column_names: Arc<Vec<String>>,
    column_index: Arc<HashMap<String, usize>>,
    finished: bool,
    _target: PhantomData<fn() -> T>,
}

impl<T: FromRow> Iterator for RowIter<'_, T> {
    type Item = Result<T, SqlCommandError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let values = match self.rows.next() {
            Ok(Some(row)) => extract_row_values(row, self.column_names.len()),
            Ok(None) => {
                self.finished = true;
                return None;
            }
            Err(err) => Err(err.into()),
        };
        let values = match values {
            Ok(values) => values,
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        };
        let row = RowMap::with_index(
            Arc::clone(&self.column_names),
            values,
            Arc::clone(&self.column_index),
        );
        Some(T::from_row(&row))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConnectionOptions;
    use crate::error::SqlCommandError;
    use crate::executor::Executor;
    use crate::parameter::SqlParameter;
    use crate::types::{RowValues, SqlDbType};

    fn seeded() -> Executor {
        let mut exec = Executor::from_options(ConnectionOptions::in_memory());
        exec.set_command_text("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .execute_command()
            .unwrap();
        for (id, name) in [(1, Some("a")), (2, None), (3, Some("c"))] {
            exec.set_command_text("INSERT INTO t (id, name) VALUES (@id, @name)")
                .with_dictionary_parameters([
                    ("id", SqlParameter::new(SqlDbType::Int, id)),
                    ("name", SqlParameter::new(SqlDbType::VarChar, name)),
                ])
                .unwrap()
                .execute_command()
                .unwrap();
        }
        exec
    }

    #[test]
    fn execute_requires_a_command() {
        let mut exec = Executor::from_options(ConnectionOptions::in_memory());
        assert!(matches!(
            exec.execute_command(),
            Err(SqlCommandError::CommandNotCreated)
        ));
        assert!(matches!(
            exec.execute_query::<i64>().err(),
            Some(SqlCommandError::CommandNotCreated)
        ));
        assert!(!exec.is_open());
    }

    #[test]
    fn rows_preserve_engine_order() {
        let mut exec = seeded();
        let ids: Vec<i64> = exec
            .set_command_text("SELECT id FROM t ORDER BY id DESC")
            .execute_query::<i64>()
            .unwrap()
            .collect_all()
            .unwrap();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn dictionaries_keep_null_marker_and_column_order() {
        let mut exec = seeded();
        let mut query = exec
            .set_command_text("SELECT name, id FROM t WHERE id = @id")
            .with_dictionary_parameters([("id", SqlParameter::new(SqlDbType::Int, 2))])
            .unwrap()
            .to_array_of_dictionaries()
            .unwrap();
        assert_eq!(query.column_names(), ["name".to_string(), "id".to_string()]);
        let rows = query.collect_all().unwrap();
        assert_eq!(rows.len(), 1);
        let cols: Vec<&str> = rows[0].iter().map(|(c, _)| c).collect();
        assert_eq!(cols, vec!["name", "id"]);
        assert_eq!(rows[0].get("name"), Some(&RowValues::Null));
        assert_eq!(rows[0].get("id"), Some(&RowValues::Int(2)));
    }

    #[test]
    fn rows_restart_per_call_and_abandoning_releases_reader() {
        let mut exec = seeded();
        let mut query = exec
            .set_command_text("SELECT id FROM t ORDER BY id")
            .execute_query::<i64>()
            .unwrap();
        {
            let mut iter = query.rows();
            assert_eq!(iter.next().unwrap().unwrap(), 1);
        }
        let all = query.collect_all().unwrap();
        assert_eq!(all, vec![1, 2, 3]);
        drop(query);

        // reader released: the table can be written again
        let affected = exec
            .set_command_text("DELETE FROM t")
            .execute_command()
            .unwrap();
        assert_eq!(affected, 3);
    }

    #[test]
    fn conversion_errors_surface_per_row() {
        let mut exec = seeded();
        let results: Vec<Result<i64, SqlCommandError>> = exec
            .set_command_text("SELECT name FROM t ORDER BY id")
            .execute_query::<i64>()
            .unwrap()
            .rows()
            .collect();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(Result::is_err));
    }

    #[test]
    fn database_errors_pass_through() {
        let mut exec = seeded();
        let err = exec
            .set_command_text("SELECT nope FROM missing_table")
            .execute_query::<i64>()
            .err()
            .unwrap();
        assert!(matches!(err, SqlCommandError::SqliteError(_)));
    }

    #[test]
    fn stored_procedure_runs_registered_body() {
        let mut exec = seeded();
        exec.register_procedure("name_by_id", "SELECT name FROM t WHERE id = @id");
        let names: Vec<Option<String>> = exec
            .set_stored_procedure("name_by_id")
            .with_dictionary_parameters([("id", SqlParameter::new(SqlDbType::Int, 3))])
            .unwrap()
            .execute_query::<Option<String>>()
            .unwrap()
            .collect_all()
            .unwrap();
        assert_eq!(names, vec![Some("c".to_string())]);
    }

    #[test]
    fn non_query_counts_only_its_own_changes() {
        let mut exec = seeded();
        let updated = exec
            .set_command_text("UPDATE t SET name = 'y'")
            .execute_command()
            .unwrap();
        assert_eq!(updated, 3);
        let created = exec
            .set_command_text("CREATE TABLE u (a INTEGER)")
            .execute_command()
            .unwrap();
        assert_eq!(created, 0);
    }

    #[test]
    fn row_returning_non_query_is_drained() {
        let mut exec = seeded();
        let selected = exec
            .set_command_text("SELECT id FROM t")
            .execute_command()
            .unwrap();
        assert_eq!(selected, 0);
        let inserted = exec
            .set_command_text("INSERT INTO t (id, name) VALUES (4, 'd') RETURNING id")
            .execute_command()
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[test]
    fn multi_statement_procedure_runs_each_statement() {
        let mut exec = seeded();
        exec.register_procedure(
            "rename_two",
            "UPDATE t SET name = @name WHERE id = 1; UPDATE t SET name = @name WHERE id = 2;",
        );
        let affected = exec
            .set_stored_procedure("rename_two")
            .with_dictionary_parameters([("name", SqlParameter::new(SqlDbType::VarChar, "z"))])
            .unwrap()
            .execute_command()
            .unwrap();
        assert_eq!(affected, 2);

        exec.register_procedure(
            "touch_and_read",
            "UPDATE t SET name = 'w' WHERE id = @id; SELECT name FROM t WHERE id = @id",
        );
        let names: Vec<String> = exec
            .set_stored_procedure("touch_and_read")
            .with_dictionary_parameters([("id", SqlParameter::new(SqlDbType::Int, 3))])
            .unwrap()
            .execute_query::<String>()
            .unwrap()
            .collect_all()
            .unwrap();
        assert_eq!(names, vec!["w".to_string()]);
    }

    #[test]
    fn later_statements_see_earlier_schema_changes() {
        let mut exec = seeded();
        let affected = exec
            .set_command_text("CREATE TABLE x (a INTEGER); INSERT INTO x (a) VALUES (@a);")
            .with_dictionary_parameters([("a", SqlParameter::new(SqlDbType::Int, 5))])
            .unwrap()
            .execute_command()
            .unwrap();
        assert_eq!(affected, 1);
    }

    #[test]
    fn blank_command_has_no_rows_to_query() {
        let mut exec = seeded();
        assert_eq!(exec.set_command_text("  ").execute_command().unwrap(), 0);
        assert!(matches!(
            exec.set_command_text("  ").execute_query::<i64>().err(),
            Some(SqlCommandError::EmptyCommand)
        ));
    }
}
