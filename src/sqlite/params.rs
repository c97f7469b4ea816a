use rusqlite::Statement;
use rusqlite::types::Value;

use crate::error::SqlCommandError;
use crate::parameter::BoundParameter;
use crate::types::RowValues;

const NAME_PREFIXES: [char; 3] = ['@', ':', '$'];

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Find the 1-based index of a named parameter in a prepared statement.
///
/// Names that already carry a prefix are looked up verbatim; bare names are tried
/// as `@name`, `:name`, then `$name`.
///
/// # Errors
/// Returns `SqlCommandError::SqliteError` if rusqlite rejects the lookup.
pub fn parameter_index(stmt: &Statement<'_>, name: &str) -> Result<Option<usize>, SqlCommandError> {
    if name.starts_with(NAME_PREFIXES) {
        return Ok(stmt.parameter_index(name)?);
    }
    for prefix in NAME_PREFIXES {
        if let Some(idx) = stmt.parameter_index(&format!("{prefix}{name}"))? {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

/// Bind every parameter the statement declares; returns how many were bound.
///
/// Parameters the statement does not reference are skipped.
///
/// # Errors
/// Returns `SqlCommandError::SqliteError` if binding fails.
pub fn bind_all(
    stmt: &mut Statement<'_>,
    params: &[BoundParameter],
) -> Result<usize, SqlCommandError> {
    let mut bound = 0;
    for param in params {
        match parameter_index(stmt, &param.name)? {
            Some(idx) => {
                stmt.raw_bind_parameter(idx, row_value_to_sqlite_value(&param.value))?;
                bound += 1;
            }
            None => {
                tracing::debug!(parameter = %param.name, "statement does not reference parameter; skipped");
            }
        }
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn bare_names_resolve_through_prefixes() {
        let conn = Connection::open_in_memory().unwrap();
        let stmt = conn.prepare("SELECT @a, :b, $c").unwrap();
        assert_eq!(parameter_index(&stmt, "a").unwrap(), Some(1));
        assert_eq!(parameter_index(&stmt, "b").unwrap(), Some(2));
        assert_eq!(parameter_index(&stmt, "c").unwrap(), Some(3));
        assert_eq!(parameter_index(&stmt, "@a").unwrap(), Some(1));
        assert_eq!(parameter_index(&stmt, ":a").unwrap(), None);
        assert_eq!(parameter_index(&stmt, "zzz").unwrap(), None);
    }

    #[test]
    fn bools_and_timestamps_use_sqlite_storage() {
        assert_eq!(row_value_to_sqlite_value(&RowValues::Bool(true)), Value::Integer(1));
        let dt = chrono::NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        assert_eq!(
            row_value_to_sqlite_value(&RowValues::Timestamp(dt)),
            Value::Text("2024-05-06 07:08:09".into())
        );
    }
}
