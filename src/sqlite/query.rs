use rusqlite::types::Value;

use crate::error::SqlCommandError;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlCommandError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlCommandError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Read every column of a row, in column order.
///
/// # Errors
///
/// Returns `SqlCommandError` if any value cannot be read.
pub fn extract_row_values(
    row: &rusqlite::Row,
    column_count: usize,
) -> Result<Vec<RowValues>, SqlCommandError> {
    let mut values = Vec::with_capacity(column_count);
    for i in 0..column_count {
        values.push(sqlite_extract_value_sync(row, i)?);
    }
    Ok(values)
}
