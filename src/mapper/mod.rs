//! Property mapping between named-field records and name -> value tables.
//!
//! Types opt in through [`Record`], normally generated with [`impl_record!`](crate::impl_record).
//! The executor uses the read side to turn a parameters object into named
//! bindings and the write side to populate result objects from rows.

mod convert;
mod macros;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::error::SqlCommandError;
use crate::results::RowMap;
use crate::types::{RowValues, SqlDbType};

pub use convert::{
    FromRowValue, IntoProperty, PropertyValue, assign_field, enum_from_value, enum_null_field,
    enum_to_symbol,
};
use macros::impl_scalar_from_row;

/// Per-type adapter exposing a record's named fields.
pub trait Record {
    /// Every readable field, in declaration order.
    fn properties(&self) -> Vec<(&'static str, PropertyValue)>;

    /// Single readable field, `None` if the record has no such field.
    fn property(&self, name: &str) -> Option<PropertyValue> {
        self.properties()
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// Write one field; `Ok(false)` when no writable field has that name.
    ///
    /// # Errors
    /// Returns `SqlCommandError::ConversionError` if the value cannot be coerced
    /// to the field's type.
    fn apply_property(&mut self, name: &str, value: &RowValues) -> Result<bool, SqlCommandError>;
}

/// Construct a value from one result row.
pub trait FromRow: Sized {
    /// # Errors
    /// Returns `SqlCommandError::ConversionError` if the row cannot be converted.
    fn from_row(row: &RowMap) -> Result<Self, SqlCommandError>;
}

/// Enumerate a record's readable fields.
#[must_use]
pub fn extract_properties<R: Record + ?Sized>(record: &R) -> Vec<(&'static str, PropertyValue)> {
    record.properties()
}

/// Look up a single readable field.
#[must_use]
pub fn extract_property<R: Record + ?Sized>(record: &R, name: &str) -> Option<PropertyValue> {
    record.property(name)
}

/// Write every entry whose name matches a writable field; other entries are skipped.
///
/// # Errors
/// Returns the first coercion failure; fields applied before it keep their new values.
pub fn apply_properties<'a, R, I>(record: &mut R, values: I) -> Result<(), SqlCommandError>
where
    R: Record + ?Sized,
    I: IntoIterator<Item = (&'a str, &'a RowValues)>,
{
    for (name, value) in values {
        if !record.apply_property(name, value)? {
            tracing::trace!(column = name, "no writable field; skipped");
        }
    }
    Ok(())
}

/// Materialize a row into a scalar from its first column.
///
/// # Errors
/// Returns `SqlCommandError::ConversionError` if the row has no columns or the
/// first value cannot be converted.
pub fn scalar_from_row<T: FromRowValue>(row: &RowMap) -> Result<T, SqlCommandError> {
    let value = row.first().ok_or_else(|| {
        SqlCommandError::ConversionError("row has no columns to convert".to_string())
    })?;
    T::from_row_value(value)
}

impl FromRow for RowMap {
    fn from_row(row: &RowMap) -> Result<Self, SqlCommandError> {
        Ok(row.clone())
    }
}

impl<T: FromRowValue> FromRow for Option<T> {
    fn from_row(row: &RowMap) -> Result<Self, SqlCommandError> {
        scalar_from_row(row)
    }
}

impl_scalar_from_row!(
    i64,
    i32,
    i16,
    i8,
    u8,
    u16,
    u32,
    f64,
    f32,
    bool,
    String,
    NaiveDateTime,
    NaiveDate,
    Vec<u8>,
    JsonValue,
    RowValues,
);

crate::impl_value_enum!(SqlDbType);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_row;
    use clap::ValueEnum;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    #[value(rename_all = "verbatim")]
    enum Status {
        Active,
        Suspended,
    }

    crate::impl_value_enum!(Status);

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
    #[value(rename_all = "verbatim")]
    enum Tier {
        #[default]
        Standard,
        Premium,
    }

    crate::impl_value_enum!(Tier);

    #[derive(Debug, Default, PartialEq)]
    struct Account {
        id: i64,
        name: String,
        balance: Option<f64>,
        status: Option<Status>,
        kind: Tier,
    }

    crate::impl_record!(Account { id, name = "Name", balance, status, kind });

    fn account() -> Account {
        Account {
            id: 7,
            name: "ann".into(),
            balance: None,
            status: Some(Status::Suspended),
            kind: Tier::Premium,
        }
    }

    #[test]
    fn extract_yields_names_in_order_with_enums_stringified() {
        let props = extract_properties(&account());
        let names: Vec<&str> = props.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["id", "Name", "balance", "status", "kind"]);
        assert_eq!(
            props[3].1,
            PropertyValue::Value(RowValues::Text("Suspended".into()))
        );
        assert_eq!(props[2].1, PropertyValue::Value(RowValues::Null));
    }

    #[test]
    fn extract_single_property() {
        let acct = account();
        assert_eq!(
            extract_property(&acct, "Name"),
            Some(PropertyValue::Value(RowValues::Text("ann".into())))
        );
        assert_eq!(extract_property(&acct, "name"), None);
        assert_eq!(extract_property(&acct, "missing"), None);
    }

    #[test]
    fn apply_coerces_and_skips_unknown_columns() {
        let row = create_test_row(
            vec![
                "id".into(),
                "Name".into(),
                "balance".into(),
                "status".into(),
                "kind".into(),
                "unused".into(),
            ],
            vec![
                RowValues::Text("12".into()),
                RowValues::Text("bob".into()),
                RowValues::Int(40),
                RowValues::Text("active".into()),
                RowValues::Int(1),
                RowValues::Text("ignored".into()),
            ],
        );
        let acct = Account::from_row(&row).unwrap();
        assert_eq!(
            acct,
            Account {
                id: 12,
                name: "bob".into(),
                balance: Some(40.0),
                status: Some(Status::Active),
                kind: Tier::Premium,
            }
        );
    }

    #[test]
    fn apply_null_writes_null_representation() {
        let mut acct = account();
        let row = create_test_row(
            vec!["status".into(), "id".into(), "kind".into()],
            vec![RowValues::Null, RowValues::Null, RowValues::Null],
        );
        apply_properties(&mut acct, row.iter()).unwrap();
        assert_eq!(acct.status, None);
        assert_eq!(acct.id, 0);
        assert_eq!(acct.kind, Tier::Standard);
    }

    #[test]
    fn apply_reports_conversion_failure() {
        let mut acct = account();
        let row = create_test_row(vec!["id".into()], vec![RowValues::Text("x".into())]);
        let err = apply_properties(&mut acct, row.iter()).unwrap_err();
        assert!(matches!(err, SqlCommandError::ConversionError(_)));
    }

    #[test]
    fn scalars_read_first_column() {
        let row = create_test_row(
            vec!["n".into(), "other".into()],
            vec![RowValues::Text("5".into()), RowValues::Int(9)],
        );
        assert_eq!(i32::from_row(&row).unwrap(), 5);
        assert_eq!(String::from_row(&row).unwrap(), "5");

        let null_row = create_test_row(vec!["n".into()], vec![RowValues::Null]);
        assert_eq!(Option::<i64>::from_row(&null_row).unwrap(), None);
        assert!(i64::from_row(&null_row).is_err());

        let empty = create_test_row(vec![], vec![]);
        assert!(i64::from_row(&empty).is_err());
    }

    #[test]
    fn sql_type_tags_materialize_as_scalars() {
        let row = create_test_row(vec!["t".into()], vec![RowValues::Text("BigInt".into())]);
        assert_eq!(SqlDbType::from_row(&row).unwrap(), SqlDbType::BigInt);
    }
}
