//! Best-effort coercion between Rust field types and [`RowValues`].

use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde_json::Value as JsonValue;

use crate::error::SqlCommandError;
use crate::parameter::SqlParameter;
use crate::types::RowValues;

/// A field value as seen by the property mapper.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Plain value; enumerations already converted to their symbolic name
    Value(RowValues),
    /// Parameter descriptor field of a parameters object
    Parameter(SqlParameter),
}

impl PropertyValue {
    #[must_use]
    pub fn as_value(&self) -> Option<&RowValues> {
        match self {
            PropertyValue::Value(v) => Some(v),
            PropertyValue::Parameter(_) => None,
        }
    }
}

/// Read side of a record field.
pub trait IntoProperty {
    fn to_property(&self) -> PropertyValue;
}

/// Write side of a record field.
pub trait FromRowValue: Sized {
    /// Coerce a non-NULL value into `Self`.
    ///
    /// # Errors
    /// Returns `SqlCommandError::ConversionError` when the value has no
    /// representation as `Self`.
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError>;

    /// The value a field of this type takes when the source is NULL.
    ///
    /// # Errors
    /// Returns `SqlCommandError::ConversionError` when the type has no such value.
    fn null_field() -> Result<Self, SqlCommandError>;
}

/// Assign `value` to a field slot, honoring NULL.
///
/// # Errors
/// Propagates the conversion error of the field type.
pub fn assign_field<T: FromRowValue>(slot: &mut T, value: &RowValues) -> Result<(), SqlCommandError> {
    *slot = if value.is_null() {
        T::null_field()?
    } else {
        T::from_row_value(value)?
    };
    Ok(())
}

impl IntoProperty for SqlParameter {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Parameter(self.clone())
    }
}

impl IntoProperty for RowValues {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(self.clone())
    }
}

impl FromRowValue for RowValues {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        Ok(value.clone())
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(RowValues::Null)
    }
}

impl<T: IntoProperty> IntoProperty for Option<T> {
    fn to_property(&self) -> PropertyValue {
        match self {
            Some(inner) => inner.to_property(),
            None => PropertyValue::Value(RowValues::Null),
        }
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_row_value(value).map(Some)
        }
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(None)
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn to_i64(value: &RowValues) -> Result<i64, SqlCommandError> {
    match value {
        RowValues::Int(i) => Ok(*i),
        RowValues::Bool(b) => Ok(i64::from(*b)),
        RowValues::Float(f) => {
            let rounded = f.round();
            if rounded.is_finite() && rounded >= i64::MIN as f64 && rounded <= i64::MAX as f64 {
                Ok(rounded as i64)
            } else {
                Err(SqlCommandError::conversion(value, "i64"))
            }
        }
        RowValues::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| SqlCommandError::conversion(value, "i64")),
        _ => Err(SqlCommandError::conversion(value, "i64")),
    }
}

fn to_f64(value: &RowValues) -> Result<f64, SqlCommandError> {
    match value {
        RowValues::Float(_) | RowValues::Int(_) => value
            .as_float()
            .ok_or_else(|| SqlCommandError::conversion(value, "f64")),
        RowValues::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        RowValues::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| SqlCommandError::conversion(value, "f64")),
        _ => Err(SqlCommandError::conversion(value, "f64")),
    }
}

macro_rules! impl_integer_field {
    ($($ty:ty),*) => {
        $(
            impl IntoProperty for $ty {
                fn to_property(&self) -> PropertyValue {
                    PropertyValue::Value(RowValues::Int(i64::from(*self)))
                }
            }

            impl FromRowValue for $ty {
                fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
                    let wide = to_i64(value)?;
                    <$ty>::try_from(wide)
                        .map_err(|_| SqlCommandError::conversion(value, stringify!($ty)))
                }

                fn null_field() -> Result<Self, SqlCommandError> {
                    Ok(<$ty>::default())
                }
            }
        )*
    };
}

impl_integer_field!(i64, i32, i16, i8, u8, u16, u32);

impl IntoProperty for f64 {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::Float(*self))
    }
}

impl FromRowValue for f64 {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        to_f64(value)
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(0.0)
    }
}

impl IntoProperty for f32 {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::Float(f64::from(*self)))
    }
}

impl FromRowValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        to_f64(value).map(|f| f as f32)
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(0.0)
    }
}

impl IntoProperty for bool {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::Bool(*self))
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        match value {
            RowValues::Bool(b) => Ok(*b),
            RowValues::Int(i) => Ok(*i != 0),
            RowValues::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(SqlCommandError::conversion(value, "bool")),
            },
            _ => Err(SqlCommandError::conversion(value, "bool")),
        }
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(false)
    }
}

impl IntoProperty for String {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::Text(self.clone()))
    }
}

impl IntoProperty for &str {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::Text((*self).to_string()))
    }
}

impl FromRowValue for String {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        if let RowValues::Blob(bytes) = value {
            return String::from_utf8(bytes.clone())
                .map_err(|_| SqlCommandError::conversion(value, "String"));
        }
        value
            .to_text()
            .ok_or_else(|| SqlCommandError::conversion(value, "String"))
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(String::new())
    }
}

impl IntoProperty for NaiveDateTime {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::Timestamp(*self))
    }
}

impl FromRowValue for NaiveDateTime {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        value
            .as_timestamp()
            .ok_or_else(|| SqlCommandError::conversion(value, "NaiveDateTime"))
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(NaiveDateTime::default())
    }
}

impl IntoProperty for NaiveDate {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::Text(self.format("%F").to_string()))
    }
}

impl FromRowValue for NaiveDate {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        if let Some(s) = value.as_text()
            && let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        {
            return Ok(date);
        }
        value
            .as_timestamp()
            .map(|dt| dt.date())
            .ok_or_else(|| SqlCommandError::conversion(value, "NaiveDate"))
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(NaiveDate::default())
    }
}

impl IntoProperty for Vec<u8> {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::Blob(self.clone()))
    }
}

impl FromRowValue for Vec<u8> {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        if let Some(bytes) = value.as_blob() {
            return Ok(bytes.to_vec());
        }
        match value {
            RowValues::Text(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(SqlCommandError::conversion(value, "Vec<u8>")),
        }
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(Vec::new())
    }
}

impl IntoProperty for JsonValue {
    fn to_property(&self) -> PropertyValue {
        PropertyValue::Value(RowValues::JSON(self.clone()))
    }
}

impl FromRowValue for JsonValue {
    fn from_row_value(value: &RowValues) -> Result<Self, SqlCommandError> {
        match value {
            RowValues::JSON(j) => Ok(j.clone()),
            RowValues::Text(s) => {
                Ok(serde_json::from_str(s).unwrap_or_else(|_| JsonValue::String(s.clone())))
            }
            RowValues::Int(i) => Ok(JsonValue::from(*i)),
            RowValues::Float(f) => Ok(JsonValue::from(*f)),
            RowValues::Bool(b) => Ok(JsonValue::Bool(*b)),
            RowValues::Timestamp(dt) => Ok(JsonValue::String(dt.format("%F %T%.f").to_string())),
            RowValues::Null => Ok(JsonValue::Null),
            RowValues::Blob(_) => Err(SqlCommandError::conversion(value, "serde_json::Value")),
        }
    }

    fn null_field() -> Result<Self, SqlCommandError> {
        Ok(JsonValue::Null)
    }
}

/// Symbolic name of an enumerated value, as yielded by the property extractors.
#[must_use]
pub fn enum_to_symbol<E: ValueEnum>(value: &E) -> RowValues {
    match value.to_possible_value() {
        Some(pv) => RowValues::Text(pv.get_name().to_string()),
        None => RowValues::Null,
    }
}

/// Resolve an enumerated value by symbolic name (case-insensitive) or ordinal.
///
/// # Errors
/// Returns `SqlCommandError::ConversionError` if no variant matches.
pub fn enum_from_value<E: ValueEnum>(value: &RowValues, type_name: &str) -> Result<E, SqlCommandError> {
    match value {
        RowValues::Text(s) => E::from_str(s.trim(), true)
            .or_else(|_| {
                s.trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|ordinal| E::value_variants().get(ordinal).cloned())
                    .ok_or(())
            })
            .map_err(|()| SqlCommandError::conversion(value, type_name)),
        RowValues::Int(i) => usize::try_from(*i)
            .ok()
            .and_then(|ordinal| E::value_variants().get(ordinal).cloned())
            .ok_or_else(|| SqlCommandError::conversion(value, type_name)),
        _ => Err(SqlCommandError::conversion(value, type_name)),
    }
}

/// NULL representation of an enumerated field: its first variant.
///
/// # Errors
/// Returns `SqlCommandError::ConversionError` for an enum without variants.
pub fn enum_null_field<E: ValueEnum>(type_name: &str) -> Result<E, SqlCommandError> {
    E::value_variants()
        .first()
        .cloned()
        .ok_or_else(|| SqlCommandError::conversion(&RowValues::Null, type_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_coerce_from_text_bool_and_float() {
        assert_eq!(i32::from_row_value(&RowValues::Text(" 42 ".into())).unwrap(), 42);
        assert_eq!(i64::from_row_value(&RowValues::Bool(true)).unwrap(), 1);
        assert_eq!(i64::from_row_value(&RowValues::Float(3.0)).unwrap(), 3);
        assert!(u8::from_row_value(&RowValues::Int(256)).is_err());
        assert!(i64::from_row_value(&RowValues::Text("abc".into())).is_err());
    }

    #[test]
    fn option_wraps_coerced_primitive() {
        assert_eq!(
            Option::<i32>::from_row_value(&RowValues::Text("7".into())).unwrap(),
            Some(7)
        );
        assert_eq!(Option::<i32>::from_row_value(&RowValues::Null).unwrap(), None);
    }

    #[test]
    fn null_field_is_default_for_primitives() {
        let mut slot = 9_i64;
        assign_field(&mut slot, &RowValues::Null).unwrap();
        assert_eq!(slot, 0);

        let mut text = String::from("x");
        assign_field(&mut text, &RowValues::Null).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn strings_render_numbers() {
        assert_eq!(String::from_row_value(&RowValues::Int(5)).unwrap(), "5");
        assert!(String::from_row_value(&RowValues::Blob(vec![0xff, 0xfe])).is_err());
    }

    #[test]
    fn timestamps_parse_from_text() {
        let dt = NaiveDateTime::from_row_value(&RowValues::Text("2024-01-02 03:04:05".into()))
            .unwrap();
        assert_eq!(dt.format("%F %T").to_string(), "2024-01-02 03:04:05");
        let d = NaiveDate::from_row_value(&RowValues::Text("2024-01-02".into())).unwrap();
        assert_eq!(d.format("%F").to_string(), "2024-01-02");
    }

    #[test]
    fn sql_type_tags_resolve_by_symbol_and_ordinal() {
        use crate::types::SqlDbType;

        let by_name: SqlDbType =
            enum_from_value(&RowValues::Text("varchar".into()), "SqlDbType").unwrap();
        assert_eq!(by_name, SqlDbType::VarChar);
        let by_ordinal: SqlDbType = enum_from_value(&RowValues::Int(0), "SqlDbType").unwrap();
        assert_eq!(by_ordinal, SqlDbType::Char);
        assert_eq!(
            enum_to_symbol(&SqlDbType::NVarChar),
            RowValues::Text("NVarChar".into())
        );
        assert!(enum_from_value::<SqlDbType>(&RowValues::Int(999), "SqlDbType").is_err());
    }
}
