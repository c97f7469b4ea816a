use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values bound as parameters or read back from a result row.
///
/// ```rust
/// use sql_command_builder::prelude::*;
///
/// let values = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Null,
/// ];
/// assert!(values[2].is_null());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value; never the same as 0 or an empty string
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.fff"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Textual rendering used when a value is bound to a character parameter.
    ///
    /// Returns `None` for NULL and for binary data.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            RowValues::Int(i) => Some(i.to_string()),
            RowValues::Float(f) => Some(f.to_string()),
            RowValues::Text(s) => Some(s.clone()),
            RowValues::Bool(b) => Some(b.to_string()),
            RowValues::Timestamp(dt) => Some(dt.format("%F %T%.f").to_string()),
            RowValues::JSON(j) => Some(j.to_string()),
            RowValues::Null | RowValues::Blob(_) => None,
        }
    }
}

/// SQL data type tags carried by a [`crate::SqlParameter`].
///
/// Tags parse from their symbolic names (case-insensitive):
/// ```rust
/// use clap::ValueEnum;
/// use sql_command_builder::prelude::*;
///
/// let tag = SqlDbType::from_str("nvarchar", true).unwrap();
/// assert_eq!(tag, SqlDbType::NVarChar);
/// assert!(tag.is_character());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[value(rename_all = "verbatim")]
pub enum SqlDbType {
    Char,
    NChar,
    VarChar,
    NVarChar,
    Text,
    NText,
    Xml,
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Real,
    Float,
    Decimal,
    Money,
    Date,
    Time,
    DateTime,
    DateTime2,
    Binary,
    VarBinary,
    Image,
    UniqueIdentifier,
    Json,
}

impl SqlDbType {
    /// Character types are auto-sized from the bound value when no size is given.
    #[must_use]
    pub fn is_character(self) -> bool {
        matches!(
            self,
            SqlDbType::Char
                | SqlDbType::NChar
                | SqlDbType::VarChar
                | SqlDbType::NVarChar
                | SqlDbType::Text
                | SqlDbType::NText
                | SqlDbType::Xml
        )
    }

    #[must_use]
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            SqlDbType::Binary | SqlDbType::VarBinary | SqlDbType::Image
        )
    }

    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            SqlDbType::Bit
                | SqlDbType::TinyInt
                | SqlDbType::SmallInt
                | SqlDbType::Int
                | SqlDbType::BigInt
        )
    }

    /// Symbolic name of the tag, e.g. `"VarChar"`.
    #[must_use]
    pub fn name(self) -> String {
        self.to_possible_value()
            .map(|pv| pv.get_name().to_string())
            .unwrap_or_else(|| format!("{self:?}"))
    }
}

macro_rules! impl_from_for_row_values {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for RowValues {
                fn from(value: $ty) -> Self {
                    RowValues::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_row_values!(
    i64 => Int,
    i32 => Int,
    i16 => Int,
    u8 => Int,
    u16 => Int,
    u32 => Int,
    f64 => Float,
    f32 => Float,
    bool => Bool,
    String => Text,
    &str => Text,
    NaiveDateTime => Timestamp,
    Vec<u8> => Blob,
    &[u8] => Blob,
    JsonValue => JSON,
);

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}
