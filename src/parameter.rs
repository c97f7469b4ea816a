//! Parameter descriptors and their bind-time resolution.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::SqlCommandError;
use crate::types::{RowValues, SqlDbType};

static PARAMETER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[@:$]?[A-Za-z_][A-Za-z0-9_]*$").expect("parameter name pattern is valid")
});

/// Immutable description of one bound parameter: type tag, value, and optional size.
///
/// A size of `0` means "unspecified".
/// ```rust
/// use sql_command_builder::prelude::*;
///
/// let p = SqlParameter::new(SqlDbType::VarChar, "new value");
/// assert_eq!(p.sql_type(), SqlDbType::VarChar);
/// assert_eq!(p.size(), 0);
///
/// let sized = SqlParameter::with_size(SqlDbType::NChar, "ab", 10);
/// assert_eq!(sized.size(), 10);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SqlParameter {
    sql_type: SqlDbType,
    value: RowValues,
    size: usize,
}

impl SqlParameter {
    #[must_use]
    pub fn new(sql_type: SqlDbType, value: impl Into<RowValues>) -> Self {
        Self::with_size(sql_type, value, 0)
    }

    #[must_use]
    pub fn with_size(sql_type: SqlDbType, value: impl Into<RowValues>, size: usize) -> Self {
        Self {
            sql_type,
            value: value.into(),
            size,
        }
    }

    /// Descriptor bound as a database NULL of the given type.
    #[must_use]
    pub fn null(sql_type: SqlDbType) -> Self {
        Self::new(sql_type, RowValues::Null)
    }

    #[must_use]
    pub fn sql_type(&self) -> SqlDbType {
        self.sql_type
    }

    #[must_use]
    pub fn value(&self) -> &RowValues {
        &self.value
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

/// A parameter as it is attached to a command after resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    pub name: String,
    pub sql_type: SqlDbType,
    /// Value after coercion to the declared type (and truncation to `size`)
    pub value: RowValues,
    /// Effective size; `None` when the client's default sizing applies
    pub size: Option<usize>,
}

impl BoundParameter {
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

/// Resolve a descriptor into the parameter actually attached to a command.
///
/// Null values bind a NULL of the declared type. An explicit size wins; otherwise
/// character types are sized from the string-converted value.
///
/// # Errors
/// Returns `SqlCommandError::ParameterError` if the name is malformed or the value
/// cannot be represented as the declared type.
pub fn bind_parameter(name: &str, param: &SqlParameter) -> Result<BoundParameter, SqlCommandError> {
    if !PARAMETER_NAME.is_match(name) {
        return Err(SqlCommandError::ParameterError(format!(
            "invalid parameter name `{name}`"
        )));
    }

    if param.value.is_null() {
        return Ok(BoundParameter {
            name: name.to_string(),
            sql_type: param.sql_type,
            value: RowValues::Null,
            size: None,
        });
    }

    let coerced = coerce_to_type(&param.value, param.sql_type).map_err(|e| {
        SqlCommandError::ParameterError(format!("parameter `{name}`: {e}"))
    })?;

    let (value, size) = if param.size > 0 {
        (truncate(coerced, param.size), Some(param.size))
    } else if param.sql_type.is_character() {
        let len = coerced.as_text().map_or(0, |s| s.chars().count());
        (coerced, Some(len))
    } else {
        (coerced, None)
    };

    Ok(BoundParameter {
        name: name.to_string(),
        sql_type: param.sql_type,
        value,
        size,
    })
}

fn truncate(value: RowValues, size: usize) -> RowValues {
    match value {
        RowValues::Text(s) if s.chars().count() > size => {
            RowValues::Text(s.chars().take(size).collect())
        }
        RowValues::Blob(mut b) if b.len() > size => {
            b.truncate(size);
            RowValues::Blob(b)
        }
        other => other,
    }
}

fn coerce_to_type(value: &RowValues, sql_type: SqlDbType) -> Result<RowValues, SqlCommandError> {
    let mismatch = || SqlCommandError::conversion(value, &sql_type.name());

    if sql_type.is_character() {
        return value.to_text().map(RowValues::Text).ok_or_else(mismatch);
    }
    if sql_type.is_binary() {
        if let Some(bytes) = value.as_blob() {
            return Ok(RowValues::Blob(bytes.to_vec()));
        }
        return match value {
            RowValues::Text(s) => Ok(RowValues::Blob(s.as_bytes().to_vec())),
            _ => Err(mismatch()),
        };
    }

    match sql_type {
        SqlDbType::Bit => match value {
            RowValues::Bool(b) => Ok(RowValues::Bool(*b)),
            RowValues::Int(i) => Ok(RowValues::Bool(*i != 0)),
            RowValues::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(RowValues::Bool(true)),
                "0" | "false" => Ok(RowValues::Bool(false)),
                _ => Err(mismatch()),
            },
            _ => Err(mismatch()),
        },
        integral if integral.is_integral() => {
            let i = match value {
                RowValues::Int(i) => *i,
                RowValues::Bool(b) => i64::from(*b),
                RowValues::Text(s) => s.trim().parse::<i64>().map_err(|_| mismatch())?,
                _ => return Err(mismatch()),
            };
            let in_range = match sql_type {
                SqlDbType::TinyInt => u8::try_from(i).is_ok(),
                SqlDbType::SmallInt => i16::try_from(i).is_ok(),
                SqlDbType::Int => i32::try_from(i).is_ok(),
                _ => true,
            };
            if in_range {
                Ok(RowValues::Int(i))
            } else {
                Err(mismatch())
            }
        }
        SqlDbType::Real | SqlDbType::Float | SqlDbType::Decimal | SqlDbType::Money => {
            match value {
                RowValues::Float(_) | RowValues::Int(_) => {
                    value.as_float().map(RowValues::Float).ok_or_else(mismatch)
                }
                RowValues::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(RowValues::Float)
                    .map_err(|_| mismatch()),
                _ => Err(mismatch()),
            }
        }
        SqlDbType::DateTime | SqlDbType::DateTime2 => value
            .as_timestamp()
            .map(RowValues::Timestamp)
            .ok_or_else(mismatch),
        SqlDbType::Date => match value {
            RowValues::Timestamp(dt) => Ok(RowValues::Text(dt.date().format("%F").to_string())),
            RowValues::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(|d| RowValues::Text(d.format("%F").to_string()))
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        SqlDbType::Time => match value {
            RowValues::Timestamp(dt) => Ok(RowValues::Text(dt.time().format("%T%.f").to_string())),
            RowValues::Text(s) => Ok(RowValues::Text(s.clone())),
            _ => Err(mismatch()),
        },
        SqlDbType::UniqueIdentifier => match value {
            RowValues::Text(s) => Ok(RowValues::Text(s.clone())),
            RowValues::Blob(b) if b.len() == 16 => Ok(RowValues::Blob(b.clone())),
            _ => Err(mismatch()),
        },
        SqlDbType::Json => match value {
            RowValues::JSON(j) => Ok(RowValues::JSON(j.clone())),
            RowValues::Text(s) => serde_json::from_str(s)
                .map(RowValues::JSON)
                .map_err(SqlCommandError::from),
            other => Ok(other.clone()),
        },
        // character and binary tags are handled above
        _ => Ok(value.clone()),
    }
}
