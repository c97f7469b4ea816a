//! Convenient imports for common functionality.

pub use crate::config::{ConnectionOptions, ConnectionOptionsBuilder, ConnectionSettings};
pub use crate::error::SqlCommandError;
pub use crate::executor::{CommandKind, CommandState, Executor, Query, RowIter};
pub use crate::mapper::{
    FromRow, FromRowValue, IntoProperty, PropertyValue, Record, apply_properties,
    extract_properties, extract_property,
};
pub use crate::parameter::{BoundParameter, SqlParameter};
pub use crate::results::RowMap;
pub use crate::types::{RowValues, SqlDbType};
