mod row;

pub use row::RowMap;
pub(crate) use row::build_column_index;
