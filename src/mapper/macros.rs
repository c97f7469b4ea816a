/// Implement [`Record`](crate::mapper::Record) for a plain struct.
///
/// Each listed field maps to a column of the same name unless renamed with
/// `field = "Column"`. Unlisted fields are neither extracted nor written.
///
/// The default form also implements [`FromRow`](crate::mapper::FromRow), which
/// needs a `Default` impl and field types implementing
/// [`FromRowValue`](crate::mapper::FromRowValue). The `readonly` form only
/// exposes the fields for reading, which is what a parameters object needs.
///
/// ```rust
/// use sql_command_builder::prelude::*;
/// use sql_command_builder::impl_record;
///
/// #[derive(Debug, Default)]
/// struct Customer {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
///
/// impl_record!(Customer { id, name, email = "EmailAddress" });
///
/// struct CustomerKey {
///     id: SqlParameter,
/// }
///
/// impl_record!(readonly CustomerKey { id });
/// ```
#[macro_export]
macro_rules! impl_record {
    (readonly $ty:ty { $($field:ident $(= $column:literal)?),* $(,)? }) => {
        impl $crate::mapper::Record for $ty {
            $crate::__record_readers!($($field $(= $column)?),*);

            fn apply_property(
                &mut self,
                _name: &str,
                _value: &$crate::RowValues,
            ) -> ::std::result::Result<bool, $crate::SqlCommandError> {
                ::std::result::Result::Ok(false)
            }
        }
    };
    ($ty:ty { $($field:ident $(= $column:literal)?),* $(,)? }) => {
        impl $crate::mapper::Record for $ty {
            $crate::__record_readers!($($field $(= $column)?),*);

            fn apply_property(
                &mut self,
                name: &str,
                value: &$crate::RowValues,
            ) -> ::std::result::Result<bool, $crate::SqlCommandError> {
                $(
                    if name == $crate::__record_column!($field $(, $column)?) {
                        $crate::mapper::assign_field(&mut self.$field, value)?;
                        return ::std::result::Result::Ok(true);
                    }
                )*
                let _ = value;
                ::std::result::Result::Ok(false)
            }
        }

        impl $crate::mapper::FromRow for $ty {
            fn from_row(
                row: &$crate::RowMap,
            ) -> ::std::result::Result<Self, $crate::SqlCommandError> {
                let mut record = <$ty as ::std::default::Default>::default();
                $crate::mapper::apply_properties(&mut record, row.iter())?;
                ::std::result::Result::Ok(record)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_readers {
    ($($field:ident $(= $column:literal)?),*) => {
        fn properties(
            &self,
        ) -> ::std::vec::Vec<(&'static str, $crate::mapper::PropertyValue)> {
            ::std::vec![
                $((
                    $crate::__record_column!($field $(, $column)?),
                    $crate::mapper::IntoProperty::to_property(&self.$field),
                )),*
            ]
        }

        fn property(&self, name: &str) -> ::std::option::Option<$crate::mapper::PropertyValue> {
            $(
                if name == $crate::__record_column!($field $(, $column)?) {
                    return ::std::option::Option::Some(
                        $crate::mapper::IntoProperty::to_property(&self.$field),
                    );
                }
            )*
            let _ = name;
            ::std::option::Option::None
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_column {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $column:literal) => {
        $column
    };
}

/// Map a `clap::ValueEnum` type through the property mapper.
///
/// Extraction yields the variant's symbolic name; assignment accepts the symbolic
/// name (case-insensitive) or the variant's ordinal. A NULL source selects the
/// first variant.
#[macro_export]
macro_rules! impl_value_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::mapper::IntoProperty for $ty {
                fn to_property(&self) -> $crate::mapper::PropertyValue {
                    $crate::mapper::PropertyValue::Value($crate::mapper::enum_to_symbol(self))
                }
            }

            impl $crate::mapper::FromRowValue for $ty {
                fn from_row_value(
                    value: &$crate::RowValues,
                ) -> ::std::result::Result<Self, $crate::SqlCommandError> {
                    $crate::mapper::enum_from_value::<$ty>(value, stringify!($ty))
                }

                fn null_field() -> ::std::result::Result<Self, $crate::SqlCommandError> {
                    $crate::mapper::enum_null_field::<$ty>(stringify!($ty))
                }
            }

            impl $crate::mapper::FromRow for $ty {
                fn from_row(
                    row: &$crate::RowMap,
                ) -> ::std::result::Result<Self, $crate::SqlCommandError> {
                    $crate::mapper::scalar_from_row(row)
                }
            }
        )+
    };
}

macro_rules! impl_scalar_from_row {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::mapper::FromRow for $ty {
                fn from_row(row: &$crate::RowMap) -> Result<Self, $crate::SqlCommandError> {
                    $crate::mapper::scalar_from_row(row)
                }
            }
        )*
    };
}

pub(crate) use impl_scalar_from_row;
