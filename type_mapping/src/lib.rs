//! Value mapping between JSON documents and PostgreSQL
//! This crate holds the conversion rules shared by the query layer and the driver

pub mod array;
pub mod bind;
pub mod decode;
pub mod sql;
pub mod types;

pub use array::parse_array_literal;
pub use bind::{bind_json_value, PgQuery, UntypedNull};
pub use decode::{describe_columns, row_to_json};
pub use sql::{
    is_array_data_type, text_parameter_cast, value_family, ValueFamily, ARRAY_DATA_TYPE,
};
pub use types::{FieldDescription, Row};
