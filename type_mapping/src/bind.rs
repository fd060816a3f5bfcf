//! Binding JSON values as statement parameters
//!
//! PostgreSQL needs a concrete type for every parameter sent over the
//! extended protocol. JSON carries no such type, so the binder infers one
//! from the value shape:
//!
//! - strings bind as `text`, whatever they look like; the statement
//!   text carries a cast where the column needs another type
//!   (see [`text_parameter_cast`](crate::text_parameter_cast))
//! - integers bind as `int4` when they fit and `int8` otherwise; other
//!   numbers as `float8`
//! - homogeneous lists bind as native arrays, mixed lists and objects as `jsonb`
//! - `null` binds untyped so the server infers the column type

use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgArguments, PgTypeInfo, Postgres};
use sqlx::types::Json;

/// A query with positional arguments still being bound
pub type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// SQL NULL sent with the `unknown` pseudo-type.
///
/// A typed `Option::<String>::None` would make `INSERT INTO t (int_col)
/// VALUES ($1)` fail with a type mismatch; `unknown` lets the server
/// resolve the parameter from its context.
#[derive(Debug, Clone, Copy, Default)]
pub struct UntypedNull;

impl sqlx::Type<Postgres> for UntypedNull {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("unknown")
    }
}

impl Encode<'_, Postgres> for UntypedNull {
    fn encode_by_ref(&self, _buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        Ok(IsNull::Yes)
    }
}

/// Bind one JSON value to the next positional parameter.
pub fn bind_json_value<'q>(query: PgQuery<'q>, value: &Value) -> PgQuery<'q> {
    match value {
        Value::String(s) => query.bind(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match i32::try_from(i) {
                    Ok(small) => query.bind(small),
                    Err(_) => query.bind(i),
                }
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::Bool(b) => query.bind(*b),
        Value::Null => query.bind(UntypedNull),
        Value::Array(items) => bind_list(query, items),
        Value::Object(_) => query.bind(Json(value.clone())),
    }
}

fn bind_list<'q>(query: PgQuery<'q>, items: &[Value]) -> PgQuery<'q> {
    if items.is_empty() || items.iter().all(Value::is_string) {
        let strings: Vec<String> = items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect();
        query.bind(strings)
    } else if items.iter().all(Value::is_i64) {
        let integers: Vec<i64> = items.iter().filter_map(Value::as_i64).collect();
        query.bind(integers)
    } else if items.iter().all(Value::is_boolean) {
        let flags: Vec<bool> = items.iter().filter_map(Value::as_bool).collect();
        query.bind(flags)
    } else if items.iter().all(Value::is_number) {
        let floats: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
        query.bind(floats)
    } else {
        tracing::debug!("binding mixed list of {} items as jsonb", items.len());
        query.bind(Json(Value::Array(items.to_vec())))
    }
}
