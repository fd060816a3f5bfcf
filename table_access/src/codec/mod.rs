//! Key-case conversion between object and row conventions
//!
//! The codec renames map keys at every nesting level. Values are never
//! touched: list order is kept, scalars pass through, and strings that look
//! like dates stay strings.

use std::fmt;
use std::sync::Arc;

use config::KeyCase;
use serde_json::{Map, Value};
use type_mapping::Row;


/// Rename function applied to every key
pub type KeyTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone, Default)]
pub struct DataCodec {
    to_row: Option<KeyTransform>,
    to_object: Option<KeyTransform>,
}

impl fmt::Debug for DataCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataCodec")
            .field("to_row", &self.to_row.is_some())
            .field("to_object", &self.to_object.is_some())
            .finish()
    }
}

impl DataCodec {
    /// Leaves every key as is
    pub fn identity() -> Self {
        Self::default()
    }

    /// Codec from arbitrary rename functions. They should be inverses of
    /// each other for objects to survive a round trip.
    pub fn new<F, G>(to_row: F, to_object: G) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
        G: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            to_row: Some(Arc::new(to_row)),
            to_object: Some(Arc::new(to_object)),
        }
    }

    /// Codec converting object keys to `row_keys` and row keys to `object_keys`
    pub fn from_key_cases(object_keys: KeyCase, row_keys: KeyCase) -> Self {
        if object_keys == row_keys {
            return Self::identity();
        }
        Self {
            to_row: case_transform(row_keys),
            to_object: case_transform(object_keys),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.to_row.is_none() && self.to_object.is_none()
    }

    pub fn to_row(&self, value: Value) -> Value {
        match &self.to_row {
            Some(transform) => transform_deeply(value, transform.as_ref()),
            None => value,
        }
    }

    pub fn to_object(&self, value: Value) -> Value {
        match &self.to_object {
            Some(transform) => transform_deeply(value, transform.as_ref()),
            None => value,
        }
    }

    pub fn row_from_object(&self, object: Row) -> Row {
        match &self.to_row {
            Some(transform) => transform_map(object, transform.as_ref()),
            None => object,
        }
    }

    pub fn object_from_row(&self, row: Row) -> Row {
        match &self.to_object {
            Some(transform) => transform_map(row, transform.as_ref()),
            None => row,
        }
    }
}

fn case_transform(case: KeyCase) -> Option<KeyTransform> {
    match case {
        KeyCase::Preserve => None,
        KeyCase::SnakeCase => Some(Arc::new(to_snake_case)),
        KeyCase::CamelCase => Some(Arc::new(to_camel_case)),
    }
}

fn transform_deeply(value: Value, transform: &(dyn Fn(&str) -> String + Send + Sync)) -> Value {
    match value {
        Value::Object(map) => Value::Object(transform_map(map, transform)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| transform_deeply(item, transform))
                .collect(),
        ),
        other => other,
    }
}

fn transform_map(map: Row, transform: &(dyn Fn(&str) -> String + Send + Sync)) -> Row {
    let mut renamed = Map::with_capacity(map.len());
    for (key, value) in map {
        renamed.insert(transform(&key), transform_deeply(value, transform));
    }
    renamed
}

/// `articleId` to `article_id`. Runs of capitals are kept together
/// (`HTTPServer` to `http_server`); digits never start a new word.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let starts_word = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if starts_word && !out.ends_with('_') {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// `article_id` to `articleId`. Leading underscores are kept.
pub fn to_camel_case(key: &str) -> String {
    let body = key.trim_start_matches('_');
    let mut out = String::with_capacity(key.len());
    out.push_str(&key[..key.len() - body.len()]);

    let mut upper_next = false;
    for c in body.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn convert_case(key: &str, case: KeyCase) -> String {
    match case {
        KeyCase::Preserve => key.to_string(),
        KeyCase::SnakeCase => to_snake_case(key),
        KeyCase::CamelCase => to_camel_case(key),
    }
}
