//! Entity resolution
//!
//! Everything that can name a table funnels into [`EntityIdentifier`], and
//! [`EntityIdentifier::resolve`] turns it into an [`EntityContext`] with one
//! match.

use serde_json::Value;
use table_access::EntityContext;

use crate::errors::NordicError;

/// Static table coordinates produced by `#[derive(Entity)]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityDescriptor {
    pub schema: &'static str,
    pub table: &'static str,
}

impl EntityDescriptor {
    pub const fn new(schema: &'static str, table: &'static str) -> Self {
        Self { schema, table }
    }
}

/// A type bound to one table
pub trait Entity {
    fn entity() -> EntityDescriptor;
}

#[derive(Debug, Clone)]
pub enum EntityIdentifier {
    /// Table in the default schema
    ByName(String),
    ByQualifiedName { schema: String, table: String },
    ByDescriptor(fn() -> EntityDescriptor),
}

impl EntityIdentifier {
    pub fn of<E: Entity>() -> Self {
        EntityIdentifier::ByDescriptor(E::entity)
    }

    pub fn qualified(schema: impl Into<String>, table: impl Into<String>) -> Self {
        EntityIdentifier::ByQualifiedName {
            schema: schema.into(),
            table: table.into(),
        }
    }

    pub fn resolve(&self) -> Result<EntityContext, NordicError> {
        let (schema, table) = match self {
            EntityIdentifier::ByName(table) => (config::DEFAULT_SCHEMA, table.as_str()),
            EntityIdentifier::ByQualifiedName { schema, table } => {
                (schema.as_str(), table.as_str())
            }
            EntityIdentifier::ByDescriptor(describe) => {
                let descriptor = describe();
                (descriptor.schema, descriptor.table)
            }
        };

        if schema.is_empty() {
            return Err(NordicError::InvalidEntity(format!(
                "empty schema for table '{}'",
                table
            )));
        }
        if table.is_empty() {
            return Err(NordicError::InvalidEntity(format!(
                "empty table name in schema '{}'",
                schema
            )));
        }

        Ok(EntityContext::new(schema, table))
    }
}

/// Descriptor identifiers compare by the coordinates they describe
impl PartialEq for EntityIdentifier {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EntityIdentifier::ByName(a), EntityIdentifier::ByName(b)) => a == b,
            (
                EntityIdentifier::ByQualifiedName { schema: a, table: b },
                EntityIdentifier::ByQualifiedName { schema: c, table: d },
            ) => a == c && b == d,
            (EntityIdentifier::ByDescriptor(a), EntityIdentifier::ByDescriptor(b)) => a() == b(),
            _ => false,
        }
    }
}

impl Eq for EntityIdentifier {}

impl From<&str> for EntityIdentifier {
    fn from(table: &str) -> Self {
        EntityIdentifier::ByName(table.to_string())
    }
}

impl From<String> for EntityIdentifier {
    fn from(table: String) -> Self {
        EntityIdentifier::ByName(table)
    }
}

impl From<EntityContext> for EntityIdentifier {
    fn from(context: EntityContext) -> Self {
        EntityIdentifier::ByQualifiedName {
            schema: context.schema,
            table: context.table,
        }
    }
}

impl From<EntityDescriptor> for EntityIdentifier {
    fn from(descriptor: EntityDescriptor) -> Self {
        EntityIdentifier::ByQualifiedName {
            schema: descriptor.schema.to_string(),
            table: descriptor.table.to_string(),
        }
    }
}

/// Accepts `"table"` or `{"schema": "...", "table": "..."}`; a missing
/// schema key means the default schema.
impl TryFrom<&Value> for EntityIdentifier {
    type Error = NordicError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(table) => Ok(EntityIdentifier::ByName(table.clone())),
            Value::Object(map) => {
                let table = match map.get("table") {
                    Some(Value::String(table)) => table.clone(),
                    _ => {
                        return Err(NordicError::InvalidEntity(format!(
                            "entity object needs a string 'table': {}",
                            value
                        )));
                    }
                };
                let schema = match map.get("schema") {
                    None | Some(Value::Null) => config::DEFAULT_SCHEMA.to_string(),
                    Some(Value::String(schema)) => schema.clone(),
                    Some(other) => {
                        return Err(NordicError::InvalidEntity(format!(
                            "entity schema must be a string, got {}",
                            other
                        )));
                    }
                };
                Ok(EntityIdentifier::ByQualifiedName { schema, table })
            }
            other => Err(NordicError::InvalidEntity(format!(
                "unsupported entity identifier: {}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Article;

    impl Entity for Article {
        fn entity() -> EntityDescriptor {
            EntityDescriptor::new("secured", "articles")
        }
    }

    #[test]
    fn test_resolve_by_name_uses_public() {
        let context = EntityIdentifier::from("users").resolve().unwrap();
        assert_eq!(context, EntityContext::new("public", "users"));
    }

    #[test]
    fn test_resolve_qualified_and_descriptor() {
        let qualified = EntityIdentifier::qualified("secured", "articles")
            .resolve()
            .unwrap();
        let described = EntityIdentifier::of::<Article>().resolve().unwrap();
        assert_eq!(qualified, described);
        assert_eq!(described.to_string(), "secured.articles");
    }

    #[test]
    fn test_empty_names_are_rejected() {
        assert!(matches!(
            EntityIdentifier::from("").resolve(),
            Err(NordicError::InvalidEntity(_))
        ));
        assert!(matches!(
            EntityIdentifier::qualified("", "users").resolve(),
            Err(NordicError::InvalidEntity(_))
        ));
    }

    #[test]
    fn test_from_json_values() {
        let by_name = EntityIdentifier::try_from(&json!("users")).unwrap();
        assert_eq!(by_name, EntityIdentifier::ByName("users".to_string()));

        let qualified =
            EntityIdentifier::try_from(&json!({"schema": "secured", "table": "articles"})).unwrap();
        assert_eq!(qualified, EntityIdentifier::qualified("secured", "articles"));

        let defaulted = EntityIdentifier::try_from(&json!({"table": "users"})).unwrap();
        assert_eq!(
            defaulted.resolve().unwrap(),
            EntityContext::new("public", "users")
        );
    }

    #[test]
    fn test_from_json_rejects_other_shapes() {
        for value in [json!(42), json!(null), json!({"schema": "public"}), json!({"table": 1})] {
            assert!(
                matches!(
                    EntityIdentifier::try_from(&value),
                    Err(NordicError::InvalidEntity(_))
                ),
                "accepted {}",
                value
            );
        }
    }
}
