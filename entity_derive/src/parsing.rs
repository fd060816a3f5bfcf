//! Parsing of `#[entity(...)]` attributes
//!
//! Table and schema names are checked here with the same rules the runtime
//! identifier validation applies, so a bad name fails the build instead of
//! the first query.

use proc_macro2::Span;
use syn::{Attribute, Error, Ident, LitStr, Result};

const DEFAULT_SCHEMA: &str = "public";

#[derive(Debug, PartialEq)]
pub struct EntityInfo {
    pub schema: String,
    pub table: String,
}

pub fn parse_entity_attributes(ident: &Ident, attrs: &[Attribute]) -> Result<EntityInfo> {
    let mut schema: Option<(String, Span)> = None;
    let mut table: Option<(String, Span)> = None;

    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                if table.is_some() {
                    return Err(meta.error("duplicate `table` key"));
                }
                table = Some((value.value(), value.span()));
                Ok(())
            } else if meta.path.is_ident("schema") {
                let value: LitStr = meta.value()?.parse()?;
                if schema.is_some() {
                    return Err(meta.error("duplicate `schema` key"));
                }
                schema = Some((value.value(), value.span()));
                Ok(())
            } else {
                Err(meta.error("unsupported entity key: expected `table` or `schema`"))
            }
        })?;
    }

    let (table, table_span) =
        table.unwrap_or_else(|| (to_snake_case(&ident.to_string()), ident.span()));
    let (schema, schema_span) =
        schema.unwrap_or_else(|| (DEFAULT_SCHEMA.to_string(), Span::call_site()));

    validate_name_syn("table", &table, table_span)?;
    validate_name_syn("schema", &schema, schema_span)?;

    Ok(EntityInfo { schema, table })
}

pub fn validate_name_syn(kind: &str, name: &str, span: Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid {} name '{}': {}", kind, name, e)))
}

fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;

    if name.len() > 63 {
        return Err(format!("{} bytes (max 63)", name.len()));
    }

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err("must start with a letter or underscore".to_string());
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(
            "only alphanumeric characters and underscores are allowed".to_string(),
        );
    }

    Ok(())
}

/// `UserProfile` -> `user_profile`, `HTTPLog` -> `http_log`
fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            if i > 0 && (prev_lower || (prev_upper && next_lower)) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn parse(input: syn::DeriveInput) -> Result<EntityInfo> {
        parse_entity_attributes(&input.ident, &input.attrs)
    }

    #[test]
    fn test_explicit_schema_and_table() {
        let info = parse(parse_quote! {
            #[entity(schema = "secured", table = "articles")]
            struct Article;
        })
        .unwrap();

        assert_eq!(
            info,
            EntityInfo {
                schema: "secured".to_string(),
                table: "articles".to_string()
            }
        );
    }

    #[test]
    fn test_defaults_from_struct_name() {
        let info = parse(parse_quote! {
            struct UserProfile {
                id: i32,
            }
        })
        .unwrap();

        assert_eq!(info.schema, "public");
        assert_eq!(info.table, "user_profile");
    }

    #[test]
    fn test_table_only() {
        let info = parse(parse_quote! {
            #[entity(table = "users")]
            struct Account;
        })
        .unwrap();

        assert_eq!(info.schema, "public");
        assert_eq!(info.table, "users");
    }

    #[test]
    fn test_reserved_table_name_is_accepted() {
        // Quoted when the statement is built
        let info = parse(parse_quote! {
            #[entity(table = "order")]
            struct Order;
        })
        .unwrap();

        assert_eq!(info.table, "order");
    }

    #[test]
    fn test_rejects_table_with_punctuation() {
        let err = parse(parse_quote! {
            #[entity(table = "orders; drop")]
            struct Thing;
        })
        .unwrap_err();

        assert!(err.to_string().contains("Invalid table name 'orders; drop'"));
    }

    #[test]
    fn test_rejects_unknown_key() {
        let err = parse(parse_quote! {
            #[entity(name = "users")]
            struct Thing;
        })
        .unwrap_err();

        assert!(err.to_string().contains("unsupported entity key"));
    }

    #[test]
    fn test_rejects_injection_attempts() {
        for name in [
            "users; DROP TABLE users; --",
            "users' OR '1'='1",
            "",
            "1users",
        ] {
            assert!(
                validate_name_syn("table", name, Span::call_site()).is_err(),
                "accepted {:?}",
                name
            );
        }
    }

    #[test]
    fn test_snake_case_of_struct_names() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("UserProfile"), "user_profile");
        assert_eq!(to_snake_case("HTTPLog"), "http_log");
        assert_eq!(to_snake_case("Order2Item"), "order2_item");
    }
}
