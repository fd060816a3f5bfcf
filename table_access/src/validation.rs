//! Identifier validation
//!
//! Schema, table and column names are spliced into SQL text, so every one
//! of them must be a plain PostgreSQL identifier: a letter or underscore
//! followed by letters, digits or underscores. Names that PostgreSQL would
//! misread unquoted (reserved keywords, mixed case) are written in double
//! quotes; everything else is written as is.

use std::fmt;

/// PostgreSQL identifier length limit (NAMEDATALEN - 1)
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Validation errors for database identifiers
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Name contains invalid characters (only alphanumeric and underscore allowed)
    InvalidCharacters(String),
    /// Name is too long
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    /// Name is empty
    Empty,
    /// Name starts with invalid character (must start with letter or underscore)
    InvalidStartCharacter(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidCharacters(name) => {
                write!(f, "Invalid characters in name '{}': only alphanumeric characters and underscores are allowed", name)
            }
            ValidationError::TooLong {
                name,
                length,
                max_length,
            } => {
                write!(
                    f,
                    "Name '{}' is too long: {} bytes (max {})",
                    name, length, max_length
                )
            }
            ValidationError::Empty => {
                write!(f, "Name cannot be empty")
            }
            ValidationError::InvalidStartCharacter(name) => {
                write!(f, "Name '{}' must start with a letter or underscore", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Keywords PostgreSQL reserves outright; these only work quoted.
const RESERVED_KEYWORDS: &[&str] = &[
    "ALL", "ANALYSE", "ANALYZE", "AND", "ANY", "ARRAY", "AS", "ASC", "ASYMMETRIC",
    "BOTH", "CASE", "CAST", "CHECK", "COLLATE", "COLUMN", "CONSTRAINT", "CREATE",
    "CURRENT_CATALOG", "CURRENT_DATE", "CURRENT_ROLE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "CURRENT_USER", "DEFAULT", "DEFERRABLE", "DESC",
    "DISTINCT", "DO", "ELSE", "END", "EXCEPT", "FALSE", "FETCH", "FOR", "FOREIGN",
    "FROM", "GRANT", "GROUP", "HAVING", "IN", "INITIALLY", "INTERSECT", "INTO",
    "LATERAL", "LEADING", "LIMIT", "LOCALTIME", "LOCALTIMESTAMP", "NOT", "NULL",
    "OFFSET", "ON", "ONLY", "OR", "ORDER", "PLACING", "PRIMARY", "REFERENCES",
    "RETURNING", "SELECT", "SESSION_USER", "SOME", "SYMMETRIC", "SYSTEM_USER",
    "TABLE", "THEN", "TO", "TRAILING", "TRUE", "UNION", "UNIQUE", "USER", "USING",
    "VARIADIC", "WHEN", "WHERE", "WINDOW", "WITH",
];

/// Check that `name` is a plain identifier.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length: name.len(),
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }

    let first_char = name.chars().next().ok_or(ValidationError::Empty)?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(ValidationError::InvalidStartCharacter(name.to_string()));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }

    Ok(())
}

pub fn is_valid_identifier(name: &str) -> bool {
    validate_identifier(name).is_ok()
}

/// Validate `name` and render it for SQL text.
///
/// `order` becomes `"order"` and `createdAt` becomes `"createdAt"`;
/// lower-case non-reserved names are left bare.
pub fn sql_identifier(name: &str) -> Result<String, ValidationError> {
    validate_identifier(name)?;
    if needs_quoting(name) {
        Ok(format!("\"{}\"", name))
    } else {
        Ok(name.to_string())
    }
}

fn needs_quoting(name: &str) -> bool {
    is_reserved_keyword(name) || name.chars().any(|c| c.is_ascii_uppercase())
}

fn is_reserved_keyword(name: &str) -> bool {
    RESERVED_KEYWORDS.contains(&name.to_ascii_uppercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        let valid_names = [
            "articles",
            "article_id",
            "ArticleId",
            "_private",
            "col123",
            "a",
            "order",
            &"a".repeat(63),
        ];

        for name in valid_names {
            assert!(
                is_valid_identifier(name),
                "Should accept valid name: {}",
                name
            );
        }
    }

    #[test]
    fn test_invalid_identifiers() {
        let test_cases = [
            ("", ValidationError::Empty),
            (
                "1st",
                ValidationError::InvalidStartCharacter("1st".to_string()),
            ),
            (
                "article-id",
                ValidationError::InvalidCharacters("article-id".to_string()),
            ),
            (
                "id; DROP TABLE articles",
                ValidationError::InvalidCharacters("id; DROP TABLE articles".to_string()),
            ),
            (
                "secured.articles",
                ValidationError::InvalidCharacters("secured.articles".to_string()),
            ),
        ];

        for (name, expected_error) in test_cases {
            assert_eq!(validate_identifier(name), Err(expected_error), "{}", name);
        }
    }

    #[test]
    fn test_too_long_identifier() {
        match validate_identifier(&"a".repeat(64)) {
            Err(ValidationError::TooLong {
                length, max_length, ..
            }) => {
                assert_eq!(length, 64);
                assert_eq!(max_length, 63);
            }
            other => panic!("Expected TooLong error, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_names_stay_bare() {
        // Unreserved in PostgreSQL even though they are type or function names
        for name in ["date", "text", "count", "key", "name", "timestamp", "article_id"] {
            assert_eq!(sql_identifier(name).unwrap(), name);
        }
    }

    #[test]
    fn test_reserved_and_mixed_case_names_are_quoted() {
        assert_eq!(sql_identifier("order").unwrap(), "\"order\"");
        assert_eq!(sql_identifier("USER").unwrap(), "\"USER\"");
        assert_eq!(sql_identifier("createdAt").unwrap(), "\"createdAt\"");
        assert_eq!(
            sql_identifier("order\"; DROP TABLE x; --"),
            Err(ValidationError::InvalidCharacters(
                "order\"; DROP TABLE x; --".to_string()
            ))
        );
    }
}
