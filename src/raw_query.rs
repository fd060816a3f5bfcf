//! Named-parameter SQL
//!
//! `compile_named_query` rewrites `:name` placeholders into positional
//! `$n` ones and collects the values in placeholder order.

use serde_json::Value;
use table_access::{Query, Row};

/// Compile `sql` with `:name` placeholders against `params`.
///
/// Every occurrence takes the next placeholder number, so a name used twice
/// binds twice. A list value expands to one placeholder per element, and an
/// empty list renders a bare `NULL`. Names missing from `params` bind NULL.
/// `::type` casts, quoted literals, quoted identifiers and `--` comments are
/// copied through untouched.
pub fn compile_named_query(sql: &str, params: &Row) -> Query {
    let chars: Vec<char> = sql.chars().collect();
    let mut text = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let end = quoted_end(&chars, i, c);
                text.extend(&chars[i..end]);
                i = end;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                let end = chars[i..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map_or(chars.len(), |offset| i + offset);
                text.extend(&chars[i..end]);
                i = end;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                text.push_str("::");
                i += 2;
            }
            ':' if chars.get(i + 1).is_some_and(|&ch| is_name_start(ch)) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_name_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                push_parameter(&mut text, &mut values, params.get(&name));
                i = end;
            }
            _ => {
                text.push(c);
                i += 1;
            }
        }
    }

    Query::new(text, values)
}

fn push_parameter(text: &mut String, values: &mut Vec<Value>, value: Option<&Value>) {
    match value {
        Some(Value::Array(items)) if items.is_empty() => text.push_str("NULL"),
        Some(Value::Array(items)) => {
            let placeholders: Vec<String> = items
                .iter()
                .map(|item| {
                    values.push(item.clone());
                    format!("${}", values.len())
                })
                .collect();
            text.push_str(&placeholders.join(", "));
        }
        Some(value) => {
            values.push(value.clone());
            text.push_str(&format!("${}", values.len()));
        }
        None => {
            values.push(Value::Null);
            text.push_str(&format!("${}", values.len()));
        }
    }
}

/// Index just past the quoted run opening at `start`; a doubled quote
/// character is an escaped quote.
fn quoted_end(chars: &[char], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn test_named_placeholders_in_order() {
        let query = compile_named_query(
            "SELECT * FROM users WHERE name = :name AND age > :age",
            &params(json!({"age": 30, "name": "ada"})),
        );
        assert_eq!(query.text, "SELECT * FROM users WHERE name = $1 AND age > $2");
        assert_eq!(query.values, vec![json!("ada"), json!(30)]);
    }

    #[test]
    fn test_repeated_name_binds_each_occurrence() {
        let query = compile_named_query(
            "SELECT :v AS a, :v AS b",
            &params(json!({"v": 1})),
        );
        assert_eq!(query.text, "SELECT $1 AS a, $2 AS b");
        assert_eq!(query.values, vec![json!(1), json!(1)]);
    }

    #[test]
    fn test_list_expands() {
        let query = compile_named_query(
            "SELECT * FROM users WHERE id IN (:ids) AND active = :active",
            &params(json!({"ids": [1, 2, 3], "active": true})),
        );
        assert_eq!(
            query.text,
            "SELECT * FROM users WHERE id IN ($1, $2, $3) AND active = $4"
        );
        assert_eq!(query.values, vec![json!(1), json!(2), json!(3), json!(true)]);
    }

    #[test]
    fn test_empty_list_renders_null() {
        let query = compile_named_query(
            "SELECT * FROM users WHERE id IN (:ids)",
            &params(json!({"ids": []})),
        );
        assert_eq!(query.text, "SELECT * FROM users WHERE id IN (NULL)");
        assert!(query.values.is_empty());
    }

    #[test]
    fn test_missing_name_binds_null() {
        let query = compile_named_query("SELECT :missing", &Row::new());
        assert_eq!(query.text, "SELECT $1");
        assert_eq!(query.values, vec![Value::Null]);
    }

    #[test]
    fn test_casts_strings_and_comments_untouched() {
        let query = compile_named_query(
            "SELECT :d::date, ':not_a_param', \"col:x\", 'it''s :x' -- :y\nFROM t WHERE a = :a",
            &params(json!({"d": "2024-01-01", "a": 1})),
        );
        assert_eq!(
            query.text,
            "SELECT $1::date, ':not_a_param', \"col:x\", 'it''s :x' -- :y\nFROM t WHERE a = $2"
        );
        assert_eq!(query.values, vec![json!("2024-01-01"), json!(1)]);
    }

    #[test]
    fn test_colon_without_name_is_kept() {
        let query = compile_named_query("SELECT arr[1:2] FROM t", &Row::new());
        assert_eq!(query.text, "SELECT arr[1:2] FROM t");
        assert!(query.values.is_empty());
    }
}
