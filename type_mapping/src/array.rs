//! PostgreSQL array literal parsing
//!
//! Drivers that hand back arrays in their text form (`{a,b,"c d",NULL}`)
//! are decoded here into lists of optional strings.

/// Parse a one-dimensional array literal.
///
/// Returns `None` when `text` is not wrapped in braces or a quoted element
/// is left open. Unquoted `NULL` becomes `None`; nested arrays are kept as
/// their literal text.
pub fn parse_array_literal(text: &str) -> Option<Vec<Option<String>>> {
    let inner = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut elements = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let element = if chars.peek() == Some(&'"') {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next()? {
                    '\\' => value.push(chars.next()?),
                    '"' => break,
                    c => value.push(c),
                }
            }
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
            Some(value)
        } else {
            let mut value = String::new();
            let mut depth = 0usize;
            while let Some(&c) = chars.peek() {
                if c == ',' && depth == 0 {
                    break;
                }
                match c {
                    '{' => depth += 1,
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
                value.push(c);
                chars.next();
            }
            let trimmed = value.trim();
            if trimmed.eq_ignore_ascii_case("NULL") {
                None
            } else {
                Some(trimmed.to_string())
            }
        };

        elements.push(element);

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return None,
        }
    }

    Some(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn splits_plain_elements() {
        assert_eq!(parse_array_literal("{a,b,c}"), Some(some(&["a", "b", "c"])));
        assert_eq!(parse_array_literal("{1,2,3}"), Some(some(&["1", "2", "3"])));
    }

    #[test]
    fn empty_array_has_no_elements() {
        assert_eq!(parse_array_literal("{}"), Some(Vec::new()));
    }

    #[test]
    fn quoted_elements_keep_commas_and_escapes() {
        assert_eq!(
            parse_array_literal(r#"{"hello, world","say \"hi\"",plain}"#),
            Some(some(&["hello, world", "say \"hi\"", "plain"]))
        );
        assert_eq!(parse_array_literal(r#"{""}"#), Some(some(&[""])));
    }

    #[test]
    fn unquoted_null_is_absent_but_quoted_null_is_text() {
        assert_eq!(
            parse_array_literal(r#"{a,NULL,"NULL"}"#),
            Some(vec![Some("a".to_string()), None, Some("NULL".to_string())])
        );
    }

    #[test]
    fn nested_arrays_stay_literal() {
        assert_eq!(
            parse_array_literal("{{1,2},{3,4}}"),
            Some(some(&["{1,2}", "{3,4}"]))
        );
    }

    #[test]
    fn rejects_non_literals() {
        assert_eq!(parse_array_literal("a,b"), None);
        assert_eq!(parse_array_literal("{\"open}"), None);
        assert_eq!(parse_array_literal("{\"a\"x}"), None);
    }
}
