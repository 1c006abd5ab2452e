//! The `"(key,value)"` text form used for keyed lists by tuple bindings.
//!
//! Plain text is written as is. A side that would be ambiguous (it contains
//! `,`, `(` or `)`, starts with `"`, or reads as a JSON literal such as
//! `null` or `42`) is written as JSON text instead, and non-string values are
//! always JSON. Parsing reverses this exactly.

use serde_json::Value;

/// Render one keyed-list entry.
pub(crate) fn format_tuple(key: &str, value: &Value) -> String {
    format!("({},{})", key_text(key), value_text(value))
}

/// Parse `"(key,value)"` back into an entry. Returns `None` for text that
/// is not a well-formed tuple.
pub(crate) fn parse_tuple(s: &str) -> Option<(String, Value)> {
    let inner = s.strip_prefix('(')?.strip_suffix(')')?;

    let (key, rest) = if inner.starts_with('"') {
        let mut stream = serde_json::Deserializer::from_str(inner).into_iter::<String>();
        let key = stream.next()?.ok()?;
        let rest = inner[stream.byte_offset()..].strip_prefix(',')?;
        (key, rest)
    } else {
        let (key, rest) = inner.split_once(',')?;
        (key.to_string(), rest)
    };

    let value = match serde_json::from_str::<Value>(rest) {
        Ok(value) => value,
        Err(_) if is_plain(rest) => Value::String(rest.to_string()),
        Err(_) => return None,
    };
    Some((key, value))
}

fn key_text(key: &str) -> String {
    if is_plain(key) && !key.starts_with('"') {
        key.to_string()
    } else {
        Value::String(key.to_string()).to_string()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) if is_plain(s) && serde_json::from_str::<Value>(s).is_err() => s.clone(),
        other => other.to_string(),
    }
}

fn is_plain(s: &str) -> bool {
    !s.contains([',', '(', ')'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_text_stays_readable() {
        assert_eq!(format_tuple("work", &json!("+49 30 1234")), "(work,+49 30 1234)");
        assert_eq!(format_tuple("nda", &Value::Null), "(nda,null)");
        assert_eq!(format_tuple("blog", &json!("https://ana.dev")), "(blog,https://ana.dev)");
    }

    #[test]
    fn ambiguous_sides_are_json() {
        assert_eq!(
            format_tuple("work,old", &json!("https://a.example")),
            r#"("work,old",https://a.example)"#
        );
        assert_eq!(format_tuple("note", &json!("null")), r#"(note,"null")"#);
        assert_eq!(format_tuple("count", &json!(3)), "(count,3)");
        assert_eq!(format_tuple("n", &json!("3")), r#"(n,"3")"#);
        assert_eq!(format_tuple("x", &json!("a(b)")), r#"(x,"a(b)")"#);
    }

    #[test]
    fn parses_what_it_formats() {
        let entries = [
            ("work", json!("+49 30 1234")),
            ("work,old", json!("https://a.example")),
            ("(x)", json!("a,b")),
            ("\"quoted\"", json!("\"also\"")),
            ("note", json!("null")),
            ("nda", Value::Null),
            ("count", json!(3)),
            ("flag", json!(true)),
            ("empty", json!("")),
            ("nested", json!({ "a": [1, 2] })),
        ];
        for (key, value) in entries {
            let text = format_tuple(key, &value);
            assert_eq!(parse_tuple(&text), Some((key.to_string(), value)), "{text}");
        }
    }

    #[test]
    fn malformed_tuples_are_rejected() {
        assert_eq!(parse_tuple("blog=https://ana.dev"), None);
        assert_eq!(parse_tuple("(blog)"), None);
        assert_eq!(parse_tuple("(work,old,https://a.example)"), None);
        assert_eq!(parse_tuple(r#"("work,old"https://a.example)"#), None);
    }
}
