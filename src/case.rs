//! Field-name conversion between canonical `snake_case` and view `camelCase`.
//!
//! The rules are applied literally: `to_canonical` prefixes every ASCII
//! upper-case letter with `_` and lower-cases it, `to_view` drops each `_`
//! and upper-cases the character after it. The two are exact inverses on
//! plain lower-camel identifiers. View names containing `_`, and canonical
//! names with a digit after a separator, do not survive the round trip; use
//! [`is_invertible`] to check a name before relying on it.

/// Convert a view field name to its canonical form (`firstName` -> `first_name`).
pub fn to_canonical(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a canonical field name to its view form (`first_name` -> `firstName`).
pub fn to_view(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c != '_' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(next) if is_word_char(next) => out.extend(next.to_uppercase()),
            Some(next) => {
                out.push('_');
                out.push(next);
            }
            // A trailing separator has nothing to capitalize and is kept.
            None => out.push('_'),
        }
    }
    out
}

/// Whether a view name converts to canonical and back unchanged.
pub fn is_invertible(view_name: &str) -> bool {
    to_view(&to_canonical(view_name)) == view_name
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_from_view() {
        assert_eq!(to_canonical("firstName"), "first_name");
        assert_eq!(to_canonical("wprDeskNumber"), "wpr_desk_number");
        assert_eq!(to_canonical("active"), "active");
    }

    #[test]
    fn view_from_canonical() {
        assert_eq!(to_view("first_name"), "firstName");
        assert_eq!(to_view("primary_work_email"), "primaryWorkEmail");
        assert_eq!(to_view("user_id"), "userId");
        assert_eq!(to_view("tags"), "tags");
    }

    #[test]
    fn trailing_separator_is_kept() {
        assert_eq!(to_view("name_"), "name_");
    }

    #[test]
    fn plain_camel_names_are_invertible() {
        for name in ["costCenter", "pgpPublicKeys", "lastModified", "uris"] {
            assert!(is_invertible(name), "{name}");
        }
    }

    #[test]
    fn names_outside_the_rule_are_detected() {
        // "primaryURL" -> "primary_u_r_l" -> "primaryURL" survives, but the
        // canonical "line_2" comes back as "line2".
        assert!(is_invertible("primaryURL"));
        assert_eq!(to_view("line_2"), "line2");
        assert_eq!(to_canonical("line2"), "line2");
        assert!(!is_invertible("first_name"));
        assert!(!is_invertible("wpr_desk"));
    }
}
