// ============================================================================
// Case Translation
// ============================================================================
//
// Natural keys are camelCase (what domain code writes), storage keys are
// snake_case (what the relational store holds). Every uppercase letter opens
// a new word and digits stay attached to the word before them, so any key
// matching [a-z][a-zA-Z0-9]* survives natural -> storage -> natural intact.
//
// ============================================================================

use crate::core::Record;

fn is_separator(ch: char) -> bool {
    ch == '_' || ch == '-' || ch == ' '
}

/// Converts one key to the storage convention (`fooBar` -> `foo_bar`).
///
/// Keys already in snake_case come back unchanged.
pub fn to_storage_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else if ch == '_' || ch.is_alphanumeric() {
            out.push(ch);
        } else if is_separator(ch) && !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out
}

/// Converts one key to the natural convention (`foo_bar` -> `fooBar`).
///
/// Keys already in camelCase come back unchanged.
pub fn to_natural_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if is_separator(ch) {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Rewrites every key of `record` into the storage convention.
pub fn to_storage_case(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| (to_storage_key(key), value.clone()))
        .collect()
}

/// Rewrites every key of `record` into the natural convention.
pub fn to_natural_case(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| (to_natural_key(key), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_storage_key_conversion() {
        assert_eq!(to_storage_key("fooBar"), "foo_bar");
        assert_eq!(to_storage_key("foo_bar"), "foo_bar");
        assert_eq!(to_storage_key("FooBar"), "foo_bar");
        assert_eq!(to_storage_key("createdAt"), "created_at");
        assert_eq!(to_storage_key("addressLine2"), "address_line2");
        assert_eq!(to_storage_key("foo-bar baz"), "foo_bar_baz");
        assert_eq!(to_storage_key("id"), "id");
    }

    #[test]
    fn test_natural_key_conversion() {
        assert_eq!(to_natural_key("foo_bar"), "fooBar");
        assert_eq!(to_natural_key("fooBar"), "fooBar");
        assert_eq!(to_natural_key("is_deleted"), "isDeleted");
        assert_eq!(to_natural_key("address_line2"), "addressLine2");
        assert_eq!(to_natural_key("id"), "id");
    }

    #[test]
    fn test_record_to_storage_case() {
        assert_eq!(to_storage_case(&record! { "fooBar" => "baz" }), record! { "foo_bar" => "baz" });
        assert_eq!(to_storage_case(&record! { "foo_bar" => "baz" }), record! { "foo_bar" => "baz" });
    }

    #[test]
    fn test_record_to_natural_case() {
        assert_eq!(to_natural_case(&record! { "foo_bar" => "baz" }), record! { "fooBar" => "baz" });
        assert_eq!(to_natural_case(&record! { "fooBar" => "baz" }), record! { "fooBar" => "baz" });
    }

    #[test]
    fn test_round_trip_restores_natural_keys() {
        let keys = [
            "foo", "fooBar", "userID", "aB", "a2B", "line2", "createdAt", "xYZ", "httpStatusCode",
        ];
        for key in keys {
            assert_eq!(to_natural_key(&to_storage_key(key)), key, "key {key}");
        }

        let fields = record! { "fooBar" => 1, "userID" => "u", "isDeleted" => false };
        assert_eq!(to_natural_case(&to_storage_case(&fields)), fields);
    }
}
