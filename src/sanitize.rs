//! Display-safety normalization for free-text input
//!
//! Free text is restricted to an allow-listed character set before it is
//! persisted. Out-of-list characters are stripped, not rejected; this is
//! normalization, not validation.

use serde_json::{Map, Value};

fn allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '.' | ',' | '#')
}

/// Strip every character outside the allow-list
/// (ASCII alphanumerics, space, `-`, `.`, `,`, `#`).
pub fn clean_text(input: &str) -> String {
    input.chars().filter(|c| allowed(*c)).collect()
}

/// Clean every string value inside a misc payload, recursing through
/// nested objects and arrays. Keys, numbers, and booleans pass unchanged.
pub fn clean_misc(misc: &Map<String, Value>) -> Map<String, Value> {
    misc.iter()
        .map(|(key, value)| (key.clone(), clean_value(value)))
        .collect()
}

fn clean_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean_text(s)),
        Value::Array(items) => Value::Array(items.iter().map(clean_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), clean_value(value)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_text_keeps_allowed_set() {
        assert_eq!(
            clean_text("disk full - see ticket #42, re-check node3."),
            "disk full - see ticket #42, re-check node3."
        );
    }

    #[test]
    fn test_clean_text_strips_everything_else() {
        assert_eq!(clean_text("drop;<script>='x'</script>"), "dropscriptxscript");
        assert_eq!(clean_text("caf\u{e9} \u{1F600} tab\there"), "caf  tabhere");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_clean_misc_recurses() {
        let misc = json!({
            "host": "node-1;rm -rf",
            "count": 3,
            "tags": ["a!", "b#"],
            "nested": { "path": "/var/log" }
        });
        let cleaned = clean_misc(misc.as_object().unwrap());

        assert_eq!(cleaned["host"], "node-1rm -rf");
        assert_eq!(cleaned["count"], 3);
        assert_eq!(cleaned["tags"], json!(["a", "b#"]));
        assert_eq!(cleaned["nested"]["path"], "varlog");
    }
}
