//! Input sanitisation and PII redaction.
//!
//! Free-text inputs (user ids, place names) are stripped down to a safe
//! character set before storage. Trace payloads are redacted so that email
//! addresses and phone-like digit runs never reach the audit sink.

use std::sync::LazyLock;

use regex::Regex;

static UNSAFE_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s,.;:/+\-()#]").expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid regex")
});

// At least nine digits with optional separators, so ISO dates (eight
// digits) pass through untouched.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d(?:[\s().\-]?\d){8,}").expect("valid regex"));

/// Strip disallowed characters from free-text input and cap its length.
pub fn sanitize_text(value: &str) -> String {
    let trimmed = value.trim();
    let cleaned = UNSAFE_TEXT_RE.replace_all(trimmed, "");
    cleaned.chars().take(256).collect()
}

/// Replace email addresses and phone-like digit runs with placeholders.
pub fn redact_text(value: &str) -> String {
    let value = EMAIL_RE.replace_all(value, "[email]");
    let value = PHONE_RE.replace_all(&value, "[phone]");
    value.into_owned()
}

/// Recursively redact every string in a JSON value.
pub fn redact_json(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::String(s) => serde_json::Value::String(redact_text(s)),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(redact_json).collect())
        }
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_json(v)))
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
    fn sanitize_strips_unsafe_chars() {
        assert_eq!(sanitize_text("  Par<is>!  "), "Paris");
        assert_eq!(sanitize_text("SFO / CDG"), "SFO / CDG");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "a".repeat(400);
        assert_eq!(sanitize_text(&long).len(), 256);
    }

    #[test]
    fn redact_masks_emails() {
        assert_eq!(
            redact_text("contact alice.smith@example.com please"),
            "contact [email] please"
        );
    }

    #[test]
    fn redact_masks_phone_numbers() {
        assert_eq!(redact_text("call +1 (415) 555-0192"), "call [phone]");
        assert_eq!(redact_text("call 415-555-0192 now"), "call [phone] now");
    }

    #[test]
    fn redact_leaves_plain_text_alone() {
        assert_eq!(redact_text("3 nights in Paris"), "3 nights in Paris");
    }

    #[test]
    fn redact_leaves_iso_dates_alone() {
        assert_eq!(
            redact_text("2030-01-01T10:00:00 to 2030-01-05"),
            "2030-01-01T10:00:00 to 2030-01-05"
        );
    }

    #[test]
    fn redact_json_walks_nested_values() {
        let input = json!({
            "notes": "mail bob@example.org",
            "nested": {"contact": ["+44 20 7946 0958"]},
            "count": 3
        });
        let redacted = redact_json(&input);
        assert_eq!(redacted["notes"], "mail [email]");
        assert_eq!(redacted["nested"]["contact"][0], "[phone]");
        assert_eq!(redacted["count"], 3);
    }
}
