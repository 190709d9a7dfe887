//! Context payload assembly helpers.

use std::collections::HashMap;

/// A scalar value inside a context payload.
///
/// Snowplow schemas distinguish string and integer fields, so payloads carry
/// typed scalars rather than stringified values.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
}

/// One self-describing context attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct EventContext {
    /// Full `iglu:` schema URI.
    pub schema: String,
    pub payload: HashMap<String, ScalarValue>,
}

/// Builds an `iglu:` schema URI for the given vendor namespace.
pub(crate) fn schema_uri(vendor: &str, path: &str) -> String {
    format!("iglu:{vendor}/{path}")
}

/// Parses a flat string-to-string blob in either of its stored shapes.
///
/// Device snapshots written by current SDK versions are JSON objects; older
/// installs stored the `{key=value, key=value}` rendering of a platform map
/// instead. Non-scalar JSON values and unparseable input yield an empty map
/// rather than an error.
pub(crate) fn parse_flat_blob(raw: &str) -> HashMap<String, String> {
    let raw = raw.trim();
    if let Ok(serde_json::Value::Object(object)) = serde_json::from_str(raw) {
        return object
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                serde_json::Value::Number(n) => Some((key, n.to_string())),
                serde_json::Value::Bool(b) => Some((key, b.to_string())),
                _ => None,
            })
            .collect();
    }

    let Some(inner) = raw
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
    else {
        return HashMap::new();
    };

    let mut entries = HashMap::new();
    let mut depth = 0u32;
    let mut start = 0;
    let bytes = inner.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' | b'[' | b'(' => depth += 1,
            b'}' | b']' | b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                push_pair(&mut entries, &inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_pair(&mut entries, &inner[start..]);
    entries
}

fn push_pair(entries: &mut HashMap<String, String>, pair: &str) {
    if let Some((key, value)) = pair.split_once('=') {
        let key = key.trim();
        if !key.is_empty() {
            entries.insert(key.to_string(), value.trim().to_string());
        }
    }
}

/// Normalizes a phone number for analytics: strips the `+91` country prefix
/// and every non-digit character.
pub(crate) fn normalize_phone(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.strip_prefix("+91").unwrap_or(raw);
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Strips the Shopify GID prefix from a cart id, leaving the bare token.
pub(crate) fn trim_cart_id(raw: &str) -> String {
    raw.trim()
        .strip_prefix("gid://shopify/Cart/")
        .unwrap_or(raw.trim())
        .to_string()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_parse_json_blob() {
        let parsed = parse_flat_blob(
            r#"{"gk-device-model":"Pixel 8","gk-app-version-code":142,"rooted":false}"#,
        );
        assert_eq!(
            parsed.get("gk-device-model").map(String::as_str),
            Some("Pixel 8")
        );
        assert_eq!(
            parsed.get("gk-app-version-code").map(String::as_str),
            Some("142")
        );
        assert_eq!(parsed.get("rooted").map(String::as_str), Some("false"));
    }

    #[test]
    fn test_parse_legacy_map_rendering() {
        let parsed = parse_flat_blob(
            "{gk-device-model=Pixel 8, gk-screen-resolution=1080x2400, gk-carrier-info=Acme (prepaid, 4G)}",
        );
        assert_eq!(
            parsed.get("gk-device-model").map(String::as_str),
            Some("Pixel 8")
        );
        assert_eq!(
            parsed.get("gk-screen-resolution").map(String::as_str),
            Some("1080x2400")
        );
        // Commas inside parentheses must not split the entry.
        assert_eq!(
            parsed.get("gk-carrier-info").map(String::as_str),
            Some("Acme (prepaid, 4G)")
        );
    }

    #[test_case(""; "empty input")]
    #[test_case("not a map"; "unstructured input")]
    #[test_case("[1,2,3]"; "json array")]
    fn test_unparseable_blob_yields_empty_map(raw: &str) {
        assert!(parse_flat_blob(raw).is_empty());
    }

    #[test_case("+91 9876543210", "9876543210")]
    #[test_case("+919876543210", "9876543210")]
    #[test_case("98765-43210", "9876543210")]
    #[test_case("9876543210", "9876543210")]
    #[test_case("", "")]
    fn test_normalize_phone(raw: &str, expected: &str) {
        assert_eq!(normalize_phone(raw), expected);
    }

    #[test]
    fn test_trim_cart_id() {
        assert_eq!(trim_cart_id("gid://shopify/Cart/abc123?key=k"), "abc123?key=k");
        assert_eq!(trim_cart_id("abc123"), "abc123");
    }

    #[test]
    fn test_schema_uri() {
        assert_eq!(
            schema_uri("in.gokwik.kwikpass", "cart/jsonschema/1-0-0"),
            "iglu:in.gokwik.kwikpass/cart/jsonschema/1-0-0"
        );
    }
}
