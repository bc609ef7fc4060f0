//! Merges the legacy `image_url` column and the newer `images` array into one
//! ordered, de-duplicated list of URLs.
//!
//! Stored data is not trusted: entries may be comma-joined, padded, carry doubled
//! slashes or not be strings at all. Resolution never fails; bad candidates are
//! dropped.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static SCHEME_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("Invalid scheme regex")
});

static SLASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("Invalid slash regex"));

/// Trims a candidate and collapses repeated slashes outside the `scheme://` prefix.
pub fn normalize_image_url(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    let split = SCHEME_PREFIX.find(trimmed).map_or(0, |m| m.end());
    let (scheme, rest) = trimmed.split_at(split);
    let normalized = format!("{scheme}{}", SLASH_RUN.replace_all(rest, "/"));
    Some(normalized)
}

fn push_candidates(raw: &str, out: &mut Vec<String>) {
    for url in raw.split(',').filter_map(normalize_image_url) {
        if !out.contains(&url) {
            out.push(url);
        }
    }
}

pub fn resolve_ticket_images(image_url: Option<&str>, images: Option<&Value>) -> Vec<String> {
    let mut resolved = Vec::new();

    if let Some(raw) = image_url {
        push_candidates(raw, &mut resolved);
    }

    match images {
        Some(Value::Array(entries)) => {
            for entry in entries {
                if let Value::String(raw) = entry {
                    push_candidates(raw, &mut resolved);
                }
            }
        }
        Some(Value::String(raw)) => push_candidates(raw, &mut resolved),
        _ => {}
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicates_across_fields_collapse() {
        let images = json!(["https://x.com/b.png"]);
        let resolved = resolve_ticket_images(
            Some("https://x.com/a.png,https://x.com//a.png"),
            Some(&images),
        );
        assert_eq!(resolved, vec!["https://x.com/a.png", "https://x.com/b.png"]);
    }

    #[test]
    fn test_legacy_field_comes_first() {
        let images = json!(["https://x.com/a.png, https://x.com/c.png"]);
        let resolved = resolve_ticket_images(Some("https://x.com/c.png"), Some(&images));
        assert_eq!(resolved, vec!["https://x.com/c.png", "https://x.com/a.png"]);
    }

    #[test]
    fn test_scheme_slashes_survive() {
        assert_eq!(
            normalize_image_url("  https://cdn.example.com///bucket//img.png "),
            Some("https://cdn.example.com/bucket/img.png".to_string())
        );
        assert_eq!(
            normalize_image_url("storage//tickets/a.png"),
            Some("storage/tickets/a.png".to_string())
        );
    }

    #[test]
    fn test_garbage_is_dropped() {
        let images = json!([null, 42, "", " , ", {"url": "https://x.com/z.png"}]);
        assert!(resolve_ticket_images(Some(",, ,"), Some(&images)).is_empty());
        assert!(resolve_ticket_images(None, Some(&json!({"a": 1}))).is_empty());
        assert!(resolve_ticket_images(None, None).is_empty());
    }

    #[test]
    fn test_bare_string_images_value() {
        let images = json!("https://x.com/a.png,https://x.com/b.png");
        assert_eq!(
            resolve_ticket_images(None, Some(&images)),
            vec!["https://x.com/a.png", "https://x.com/b.png"]
        );
    }
}
