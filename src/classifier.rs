//! Content sniffing for decoded payloads.
//!
//! The checks run in a fixed order and the first match wins, so a vCard that
//! happens to contain a URL is still a contact.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ContentType;

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?|ftp)://[^\s/$.?#].[^\s]*$").expect("url pattern is valid")
});

static PHONE_DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{8,}$").expect("phone pattern is valid"));

/// Prefix-tagged formats in match order. URL is tested before these and JSON after.
const PREFIXES: [(&str, ContentType); 7] = [
    ("mailto:", ContentType::Email),
    ("BEGIN:VCARD", ContentType::Contact),
    ("WIFI:", ContentType::Wifi),
    ("sms:", ContentType::Sms),
    ("tel:", ContentType::Phone),
    ("geo:", ContentType::Geo),
    ("BEGIN:VEVENT", ContentType::Calendar),
];

pub fn classify(text: &str) -> ContentType {
    if URL_RE.is_match(text) {
        return ContentType::Url;
    }

    for (prefix, content_type) in PREFIXES {
        if starts_with_ignore_case(text, prefix) {
            return content_type;
        }
        // Bare digit strings share PHONE's slot, ahead of geo:
        if content_type == ContentType::Phone && PHONE_DIGITS_RE.is_match(text) {
            return ContentType::Phone;
        }
    }

    if serde_json::from_str::<serde_json::Value>(text).is_ok() {
        return ContentType::Json;
    }

    ContentType::Text
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .map(|head| head.eq_ignore_ascii_case(prefix))
        .unwrap_or(false)
}
