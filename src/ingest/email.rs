// Email body normalization for header-heavy exports
use chrono::DateTime;
use regex::Regex;

const FORWARD_MARKER: &str = "\n[...Forwarded Email Chain...]\n";

/// Strips RFC-822 style headers, tags the message date, and folds
/// forwarded chains into a single marker.
pub struct EmailNormalizer {
    date_header: Regex,
    header_marker: Regex,
    forwarded: Regex,
}

impl EmailNormalizer {
    pub fn new() -> Self {
        Self {
            date_header: pattern(r"Date:\s+(.*?)\n"),
            header_marker: pattern(r"(?im)^(?:X-FileName:|X-Folder:|Subject:).*$"),
            forwarded: pattern(r"(?s)-+\s?Forwarded by.*?-+\n"),
        }
    }

    /// Normalized body, prefixed with `[YYYY-MM-DD] ` when the date parses,
    /// truncated to `max_chars` characters
    pub fn normalize(&self, raw: &str, max_chars: usize) -> String {
        let text = raw.replace("\r\n", "\n");

        let date_prefix = self
            .message_date(&text)
            .map(|date| format!("[{}] ", date))
            .unwrap_or_default();

        let body = self.strip_headers(&text);
        let body = self.forwarded.replace_all(body, FORWARD_MARKER);
        let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");

        truncate_chars(&format!("{}{}", date_prefix, collapsed), max_chars)
    }

    /// `YYYY-MM-DD` from the first `Date:` header, if it parses
    fn message_date(&self, text: &str) -> Option<String> {
        let raw = self.date_header.captures(text)?.get(1)?.as_str();
        let raw = raw.split(" (").next().unwrap_or(raw).trim();
        DateTime::parse_from_str(raw, "%a, %d %b %Y %H:%M:%S %z")
            .ok()
            .map(|dt| dt.format("%Y-%m-%d").to_string())
    }

    fn strip_headers<'a>(&self, text: &'a str) -> &'a str {
        let header_end = text.find("\n\n").unwrap_or(text.len());
        let Some(marker) = self.header_marker.find_iter(&text[..header_end]).last() else {
            return text;
        };

        match text[marker.end()..].find("\n\n") {
            Some(offset) => text[marker.end() + offset..].trim(),
            None => text[marker.end()..].trim(),
        }
    }
}

impl Default for EmailNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("static pattern compiles")
}

/// First `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}
