//! Description metadata decoding.
//!
//! Description fields are free text written by editors, with machine-readable
//! properties embedded as JSON-ish `"key":"value"` pairs:
//!
//! ```text
//! Spring campaign 🌸
//! "formUrl":"https://docs.google.com/forms/d/e/abc/viewform"
//! "copy":"Tell us what you think!"
//! ```
//!
//! The text around the pairs is arbitrary, so the tokenizer hunts for the next
//! plausible `"key":` boundary instead of parsing the field as a whole. A
//! quoted string not followed by a colon is prose and is skipped silently. A
//! recognised key followed by a broken value is a malformed pair: [`parse`]
//! skips it and carries on, [`parse_strict`] reports it.

use crate::error::{Error, ErrorKind, Result};
use crate::models::ItemMetadata;
use std::collections::BTreeMap;
use tracing::instrument;

/// Iterator over the pairs embedded in a description.
///
/// Yields `Err` for malformed pairs and keeps going; after an error, scanning
/// resumes one byte past the offending key's opening quote.
pub struct Pairs<'a> {
    source: &'a str,
    position: usize,
}
impl<'a> Pairs<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, position: 0 }
    }

    /// Reads a quoted string whose opening quote is at `start`.
    ///
    /// Returns the unescaped contents and the byte offset just past the
    /// closing quote, or `None` if the string never terminates.
    fn quoted(&self, start: usize) -> Option<(String, usize)> {
        let mut value = String::new();
        let mut chars = self.source[start + 1..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Some((value, start + 1 + i + 1)),
                '\\' => match chars.next() {
                    Some((_, '"')) => value.push('"'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    },
                    None => return None,
                },
                c => value.push(c),
            }
        }
        None
    }

    fn skip_whitespace(&self, mut at: usize) -> usize {
        while let Some(c) = self.source[at..].chars().next()
            && c.is_whitespace()
        {
            at += c.len_utf8();
        }
        at
    }

    fn malformed(&mut self, offset: usize, reason: &'static str) -> Option<Result<(String, String)>> {
        self.position = offset + 1;
        Some(Err(Error::from(ErrorKind::MalformedPair { offset, reason })))
    }
}
impl Iterator for Pairs<'_> {
    type Item = Result<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.position + self.source.get(self.position..)?.find('"')?;
            // Not closed at all: a stray quote in prose (`a 6" screen`).
            let Some((key, after_key)) = self.quoted(start) else {
                self.position = start + 1;
                continue;
            };
            let colon = self.skip_whitespace(after_key);
            // Keys never span lines, and a quoted string without a colon is prose.
            if key.contains('\n') || !self.source[colon..].starts_with(':') {
                self.position = start + 1;
                continue;
            }
            if key.trim().is_empty() {
                return self.malformed(start, "empty key");
            }
            let value_start = self.skip_whitespace(colon + 1);
            if !self.source[value_start..].starts_with('"') {
                return self.malformed(start, "value is not a quoted string");
            }
            let Some((value, after_value)) = self.quoted(value_start) else {
                return self.malformed(start, "unterminated value");
            };
            self.position = after_value;
            return Some(Ok((key, value)));
        }
    }
}

/// Tolerantly extracts every well-formed pair from `raw`.
///
/// Malformed pairs are dropped. When a key repeats, the last value wins.
#[instrument(level = "trace", skip(raw), fields(length = raw.len()))]
pub fn parse(raw: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for pair in Pairs::new(raw) {
        match pair {
            Ok((key, value)) => {
                pairs.insert(key, value);
            },
            Err(err) => tracing::trace!(error = %*err, "Skipping malformed description pair"),
        }
    }
    pairs
}

/// Extracts every pair from `raw`, failing on the first malformed one.
pub fn parse_strict(raw: &str) -> Result<BTreeMap<String, String>> {
    Pairs::new(raw).collect()
}

impl ItemMetadata {
    /// Decodes typed metadata from an optional description field.
    pub fn from_description(raw: Option<&str>) -> Self {
        raw.map(parse).map(Self::from).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[rstest]
    #[case("", &[])]
    #[case("just some words", &[])]
    #[case(r#""formUrl":"https://forms.gle/abc""#, &[("formUrl", "https://forms.gle/abc")])]
    #[case(r#""a" : "1", "b":"2""#, &[("a", "1"), ("b", "2")])]
    #[case("Spring 🌸\n\"copy\":\"Grow with us 🌱\"\nThanks!", &[("copy", "Grow with us 🌱")])]
    #[case(r#"He said "hello" then "k":"v""#, &[("k", "v")])]
    #[case(r#"A 6" screen. "k":"v""#, &[("k", "v")])]
    #[case(r#""k":"first" "k":"second""#, &[("k", "second")])]
    #[case(r#""quote":"say \"hi\"\n""#, &[("quote", "say \"hi\"\n")])]
    #[case("\"multi\":\"line one\nline two\"", &[("multi", "line one\nline two")])]
    fn test_parse(#[case] raw: &str, #[case] expected: &[(&str, &str)]) {
        assert_eq!(parse(raw), pairs(expected));
    }

    #[rstest]
    #[case(r#""formUrl": https://forms.gle/abc "copy":"Hi""#, &[("copy", "Hi")])]
    #[case(r#""":"nothing" "copy":"Hi""#, &[("copy", "Hi")])]
    #[case(r#""copy":"Hi" "url":"never closed"#, &[("copy", "Hi")])]
    fn test_parse_skips_malformed(#[case] raw: &str, #[case] expected: &[(&str, &str)]) {
        assert_eq!(parse(raw), pairs(expected));
    }

    #[test]
    fn test_parse_strict_reports_offset() {
        let err = parse_strict(r#"intro "formUrl": unquoted"#).unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::MalformedPair {
                offset: 6,
                reason: "value is not a quoted string"
            }
        );
    }

    #[test]
    fn test_parse_strict_accepts_prose() {
        let parsed = parse_strict(r#"He said "hello". "copy":"Hi""#).unwrap();
        assert_eq!(parsed, pairs(&[("copy", "Hi")]));
    }

    #[test]
    fn test_metadata_from_description() {
        let raw = "Campaign\n\"formUrl\":\"https://docs.google.com/forms/d/x/viewform\"\n\"copy\":\"Join\"\n\"theme\":\"dark\"";
        let metadata = ItemMetadata::from_description(Some(raw));
        assert_eq!(metadata.form_url.as_deref(), Some("https://docs.google.com/forms/d/x/viewform"));
        assert_eq!(metadata.copy.as_deref(), Some("Join"));
        assert_eq!(metadata.url, None);
        assert_eq!(metadata.extra, pairs(&[("theme", "dark")]));
    }

    #[test]
    fn test_metadata_ignores_blank_values() {
        let metadata = ItemMetadata::from_description(Some(r#""formUrl":"  ""#));
        assert!(metadata.is_empty());
        assert!(ItemMetadata::from_description(None).is_empty());
    }
}
