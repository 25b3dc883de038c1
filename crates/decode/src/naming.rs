//! Naming convention decoding.
//!
//! Editors prepend ordering and type tokens to names and append behaviour
//! tokens, separated by `_` or `-`:
//!
//! ```text
//! 0005_button_Sign up_download.pdf
//! ^^^^ ^^^^^^ ^^^^^^^ ^^^^^^^^
//! order prefix  name   suffix
//! ```
//!
//! Decoding is total: a token that matches nothing simply stays part of the
//! display name. The last token of a name is never consumed as a prefix or
//! suffix, so a folder literally called `Video` keeps its name.

use crate::consts::{EXTENSION_REGEX, MAX_EXTENSION_LEN, ORDER_REGEX, TOKEN_DELIMITERS};
use crate::models::{DecodedName, Prefix, Suffix};
use std::collections::BTreeSet;
use tracing::instrument;

/// Result of the leading-token pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixDecoding<'a> {
    pub order: Option<u32>,
    pub prefixes: BTreeSet<Prefix>,
    /// Everything from the first unrecognised token on, delimiters intact.
    pub remainder: &'a str,
}

/// Result of the trailing-token pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixDecoding {
    pub suffixes: BTreeSet<Suffix>,
    pub display_name: String,
}

enum Token {
    Order(u32),
    Prefix(Prefix),
}

fn leading_token(token: &str) -> Option<Token> {
    let token = token.trim();
    if ORDER_REGEX.is_match(token) {
        // Too many digits for a u32 is not an order, just text.
        return token.parse::<u32>().ok().map(Token::Order);
    }
    token.parse::<Prefix>().ok().map(Token::Prefix)
}

/// Splits order and prefix tokens off the front of `raw_name`.
///
/// Only the first numeric token is an order; a second one ends the pass.
pub fn decode_prefixes(raw_name: &str) -> PrefixDecoding<'_> {
    let mut order = None;
    let mut prefixes = BTreeSet::new();
    let mut rest = raw_name;
    while let Some((token, tail)) = rest.split_once(TOKEN_DELIMITERS) {
        if tail.trim().is_empty() {
            break;
        }
        match leading_token(token) {
            Some(Token::Order(n)) if order.is_none() => order = Some(n),
            Some(Token::Prefix(prefix)) => {
                prefixes.insert(prefix);
            },
            _ => break,
        }
        rest = tail;
    }
    PrefixDecoding {
        order,
        prefixes,
        remainder: rest,
    }
}

/// Splits known suffix tokens off the end of `name`.
///
/// A short alphanumeric file extension is set aside first and re-attached to
/// the display name, so `Brochure_download.pdf` becomes `Brochure.pdf`.
pub fn decode_suffixes(name: &str) -> SuffixDecoding {
    let (mut stem, extension) = split_extension(name.trim());
    let mut suffixes = BTreeSet::new();
    while let Some((head, token)) = stem.rsplit_once(TOKEN_DELIMITERS) {
        if head.trim().is_empty() {
            break;
        }
        match token.parse::<Suffix>() {
            Ok(suffix) => {
                suffixes.insert(suffix);
                stem = head;
            },
            Err(_) => break,
        }
    }
    SuffixDecoding {
        suffixes,
        display_name: format!("{}{}", stem.trim(), extension),
    }
}

/// Decodes a raw provider name into its structured parts.
#[instrument(level = "trace")]
pub fn decode(raw_name: &str) -> DecodedName {
    let PrefixDecoding {
        order,
        prefixes,
        remainder,
    } = decode_prefixes(raw_name);
    let SuffixDecoding { suffixes, display_name } = decode_suffixes(remainder);
    DecodedName {
        order,
        prefixes,
        suffixes,
        display_name,
    }
}

/// Writes structured name parts back into the naming convention.
///
/// Orders are written without zero padding and tokens in vocabulary order,
/// so `encode(decode(name))` is a canonical form of `name` rather than a
/// byte-for-byte copy.
pub fn encode(decoded: &DecodedName) -> String {
    let order = decoded.order.map(|order| order.to_string());
    let (stem, extension) = split_extension(&decoded.display_name);
    let mut tokens: Vec<&str> = Vec::with_capacity(decoded.prefixes.len() + decoded.suffixes.len() + 2);
    if let Some(order) = order.as_deref() {
        tokens.push(order);
    }
    for prefix in &decoded.prefixes {
        tokens.push(prefix.as_str());
    }
    tokens.push(stem);
    for suffix in &decoded.suffixes {
        tokens.push(suffix.as_str());
    }
    format!("{}{}", tokens.join("_"), extension)
}

/// Returns `(stem, extension)` where the extension keeps its leading dot.
pub(crate) fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 => {
            let extension = &name[dot + 1..];
            if extension.len() <= MAX_EXTENSION_LEN && EXTENSION_REGEX.is_match(extension) {
                (&name[..dot], &name[dot..])
            } else {
                (name, "")
            }
        },
        _ => (name, ""),
    }
}
