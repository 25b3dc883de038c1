use super::{Prefix, Suffix};
use std::collections::BTreeSet;

/// Structured values recovered from a raw node name.
///
/// Prefixes and suffixes are sets: repeating a token in a name has no
/// additional effect, and iteration order is the vocabulary order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DecodedName {
    /// Parsed numeric order, `None` for unnumbered items.
    pub order: Option<u32>,
    pub prefixes: BTreeSet<Prefix>,
    pub suffixes: BTreeSet<Suffix>,
    /// Whatever is left once order, prefix and suffix tokens are removed.
    pub display_name: String,
}
impl DecodedName {
    pub fn has_prefix(&self, prefix: Prefix) -> bool {
        self.prefixes.contains(&prefix)
    }

    pub fn has_suffix(&self, suffix: Suffix) -> bool {
        self.suffixes.contains(&suffix)
    }
}
