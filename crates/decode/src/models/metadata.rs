use std::collections::BTreeMap;

/// Auxiliary properties recovered from a node's description text.
///
/// Well-known keys are lifted into typed fields; anything else is kept
/// verbatim in [`extra`](Self::extra).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ItemMetadata {
    /// External form to embed (`"formUrl"`).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub form_url: Option<String>,
    /// Marketing copy shown next to the item (`"copy"`).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub copy: Option<String>,
    /// Explicit link target overriding the transformed URLs (`"url"`).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub url: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "BTreeMap::is_empty", default))]
    pub extra: BTreeMap<String, String>,
}
impl ItemMetadata {
    pub const FORM_URL_KEY: &'static str = "formUrl";
    pub const COPY_KEY: &'static str = "copy";
    pub const URL_KEY: &'static str = "url";

    pub fn is_empty(&self) -> bool {
        self.form_url.is_none() && self.copy.is_none() && self.url.is_none() && self.extra.is_empty()
    }
}
impl From<BTreeMap<String, String>> for ItemMetadata {
    fn from(mut pairs: BTreeMap<String, String>) -> Self {
        // Blank values carry no signal; treat them as absent.
        let mut take = |key: &str| pairs.remove(key).filter(|v| !v.trim().is_empty());
        let form_url = take(Self::FORM_URL_KEY);
        let copy = take(Self::COPY_KEY);
        let url = take(Self::URL_KEY);
        Self {
            form_url,
            copy,
            url,
            extra: pairs,
        }
    }
}
