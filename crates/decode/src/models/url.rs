/// The three canonical links derived from a provider file id.
///
/// These templates are persisted in previously rendered pages, so they must
/// not change shape.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransformedUrl {
    pub download: String,
    pub embed: String,
    pub preview: String,
}
impl TransformedUrl {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [self.download.as_str(), self.embed.as_str(), self.preview.as_str()].into_iter()
    }
}
