//! Provider models.

use time::OffsetDateTime;

/// MIME type the provider uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// The provider's view of one file or folder.
///
/// An immutable snapshot as read; nothing downstream writes back to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNode {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parent_id: Option<String>,
    pub description: Option<String>,
    /// Size in bytes, absent for folders and provider-native documents
    pub size: Option<u64>,
    pub modified_time: Option<OffsetDateTime>,
    pub thumbnail_link: Option<String>,
}
impl RawNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            parent_id: None,
            description: None,
            size: None,
            modified_time: None,
            thumbnail_link: None,
        }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, FOLDER_MIME_TYPE)
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_modified_time(mut self, modified_time: OffsetDateTime) -> Self {
        self.modified_time = Some(modified_time);
        self
    }

    pub fn with_thumbnail_link(mut self, thumbnail_link: impl Into<String>) -> Self {
        self.thumbnail_link = Some(thumbnail_link.into());
        self
    }
}
