//! Canonical provider links.

use crate::consts::{DOWNLOAD_URL_BASE, EMBED_URL_BASE, PREVIEW_URL_BASE};
use crate::models::TransformedUrl;

/// Produces the download, embed and preview links for a provider file id.
///
/// ```
/// let urls = trellis_decode::url::transform("1AbC");
/// assert_eq!(urls.download, "https://drive.google.com/uc?id=1AbC&export=download");
/// assert_eq!(urls.embed, "https://drive.google.com/file/d/1AbC/view?usp=drivesdk");
/// assert_eq!(urls.preview, "https://lh3.googleusercontent.com/d/1AbC");
/// ```
pub fn transform(file_id: &str) -> TransformedUrl {
    TransformedUrl {
        download: format!("{DOWNLOAD_URL_BASE}?id={file_id}&export=download"),
        embed: format!("{EMBED_URL_BASE}/{file_id}/view?usp=drivesdk"),
        preview: format!("{PREVIEW_URL_BASE}/{file_id}"),
    }
}
