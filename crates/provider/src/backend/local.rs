//! Local filesystem provider.
//!
//! Serves a directory tree as provider nodes. Node ids are paths relative to
//! the configured root (`/`-separated) and the root itself is [`ROOT_ID`].
//! A node's description lives in an optional sidecar file named
//! `<name>.description` next to it; sidecars are never listed as nodes.
//!
//! [`ROOT_ID`]: LocalProvider::ROOT_ID

use crate::backend::NodeStream;
use crate::error::{ErrorKind, Result};
use crate::models::{FOLDER_MIME_TYPE, RawNode};
use crate::path::{to_id, validate as validate_id};
use crate::Provider;
use async_stream::stream;
use async_trait::async_trait;
use std::ffi::OsString;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs;

const DESCRIPTION_EXTENSION: &str = ".description";

/// Local filesystem provider.
///
/// # Examples
///
/// ```no_run
/// use trellis_provider::backend::LocalProvider;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = LocalProvider::new("assets", "/srv/marketing")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalProvider {
    name: String,
    root: PathBuf,
}
impl LocalProvider {
    /// Id of the root folder.
    pub const ROOT_ID: &'static str = ".";

    /// Create a provider serving the directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidId`](ErrorKind::InvalidId) if the path is not
    /// absolute or is not an existing directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || !root.is_dir() {
            exn::bail!(ErrorKind::InvalidId(root.display().to_string()));
        }
        Ok(Self { name: name.into(), root })
    }

    /// Resolve an id to its canonical form, relative path (`None` for the
    /// root) and absolute path.
    fn resolve(&self, id: &str) -> Result<(String, Option<PathBuf>, PathBuf)> {
        if id.is_empty() || id == Self::ROOT_ID {
            return Ok((Self::ROOT_ID.to_string(), None, self.root.clone()));
        }
        let relative = validate_id(id)?;
        let absolute = self.root.join(&relative);
        Ok((to_id(&relative)?, Some(relative), absolute))
    }

    fn map_io_error(e: std::io::Error, id: &str) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(id.to_string()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(id.to_string()),
            _ => ErrorKind::Io(e),
        }
    }

    async fn read_description(absolute: &Path) -> Result<Option<String>> {
        let mut sidecar = OsString::from(absolute.as_os_str());
        sidecar.push(DESCRIPTION_EXTENSION);
        match fs::read_to_string(PathBuf::from(sidecar)).await {
            Ok(description) => Ok(Some(description)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ErrorKind::Io(e).into()),
        }
    }

    async fn node(&self, id: String, relative: Option<&Path>, absolute: &Path, metadata: Metadata) -> Result<RawNode> {
        let name = match relative {
            Some(relative) => relative.file_name(),
            None => self.root.file_name(),
        }
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| self.name.clone());
        let parent_id = match relative.map(Path::parent) {
            None => None,
            Some(Some(parent)) if parent.as_os_str().is_empty() => Some(Self::ROOT_ID.to_string()),
            Some(Some(parent)) => Some(to_id(parent)?),
            Some(None) => Some(Self::ROOT_ID.to_string()),
        };
        let mime_type = match metadata.is_dir() {
            true => FOLDER_MIME_TYPE.to_string(),
            false => mime_type_for(absolute).to_string(),
        };
        let mut node = RawNode::new(id, name, mime_type);
        node.parent_id = parent_id;
        node.description = Self::read_description(absolute).await?;
        node.size = metadata.is_file().then(|| metadata.len());
        node.modified_time = metadata.modified().ok().map(OffsetDateTime::from);
        Ok(node)
    }

    /// Builds the node for one directory entry, or `None` if it should not
    /// be listed.
    async fn process_entry(&self, parent: Option<&Path>, entry: fs::DirEntry) -> Result<Option<RawNode>> {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            tracing::warn!(provider = %self.name, entry = ?file_name, "Skipping entry with non-UTF8 name");
            return Ok(None);
        };
        if name.ends_with(DESCRIPTION_EXTENSION) {
            return Ok(None);
        }
        let relative = match parent {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        };
        let id = to_id(&relative)?;
        let absolute = entry.path();
        // Follows symlinks; a broken link has no metadata and is dropped.
        let metadata = match fs::metadata(&absolute).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => exn::bail!(Self::map_io_error(e, &id)),
        };
        Ok(Some(self.node(id, Some(&relative), &absolute, metadata).await?))
    }
}

/// Guesses a MIME type from the file extension.
fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_node(&self, id: &str) -> Result<RawNode> {
        let (id, relative, absolute) = self.resolve(id)?;
        let metadata = fs::metadata(&absolute).await.map_err(|e| Self::map_io_error(e, &id))?;
        self.node(id, relative.as_deref(), &absolute, metadata).await
    }

    fn children_stream<'a>(&'a self, folder_id: &'a str) -> NodeStream<'a> {
        let (id, relative, absolute) = match self.resolve(folder_id) {
            Ok(resolved) => resolved,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            match fs::metadata(&absolute).await {
                Ok(metadata) if metadata.is_dir() => {},
                Ok(_) => {
                    yield Err(exn::Exn::from(ErrorKind::NotAFolder(id.clone())));
                    return;
                },
                Err(e) => {
                    yield Err(exn::Exn::from(Self::map_io_error(e, &id)));
                    return;
                },
            }
            let mut entries = match fs::read_dir(&absolute).await {
                Ok(entries) => entries,
                Err(e) => {
                    yield Err(exn::Exn::from(Self::map_io_error(e, &id)));
                    return;
                },
            };
            // read_dir order is unspecified, so sort by name for a stable enumeration.
            let mut listed = Vec::new();
            loop {
                match entries.next_entry().await {
                    Ok(Some(entry)) => listed.push(entry),
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(exn::Exn::from(Self::map_io_error(e, &id)));
                        return;
                    },
                }
            }
            listed.sort_by_key(|entry| entry.file_name());
            for entry in listed {
                match self.process_entry(relative.as_deref(), entry).await {
                    Ok(Some(node)) => yield Ok(node),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                }
            }
        })
    }
}
