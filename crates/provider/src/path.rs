//! Node id validation for path-backed providers.
//!
//! Ids handed out by [`LocalProvider`](crate::backend::LocalProvider) are
//! root-relative paths. Anything coming back in from a caller has to be
//! checked before it touches the filesystem.

use crate::error::{ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Validates a path-style node id and returns its normalized relative path.
///
/// Rejects ids that escape the root, contain null bytes, or normalize to
/// nothing (the root itself has its own id and never goes through here).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use trellis_provider::validate_id;
/// assert!(validate_id("Campaigns/Spring").is_ok());
/// assert!(validate_id("a/../Spring").is_ok());
/// assert!(validate_id("../etc/passwd").is_err());
/// assert!(validate_id("a\0b").is_err());
/// assert_eq!(validate_id("a//./b/").unwrap(), Path::new("a/b"));
/// ```
pub fn validate(id: impl AsRef<Path>) -> Result<PathBuf> {
    let invalid = || ErrorKind::InvalidId(id.as_ref().display().to_string());
    let mut components = Vec::new();
    for component in id.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes survive Path::components() on Unix but truncate in syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(invalid()),
        false => Ok(components.into_iter().collect()),
    }
}

/// Renders a validated relative path as a node id (`/`-separated).
pub(crate) fn to_id(relative: &Path) -> Result<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        let Some(part) = component.as_os_str().to_str() else {
            exn::bail!(ErrorKind::InvalidId(relative.display().to_string()));
        };
        parts.push(part);
    }
    Ok(parts.join("/"))
}
