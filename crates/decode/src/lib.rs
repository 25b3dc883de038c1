//! Decoding of provider nodes into rendering metadata.
//!
//! Content editors encode behaviour into plain file and folder names
//! (`0005_button_Sign up_download.pdf`) and into the free-text description
//! field (`"formUrl":"https://…"`). This crate turns both into typed values and
//! decides which rendering component a node maps to:
//!
//! - [`naming`] splits order, prefix and suffix tokens off a raw name.
//! - [`description`] recovers `"key":"value"` pairs from description text.
//! - [`classify`] applies the fixed precedence rules to pick a [`ComponentType`].
//! - [`url`] produces the canonical download/embed/preview links for a file id.
//!
//! Everything here is pure and synchronous.

pub mod classify;
mod consts;
pub mod description;
pub mod error;
pub mod models;
pub mod naming;
pub mod url;

pub use crate::classify::{Signals, classify};
pub use crate::models::{ComponentType, DecodedName, ItemMetadata, Prefix, Suffix, TransformedUrl};
pub use crate::naming::{decode, encode};
