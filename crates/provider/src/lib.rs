pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::Provider;
pub use crate::models::{FOLDER_MIME_TYPE, RawNode};
pub use crate::path::validate as validate_id;
use std::sync::Arc;

pub type ProviderHandle = Arc<dyn Provider + Send + Sync>;
