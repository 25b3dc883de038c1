use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Leading name token selecting a rendering behaviour.
///
/// This is the one canonical vocabulary; the classifier maps it onto
/// [`ComponentType`](super::ComponentType). Declaration order doubles as
/// precedence when a name carries more than one prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Prefix {
    Button,
    Vimeo,
    Image,
    Pdf,
    Video,
    Audio,
    GoogleForm,
    Form,
    Modal,
}
impl Prefix {
    pub const ALL: [Prefix; 9] = [
        Self::Button,
        Self::Vimeo,
        Self::Image,
        Self::Pdf,
        Self::Video,
        Self::Audio,
        Self::GoogleForm,
        Self::Form,
        Self::Modal,
    ];

    /// Returns the token as written in a name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Vimeo => "vimeo",
            Self::Image => "image",
            Self::Pdf => "pdf",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::GoogleForm => "googleform",
            Self::Form => "form",
            Self::Modal => "modal",
        }
    }
}
impl FromStr for Prefix {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sanitized = sanitize(s);
        Self::ALL.into_iter().find(|prefix| prefix.as_str() == sanitized).ok_or_else(|| {
            exn::Exn::from(ErrorKind::UnknownToken {
                field: "prefix",
                value: s.to_string(),
            })
        })
    }
}
impl Display for Prefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
