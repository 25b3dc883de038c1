use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Rendering component a hierarchy item maps to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ComponentType {
    Button,
    Vimeo,
    GoogleSlides,
    GoogleForm,
    Pdf,
    Image,
    Video,
    Audio,
    Modal,
    DirectImage,
    DirectPdf,
    DirectVideo,
    DirectAudio,
    #[default]
    Generic,
}
impl ComponentType {
    pub const ALL: [ComponentType; 14] = [
        Self::Button,
        Self::Vimeo,
        Self::GoogleSlides,
        Self::GoogleForm,
        Self::Pdf,
        Self::Image,
        Self::Video,
        Self::Audio,
        Self::Modal,
        Self::DirectImage,
        Self::DirectPdf,
        Self::DirectVideo,
        Self::DirectAudio,
        Self::Generic,
    ];

    /// Returns the tag used by the rendering layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Vimeo => "vimeo",
            Self::GoogleSlides => "google-slides",
            Self::GoogleForm => "google-form",
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Modal => "modal",
            Self::DirectImage => "direct-image",
            Self::DirectPdf => "direct-pdf",
            Self::DirectVideo => "direct-video",
            Self::DirectAudio => "direct-audio",
            Self::Generic => "generic",
        }
    }
}
impl FromStr for ComponentType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sanitized = sanitize(s);
        Self::ALL.into_iter().find(|component| component.as_str() == sanitized).ok_or_else(|| {
            exn::Exn::from(ErrorKind::UnknownToken {
                field: "component type",
                value: s.to_string(),
            })
        })
    }
}
impl Display for ComponentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
