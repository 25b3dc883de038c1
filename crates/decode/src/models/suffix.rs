use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Trailing name token modifying how a rendered item behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Suffix {
    /// Render a download link instead of an inline viewer.
    Download,
    /// Open the link in a new browser tab.
    NewTab,
}
impl Suffix {
    pub const ALL: [Suffix; 2] = [Self::Download, Self::NewTab];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::NewTab => "newtab",
        }
    }
}
impl FromStr for Suffix {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match sanitize(s).as_str() {
            "download" => Self::Download,
            "newtab" => Self::NewTab,
            _ => exn::bail!(ErrorKind::UnknownToken {
                field: "suffix",
                value: s.to_string(),
            }),
        })
    }
}
impl Display for Suffix {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
