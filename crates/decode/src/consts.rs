use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Characters separating order/prefix/suffix tokens inside a name.
pub(crate) const TOKEN_DELIMITERS: [char; 2] = ['_', '-'];
/// Longest run of characters after the final dot still treated as an extension.
pub(crate) const MAX_EXTENSION_LEN: usize = 5;

pub(crate) const PRESENTATION_MIME_TYPE: &str = "application/vnd.google-apps.presentation";

pub(crate) const DOWNLOAD_URL_BASE: &str = "https://drive.google.com/uc";
pub(crate) const EMBED_URL_BASE: &str = "https://drive.google.com/file/d";
pub(crate) const PREVIEW_URL_BASE: &str = "https://lh3.googleusercontent.com/d";

regex!(ORDER_REGEX, r"^[0-9]+$");
regex!(EXTENSION_REGEX, r"^[A-Za-z0-9]+$");
