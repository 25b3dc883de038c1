//! Component classification.
//!
//! Several signals can coexist on one node (a `vimeo_` prefix on a PDF, a form
//! link in the description of a slide deck), so the rules are applied in a
//! fixed order and the first one that fires wins:
//!
//! 1. an explicit form URL in the description metadata;
//! 2. an explicit type prefix in the name (`modal` excepted);
//! 3. substring heuristics on the raw name;
//! 4. MIME type and URL patterns;
//! 5. [`ComponentType::Generic`].
//!
//! Reordering these changes what editors see, e.g. `vimeo_report.pdf` must
//! stay a Vimeo embed.

use crate::consts::PRESENTATION_MIME_TYPE;
use crate::models::{ComponentType, DecodedName, ItemMetadata, Prefix};
use tracing::instrument;

/// Everything the classifier looks at for one node.
#[derive(Debug, Clone, Copy)]
pub struct Signals<'a> {
    pub raw_name: &'a str,
    pub decoded: &'a DecodedName,
    pub mime_type: &'a str,
    pub metadata: &'a ItemMetadata,
    /// Links associated with the node (transformed URLs, explicit `url`).
    pub urls: &'a [&'a str],
}

/// Picks the rendering component for a node.
#[instrument(level = "trace", skip(signals), fields(name = signals.raw_name))]
pub fn classify(signals: &Signals<'_>) -> ComponentType {
    from_metadata(signals.metadata)
        .or_else(|| from_prefixes(signals.decoded))
        .or_else(|| from_name(signals.raw_name))
        .or_else(|| from_mime_type(signals.mime_type, signals.urls))
        .unwrap_or(ComponentType::Generic)
}

fn from_metadata(metadata: &ItemMetadata) -> Option<ComponentType> {
    metadata.form_url.as_ref().map(|_| ComponentType::GoogleForm)
}

fn from_prefixes(decoded: &DecodedName) -> Option<ComponentType> {
    // BTreeSet iterates in vocabulary order, which is also precedence order.
    // `modal` is only ever a name heuristic.
    decoded.prefixes.iter().find_map(|prefix| match prefix {
        Prefix::Button => Some(ComponentType::Button),
        Prefix::Vimeo => Some(ComponentType::Vimeo),
        Prefix::Image => Some(ComponentType::DirectImage),
        Prefix::Pdf => Some(ComponentType::DirectPdf),
        Prefix::Video => Some(ComponentType::DirectVideo),
        Prefix::Audio => Some(ComponentType::DirectAudio),
        Prefix::GoogleForm | Prefix::Form => Some(ComponentType::GoogleForm),
        Prefix::Modal => None,
    })
}

fn from_name(raw_name: &str) -> Option<ComponentType> {
    let name = raw_name.to_lowercase();
    if name.contains("vimeo") {
        Some(ComponentType::Vimeo)
    } else if name.contains("form") && name.contains("google") {
        Some(ComponentType::GoogleForm)
    } else if name.contains("modal") {
        Some(ComponentType::Modal)
    } else {
        None
    }
}

fn from_mime_type(mime_type: &str, urls: &[&str]) -> Option<ComponentType> {
    let mime_type = mime_type.to_lowercase();
    if mime_type == PRESENTATION_MIME_TYPE {
        Some(ComponentType::GoogleSlides)
    } else if urls.iter().any(|url| url.contains("forms") || url.contains("viewform")) {
        Some(ComponentType::GoogleForm)
    } else if mime_type.contains("pdf") {
        Some(ComponentType::Pdf)
    } else if mime_type.starts_with("image/") {
        Some(ComponentType::Image)
    } else if mime_type.starts_with("video/") {
        Some(ComponentType::Video)
    } else if mime_type.starts_with("audio/") {
        Some(ComponentType::Audio)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::decode;
    use rstest::rstest;

    fn classify_node(raw_name: &str, mime_type: &str, metadata: &ItemMetadata, urls: &[&str]) -> ComponentType {
        let decoded = decode(raw_name);
        classify(&Signals {
            raw_name,
            decoded: &decoded,
            mime_type,
            metadata,
            urls,
        })
    }

    #[rstest]
    #[case("0005_poster.pdf", "application/pdf", ComponentType::Pdf)]
    #[case("button_cta.txt", "text/plain", ComponentType::Button)]
    #[case("vimeo_report.pdf", "application/pdf", ComponentType::Vimeo)]
    #[case("image_hero.png", "image/png", ComponentType::DirectImage)]
    #[case("pdf_terms.pdf", "application/pdf", ComponentType::DirectPdf)]
    #[case("video_intro.mp4", "video/mp4", ComponentType::DirectVideo)]
    #[case("audio_jingle.mp3", "audio/mpeg", ComponentType::DirectAudio)]
    #[case("googleform_survey", "text/plain", ComponentType::GoogleForm)]
    #[case("form_signup", "text/plain", ComponentType::GoogleForm)]
    #[case("modal_terms", "text/plain", ComponentType::Modal)]
    #[case("button_modal_Terms", "text/plain", ComponentType::Button)]
    #[case("modal_vimeo intro", "text/plain", ComponentType::Vimeo)]
    #[case("modal_hero.png", "image/png", ComponentType::Modal)]
    #[case("modal_pdf_Terms.pdf", "application/pdf", ComponentType::DirectPdf)]
    #[case("Our Vimeo Reel.mov", "video/quicktime", ComponentType::Vimeo)]
    #[case("Google Form link", "text/plain", ComponentType::GoogleForm)]
    #[case("Platform overview", "text/plain", ComponentType::Generic)]
    #[case("Privacy Modal", "text/html", ComponentType::Modal)]
    #[case("Deck", "application/vnd.google-apps.presentation", ComponentType::GoogleSlides)]
    #[case("hero.png", "image/png", ComponentType::Image)]
    #[case("intro.mp4", "video/mp4", ComponentType::Video)]
    #[case("jingle.mp3", "audio/mpeg", ComponentType::Audio)]
    #[case("notes.txt", "text/plain", ComponentType::Generic)]
    #[case("Video", "application/vnd.google-apps.folder", ComponentType::Generic)]
    fn test_classify(#[case] raw_name: &str, #[case] mime_type: &str, #[case] expected: ComponentType) {
        assert_eq!(classify_node(raw_name, mime_type, &ItemMetadata::default(), &[]), expected);
    }

    #[test]
    fn test_form_url_outranks_everything() {
        let metadata = ItemMetadata {
            form_url: Some("https://forms.gle/x".to_string()),
            ..ItemMetadata::default()
        };
        let component = classify_node("vimeo_button_Launch.pdf", "application/pdf", &metadata, &[]);
        assert_eq!(component, ComponentType::GoogleForm);
    }

    #[test]
    fn test_form_link_outranks_mime_type() {
        let urls = ["https://docs.google.com/forms/d/e/x/viewform"];
        let component = classify_node("feedback.pdf", "application/pdf", &ItemMetadata::default(), &urls);
        assert_eq!(component, ComponentType::GoogleForm);
    }

    #[test]
    fn test_slides_outrank_form_links() {
        let urls = ["https://docs.google.com/forms/d/e/x/viewform"];
        let component =
            classify_node("Deck", "application/vnd.google-apps.presentation", &ItemMetadata::default(), &urls);
        assert_eq!(component, ComponentType::GoogleSlides);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let first = classify_node("vimeo_report.pdf", "application/pdf", &ItemMetadata::default(), &[]);
        for _ in 0..10 {
            assert_eq!(classify_node("vimeo_report.pdf", "application/pdf", &ItemMetadata::default(), &[]), first);
        }
    }
}
