//! Caption generation.
//!
//! There is no image-captioning model yet; [`PlaceholderCaptioner`] returns
//! a fixed English caption so the rest of the flow can be exercised.

/// Produces a caption for an image.
pub trait CaptionGenerator: Send + Sync {
    fn generate(&self, image: &[u8]) -> String;
}

/// Stand-in used until a captioning model is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderCaptioner;

/// Caption returned by [`PlaceholderCaptioner`] (English).
pub const PLACEHOLDER_CAPTION: &str = "A group of people celebrating a festival";

impl CaptionGenerator for PlaceholderCaptioner {
    fn generate(&self, _image: &[u8]) -> String {
        PLACEHOLDER_CAPTION.to_string()
    }
}

/// Pick the final caption: the contributor's own text wins; otherwise the
/// generator runs only when asked to. Empty result means "no caption".
pub fn resolve_caption(
    user_caption: Option<&str>,
    generate: bool,
    generator: &dyn CaptionGenerator,
    image: &[u8],
) -> String {
    match user_caption.filter(|c| !c.trim().is_empty()) {
        Some(caption) => caption.to_string(),
        None if generate => generator.generate(image),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_caption_wins() {
        let caption = resolve_caption(Some("Diwali lamps"), true, &PlaceholderCaptioner, b"img");
        assert_eq!(caption, "Diwali lamps");
    }

    #[test]
    fn test_generated_when_requested() {
        assert_eq!(
            resolve_caption(None, true, &PlaceholderCaptioner, b"img"),
            PLACEHOLDER_CAPTION
        );
        assert_eq!(
            resolve_caption(Some("   "), true, &PlaceholderCaptioner, b"img"),
            PLACEHOLDER_CAPTION
        );
    }

    #[test]
    fn test_empty_without_request() {
        assert_eq!(resolve_caption(None, false, &PlaceholderCaptioner, b"img"), "");
    }
}
