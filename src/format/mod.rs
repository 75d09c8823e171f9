//! Response formatting - model markdown to chat markup
//!
//! The formatter is an ordered list of pure text transforms. The output of a
//! transform is the input of the next, so order matters: images are rewritten
//! before links (a markdown image is also a markdown link), and newlines become
//! `<br>` before the list and heading rules, which anchor on line starts.
//!
//! The pipeline is NOT idempotent. Running it over already formatted text can
//! wrap markup a second time, so every message is formatted exactly once.

mod transforms;

use std::sync::LazyLock;

pub use transforms::{
    BoldBullets, Bullets, CollapseBreaks, Emphasis, Headings, Images, Links, Newlines,
    NumberedItems, Transform,
};

static DEFAULT_FORMATTER: LazyLock<ResponseFormatter> = LazyLock::new(ResponseFormatter::new);

/// Format an assistant reply for display
pub fn format_response(text: &str) -> String {
    DEFAULT_FORMATTER.format(text)
}

/// Ordered pipeline of transforms
pub struct ResponseFormatter {
    transforms: Vec<Box<dyn Transform>>,
}

impl ResponseFormatter {
    /// The standard pipeline
    pub fn new() -> Self {
        Self {
            transforms: vec![
                Box::new(Images::new()),
                Box::new(Links::new()),
                Box::new(Newlines::new()),
                Box::new(Headings::new()),
                Box::new(NumberedItems::new()),
                Box::new(BoldBullets::new()),
                Box::new(Bullets::new()),
                Box::new(Emphasis::new()),
                Box::new(CollapseBreaks::new()),
            ],
        }
    }

    /// Names of the transforms, in application order
    pub fn stages(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    pub fn format(&self, text: &str) -> String {
        self.transforms
            .iter()
            .fold(text.to_string(), |acc, transform| transform.apply(&acc))
    }
}

impl Default for ResponseFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let formatter = ResponseFormatter::new();
        let stages = formatter.stages();
        let pos = |name: &str| stages.iter().position(|s| *s == name).unwrap();
        assert!(pos("images") < pos("links"));
        assert!(pos("newlines") < pos("bullets"));
        assert!(pos("bold_bullets") < pos("bullets"));
        assert_eq!(*stages.last().unwrap(), "collapse_breaks");
    }

    #[test]
    fn test_plain_text_only_gains_breaks() {
        let samples = [
            "Stay calm and stay indoors.",
            "Line one\nLine two",
            "Water: 1 gallon per person per day.\n\nKeep a flashlight nearby.",
            "Stay put.\n\n\nHelp is coming.",
            "Evacuate if told to, then wait for the all-clear.",
            "",
        ];
        for sample in samples {
            assert_eq!(format_response(sample), sample.replace('\n', "<br>"), "{sample:?}");
        }
    }

    #[test]
    fn test_image_syntaxes_root_at_images() {
        let cases = [
            ("<image>map-zone-3.png</image>", "map-zone-3.png"),
            ("![Evacuation map](images/evac_route.jpg)", "evac_route.jpg"),
            ("See the route (images/route 2.png)", "route 2.png"),
            ("(images/kit-checklist.webp)", "kit-checklist.webp"),
        ];
        for (input, file) in cases {
            let out = format_response(input);
            assert!(
                out.contains(&format!("src=\"/images/{}\"", file)),
                "{input:?} -> {out:?}"
            );
        }
    }

    #[test]
    fn test_full_reply() {
        let reply = "### Immediate Steps:\n- **Shelter**: Go to the nearest shelter.\n- Bring water\nMore at https://www.redcross.org";
        let out = format_response(reply);
        assert!(out.contains("<strong>Immediate Steps:</strong>"));
        assert!(out.contains("&emsp;• <strong>Shelter:</strong> Go to the nearest shelter."));
        assert!(out.contains("&emsp;• Bring water"));
        assert!(out.contains(
            "<a href=\"https://www.redcross.org\" target=\"_blank\" rel=\"noopener noreferrer\">"
        ));
        assert!(!out.contains("<br><br><br>"));
    }

    #[test]
    fn test_not_idempotent() {
        let once = format_response("**Stay safe** at https://ready.gov");
        let twice = format_response(&once);
        assert_ne!(once, twice);
    }
}
