//! Markup and whitespace cleanup for extracted text

use scraper::Html;

/// Strip HTML markup and collapse every whitespace run to a single space.
///
/// Works the same for HTML, PDF-extracted and OCR-extracted input: text nodes
/// are joined with a space so that adjacent block elements do not run together.
pub fn clean_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(raw);
    let joined = fragment.root_element().text().collect::<Vec<_>>().join(" ");

    collapse_whitespace(&joined)
}

/// Collapse whitespace runs to one space and trim both ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags() {
        let cleaned = clean_text("<p>Hello <b>world</b></p><div>again</div>");
        assert_eq!(cleaned, "Hello world again");
    }

    #[test]
    fn test_collapses_whitespace() {
        let cleaned = clean_text("  line one\n\n\tline   two \r\n");
        assert_eq!(cleaned, "line one line two");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(clean_text("Photosynthesis converts light."), "Photosynthesis converts light.");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n\t "), "");
        assert_eq!(clean_text("<br/><br/>"), "");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(clean_text("Fish &amp; chips"), "Fish & chips");
    }
}
