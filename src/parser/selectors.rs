//! CSS selectors for newsletter email markup
//!
//! Newsletter emails are table-based layouts with little semantic markup, so
//! the selectors here stay generic: anchors, headings and the cells/divs that
//! hold one story each.

use lazy_static::lazy_static;
use scraper::Selector;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    static ref ANCHORS: Selector = parse_selector!("a[href]");

    static ref BODY: Selector = parse_selector!("body");

    // Title of a blog-style post
    static ref POST_TITLE: Vec<Selector> = vec![
        parse_selector!("h1.post-title"),
        parse_selector!("h1"),
        parse_selector!("h2.post-title"),
    ];

    // Headings that may open an inline story block
    static ref BLOCK_HEADINGS: Selector = parse_selector!("h1, h2, h3, h4");

    // Fallback digest title
    static ref DIGEST_TITLE: Vec<Selector> = vec![
        parse_selector!("h1"),
        parse_selector!("h2"),
        parse_selector!("h3"),
    ];
}

/// Element names treated as headings during link discovery
pub const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Headings that open a newsletter section
pub const SECTION_TAGS: &[&str] = &["h1", "h2"];

/// Element names that start a new line when flattening markup to text
pub const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "td",
    "tr",
    "table",
    "li",
    "ul",
    "ol",
    "br",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "section",
    "article",
];

/// Element names whose text never reaches extracted content
pub const SILENT_TAGS: &[&str] = &["script", "style", "noscript", "template", "title"];

/// Selectors shared by every newsletter parser
pub struct EmailSelectors {
    pub anchors: &'static Selector,
    pub body: &'static Selector,
    pub post_title: &'static [Selector],
    pub block_headings: &'static Selector,
    pub digest_title: &'static [Selector],
}

impl EmailSelectors {
    pub fn new() -> Self {
        Self {
            anchors: &ANCHORS,
            body: &BODY,
            post_title: &POST_TITLE,
            block_headings: &BLOCK_HEADINGS,
            digest_title: &DIGEST_TITLE,
        }
    }
}

impl Default for EmailSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if an element name is a heading
pub fn is_heading(name: &str) -> bool {
    HEADING_TAGS.contains(&name)
}

/// Check if an element name is a section heading
pub fn is_section_heading(name: &str) -> bool {
    SECTION_TAGS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        let selectors = EmailSelectors::new();
        assert!(!selectors.post_title.is_empty());
        assert!(!selectors.digest_title.is_empty());
    }

    #[test]
    fn test_anchor_selector_requires_href() {
        let html = Html::parse_fragment(r#"<a name="top">x</a><a href="https://a.com">y</a>"#);
        let selectors = EmailSelectors::default();
        assert_eq!(html.select(selectors.anchors).count(), 1);
    }

    #[test]
    fn test_heading_classification() {
        assert!(is_heading("h3"));
        assert!(!is_heading("p"));
        assert!(is_section_heading("h2"));
        assert!(!is_section_heading("h3"));
    }
}
