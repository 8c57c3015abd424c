//! Email body parsing with noise stripping and structural queries
//!
//! This module turns a raw message body into an [`EmailDocument`]: the HTML
//! body (or a linkified plain-text body) with comments, scripts, styles and
//! page chrome removed, parsed into a tree that parsers query for links,
//! headings, descriptions and inline story blocks.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::models::RawMessage;
use crate::parser::sanitize::{clean_inline, has_content, sanitize_text};
use crate::parser::selectors::{
    is_heading, is_section_heading, EmailSelectors, BLOCK_TAGS, SILENT_TAGS,
};

/// Inline story blocks need at least this much body text
pub const MIN_BLOCK_CONTENT_CHARS: usize = 100;

/// How many wrapper levels a description lookup climbs above the anchor
const MAX_DESCRIPTION_CLIMB: usize = 3;

/// Wrapper elements a description lookup may climb out of
const INLINE_WRAPPERS: &[&str] = &["strong", "b", "em", "i", "u", "span", "font", "small", "p"];

// Page chrome stripped before parsing, one pattern per element (no backreferences in `regex`)
static NOISE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let mut patterns = vec![Regex::new(r"(?s)<!--.*?-->").unwrap()];
    for tag in ["head", "script", "style", "noscript", "nav", "footer", "header", "aside"] {
        patterns.push(Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap());
    }
    patterns
});

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).unwrap());

static READING_TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s*\((\d+\s*(?:minute|min)s?\s+read)\)\s*$").unwrap()
});

/// Remove comments and page-chrome elements from raw markup
///
/// # Examples
///
/// ```
/// use mailbrief::parser::html::strip_noise;
///
/// let html = "<nav>Home</nav><p>Story</p><!-- tracking --><script>x()</script>";
/// assert_eq!(strip_noise(html), "<p>Story</p>");
/// ```
pub fn strip_noise(html: &str) -> String {
    NOISE_REGEXES
        .iter()
        .fold(html.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
}

/// Convert a plain-text body into minimal HTML
///
/// Each line becomes a paragraph; a line carrying a URL becomes an anchor
/// labelled by the rest of the line, or by the preceding line when the URL
/// stands alone.
pub fn text_to_html(text: &str) -> String {
    let mut html = String::from("<html><body>");
    let mut previous: Option<String> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            previous = None;
            continue;
        }

        let Some(found) = URL_REGEX.find(line) else {
            html.push_str(&format!("<p>{}</p>", html_escape::encode_text(line)));
            previous = Some(line.to_string());
            continue;
        };

        let url = found
            .as_str()
            .trim_end_matches(['.', ',', ')', ']', '>', ';']);
        let rest = format!("{} {}", &line[..found.start()], &line[found.end()..]);
        let rest = rest
            .trim_matches(|c: char| c.is_whitespace() || ":-|()[]<>".contains(c))
            .to_string();

        let label = if rest.is_empty() {
            previous.take().unwrap_or_else(|| url.to_string())
        } else {
            rest
        };

        html.push_str(&format!(
            "<p><a href=\"{}\">{}</a></p>",
            html_escape::encode_double_quoted_attribute(url),
            html_escape::encode_text(&label)
        ));
        previous = None;
    }

    html.push_str("</body></html>");
    html
}

/// Split `"Title (N minute read)"` into title and reading time
///
/// # Examples
///
/// ```
/// use mailbrief::parser::html::split_reading_time;
///
/// let (title, reading_time) = split_reading_time("Nvidia unveils AI chips (3 minute read)");
/// assert_eq!(title, "Nvidia unveils AI chips");
/// assert_eq!(reading_time.as_deref(), Some("3 minute read"));
/// ```
pub fn split_reading_time(text: &str) -> (String, Option<String>) {
    match READING_TIME_REGEX.captures(text.trim()) {
        Some(caps) if !caps[1].trim().is_empty() => {
            (caps[1].trim().to_string(), Some(caps[2].to_string()))
        }
        _ => (text.trim().to_string(), None),
    }
}

/// Anchor discovered in document order with its surrounding headings
#[derive(Debug, Clone)]
pub struct LinkSeed<'a> {
    pub element: ElementRef<'a>,
    /// Raw `href` value, trimmed
    pub href: String,
    /// Visible text, folded to one line
    pub text: String,
    /// Nearest preceding heading of any level
    pub heading: Option<String>,
    /// Nearest preceding `h1`/`h2`
    pub section: Option<String>,
}

/// Story block: a `td`/`div` opened by exactly one heading
#[derive(Debug, Clone)]
pub struct ContentBlock {
    pub title: String,
    pub content: String,
    /// `href` values inside the block, in document order
    pub links: Vec<String>,
}

/// Parsed, noise-stripped email body
pub struct EmailDocument {
    html: Html,
    selectors: EmailSelectors,
}

impl EmailDocument {
    /// Select and parse the body of a message
    ///
    /// Prefers the HTML body, falls back to the plain-text body, and returns
    /// `None` when the message carries neither.
    pub fn from_message(message: &RawMessage) -> Option<Self> {
        if let Some(html) = message.html_body.as_deref().filter(|b| has_content(b)) {
            return Some(Self::parse(html));
        }

        message
            .text_body
            .as_deref()
            .filter(|b| has_content(b))
            .map(|text| Self::parse(&text_to_html(text)))
    }

    /// Parse markup after stripping noise
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(&strip_noise(html)),
            selectors: EmailSelectors::new(),
        }
    }

    /// Body element, or the document root when no body was produced
    fn body(&self) -> ElementRef<'_> {
        self.html
            .select(self.selectors.body)
            .next()
            .unwrap_or_else(|| self.html.root_element())
    }

    /// Every `a[href]` in document order with its nearest preceding headings
    pub fn links(&self) -> Vec<LinkSeed<'_>> {
        let mut seeds = Vec::new();
        let mut heading: Option<String> = None;
        let mut section: Option<String> = None;

        for node in self.body().descendants() {
            let Some(element) = ElementRef::wrap(node) else {
                continue;
            };
            let name = element.value().name();

            if is_heading(name) {
                let text = clean_inline(&flatten_text(element, None));
                if has_content(&text) {
                    if is_section_heading(name) {
                        section = Some(text.clone());
                    }
                    heading = Some(text);
                }
                continue;
            }

            if name != "a" {
                continue;
            }

            let Some(href) = element.value().attr("href").map(str::trim) else {
                continue;
            };
            if href.is_empty() {
                continue;
            }

            seeds.push(LinkSeed {
                element,
                href: href.to_string(),
                text: clean_inline(&flatten_text(element, None)),
                heading: heading.clone(),
                section: section.clone(),
            });
        }

        seeds
    }

    /// First text block following an anchor, skipping line breaks
    ///
    /// Climbs out of inline wrappers (`strong`, `span`, `p`, ...) when the
    /// anchor has no following siblings. Stops at the next heading or at a
    /// block that is itself mostly a link.
    pub fn description_after(&self, anchor: ElementRef<'_>) -> Option<String> {
        let mut current = *anchor;

        for _ in 0..=MAX_DESCRIPTION_CLIMB {
            let mut sibling = current.next_sibling();
            while let Some(node) = sibling {
                match node.value() {
                    Node::Text(text) => {
                        let text = clean_inline(text);
                        if is_description(&text) {
                            return Some(text);
                        }
                    }
                    Node::Element(element) => {
                        let name = element.name();
                        if is_heading(name) || name == "a" {
                            return None;
                        }
                        if let Some(block) = ElementRef::wrap(node) {
                            if !matches!(name, "br" | "img" | "hr") && !SILENT_TAGS.contains(&name) {
                                let text = clean_inline(&flatten_text(block, None));
                                if is_description(&text) {
                                    return (!self.is_link_block(block, &text)).then_some(text);
                                }
                            }
                        }
                    }
                    _ => {}
                }
                sibling = node.next_sibling();
            }

            let parent = current.parent()?;
            let climbable = ElementRef::wrap(parent)
                .is_some_and(|p| INLINE_WRAPPERS.contains(&p.value().name()));
            if !climbable {
                return None;
            }
            current = parent;
        }

        None
    }

    /// Whether most of an element's text is the text of the anchors inside it
    fn is_link_block(&self, element: ElementRef<'_>, text: &str) -> bool {
        let linked: usize = element
            .select(self.selectors.anchors)
            .map(|a| clean_inline(&flatten_text(a, None)).chars().count())
            .sum();
        linked * 2 >= text.chars().count()
    }

    /// Story blocks: for each heading, the smallest enclosing `td`/`div` that
    /// holds it as its only and leading heading with enough body text
    pub fn content_blocks(&self) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();
        let mut claimed = HashSet::new();

        for heading in self.body().select(self.selectors.block_headings) {
            let title = clean_inline(&flatten_text(heading, None));
            if !has_content(&title) {
                continue;
            }

            for ancestor in heading.ancestors().filter_map(ElementRef::wrap) {
                if !matches!(ancestor.value().name(), "td" | "div") {
                    continue;
                }

                let heading_count = ancestor.select(self.selectors.block_headings).count();
                if heading_count != 1 || !starts_with(ancestor, heading) {
                    break;
                }

                let content = sanitize_text(&flatten_text(ancestor, Some(heading)));
                if content.chars().count() < MIN_BLOCK_CONTENT_CHARS {
                    continue;
                }

                if claimed.insert(ancestor.id()) {
                    blocks.push(ContentBlock {
                        title: title.clone(),
                        content,
                        links: ancestor
                            .select(self.selectors.anchors)
                            .filter_map(|a| a.value().attr("href"))
                            .map(|href| href.trim().to_string())
                            .collect(),
                    });
                }
                break;
            }
        }

        blocks
    }

    /// Text of the first element matched by any selector, with the element
    pub fn first_text(&self, selectors: &[Selector]) -> Option<(String, ElementRef<'_>)> {
        selectors
            .iter()
            .flat_map(|selector| self.body().select(selector))
            .find_map(|element| {
                let text = clean_inline(&flatten_text(element, None));
                has_content(&text).then_some((text, element))
            })
    }

    /// Title of a blog-style post (its first `h1`)
    pub fn post_title(&self) -> Option<String> {
        self.first_text(self.selectors.post_title).map(|(text, _)| text)
    }

    /// Whole-body text keyed by its first heading, for digest fallbacks
    pub fn digest(&self) -> (Option<String>, String) {
        match self.first_text(self.selectors.digest_title) {
            Some((title, heading)) => (
                Some(title),
                sanitize_text(&flatten_text(self.body(), Some(heading))),
            ),
            None => (None, self.text()),
        }
    }

    /// Whole-body text with block structure kept as line breaks
    pub fn text(&self) -> String {
        sanitize_text(&flatten_text(self.body(), None))
    }
}

fn is_description(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphabetic()).count() >= 3
}

/// Whether `heading` is the first text-bearing content inside `container`
fn starts_with(container: ElementRef<'_>, heading: ElementRef<'_>) -> bool {
    for node in container.descendants() {
        if node.id() == heading.id() {
            return true;
        }
        if let Node::Text(text) = node.value() {
            if has_content(text) {
                return false;
            }
        }
    }
    false
}

/// Flatten an element to text, breaking lines at block elements
///
/// Iterative so that pathologically nested markup cannot exhaust the stack.
/// `skip` excludes one subtree (typically a block's heading).
pub fn flatten_text(element: ElementRef<'_>, skip: Option<ElementRef<'_>>) -> String {
    let mut out = String::new();
    let mut stack = vec![(*element, false)];

    while let Some((node, closing)) = stack.pop() {
        if closing {
            out.push('\n');
            continue;
        }
        if skip.is_some_and(|s| s.id() == node.id()) {
            continue;
        }

        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SILENT_TAGS.contains(&name) {
                    continue;
                }
                if BLOCK_TAGS.contains(&name) {
                    out.push('\n');
                    stack.push((node, true));
                } else if name == "img" {
                    continue;
                }
                let children: Vec<_> = node.children().collect();
                stack.extend(children.into_iter().rev().map(|child| (child, false)));
            }
            _ => {
                let children: Vec<_> = node.children().collect();
                stack.extend(children.into_iter().rev().map(|child| (child, false)));
            }
        }
    }

    out
}
