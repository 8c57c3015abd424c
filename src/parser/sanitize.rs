//! Text sanitization utilities for cleaning text extracted from email markup
//!
//! This module provides functions to clean and normalize text extracted from
//! newsletter HTML, removing invisible characters, normalizing whitespace,
//! decoding HTML entities and shortening descriptions.

use regex::Regex;
use std::sync::LazyLock;

// Pre-compiled regex patterns for performance
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

static ANY_WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static MULTI_NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

static SPONSOR_PHRASE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:this issue is sponsored by|sponsored by|sponsor|together with|presented by|brought to you by|in partnership with|advertisement)\b\s*[:\-|]?\s*|\s*\((?:sponsor(?:ed)?|ad|advertisement)\)\s*",
    )
    .unwrap()
});

/// Sanitize extracted multi-line text content
///
/// This function applies multiple cleaning steps:
/// 1. Remove zero-width characters
/// 2. Remove control characters (except newline/tab)
/// 3. Decode HTML entities
/// 4. Normalize whitespace
/// 5. Trim each line
/// 6. Remove excessive blank lines
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::sanitize_text;
///
/// let dirty = "Hello\u{200B}World  \n\n\n\nTest";
/// let clean = sanitize_text(dirty);
/// assert!(!clean.contains('\u{200B}'));
/// ```
pub fn sanitize_text(text: &str) -> String {
    let mut result = text.to_string();

    result = remove_zero_width(&result);
    result = remove_control_chars(&result);
    result = decode_html_entities(&result);
    result = normalize_whitespace(&result);
    result = trim_lines(&result);
    result = collapse_newlines(&result);

    result.trim().to_string()
}

/// Sanitize text and fold it onto a single line
///
/// Used for titles, link text and headings where line breaks carry no meaning.
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::clean_inline;
///
/// assert_eq!(clean_inline("  Big\n  News&nbsp;Today \u{200C}"), "Big News Today");
/// ```
pub fn clean_inline(text: &str) -> String {
    let text = remove_control_chars(&remove_zero_width(text));
    let text = decode_html_entities(&text).replace('\u{a0}', " ");
    ANY_WHITESPACE_REGEX
        .replace_all(text.trim(), " ")
        .trim()
        .to_string()
}

/// Remove zero-width spaces and similar invisible characters
///
/// Removes:
/// - \u{200B}-\u{200F} Zero-width space, joiners and direction marks
/// - \u{2028}-\u{202F} Separators and formatting characters
/// - \u{034F} Combining grapheme joiner (email preheader padding)
/// - \u{FEFF} Byte order mark (BOM)
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::remove_zero_width;
///
/// let text = "a\u{200B}b\u{FEFF}c";
/// assert_eq!(remove_zero_width(text), "abc");
/// ```
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{034F}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Remove control characters except newline and tab
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::remove_control_chars;
///
/// let text = "Hello\x00World\x07Test\nNewline";
/// let clean = remove_control_chars(text);
/// assert!(!clean.contains('\x00'));
/// assert!(clean.contains('\n'));
/// ```
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Decode HTML entities to plain text
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::decode_html_entities;
///
/// let text = "&lt;div&gt;Hello &amp; World&lt;/div&gt;";
/// assert_eq!(decode_html_entities(text), "<div>Hello & World</div>");
/// ```
pub fn decode_html_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Normalize multiple spaces/tabs to single space
///
/// Does NOT affect newlines - those are handled separately.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").to_string()
}

/// Trim whitespace from each line
pub fn trim_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse excessive newlines to maximum of 2
pub fn collapse_newlines(text: &str) -> String {
    MULTI_NEWLINE_REGEX.replace_all(text, "\n\n").to_string()
}

/// Check if text contains meaningful content
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::has_content;
///
/// assert!(has_content("Hello"));
/// assert!(!has_content("   \n\t  "));
/// ```
pub fn has_content(text: &str) -> bool {
    !text.trim().is_empty()
}

/// Truncate text to max length with ellipsis
///
/// If text is longer than max_len characters, truncates and adds "...".
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::truncate;
///
/// assert_eq!(truncate("Hello World", 5), "He...");
/// assert_eq!(truncate("Hello World", 20), "Hello World");
/// ```
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated.trim_end())
    }
}

/// Truncate text at the last sentence boundary within `max_len` characters
///
/// Falls back to [`truncate`] when no sentence ends in the second half of the
/// allowed window.
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::truncate_at_sentence;
///
/// let text = "First sentence here. Second one is longer and gets cut.";
/// assert_eq!(truncate_at_sentence(text, 30), "First sentence here.");
/// ```
pub fn truncate_at_sentence(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let window: String = text.chars().take(max_len).collect();
    let boundary = window
        .char_indices()
        .filter(|&(i, c)| {
            matches!(c, '.' | '!' | '?')
                && window[i + c.len_utf8()..]
                    .chars()
                    .next()
                    .map_or(true, char::is_whitespace)
        })
        .map(|(i, c)| i + c.len_utf8())
        .last();

    match boundary {
        Some(end) if window[..end].chars().count() * 2 >= max_len => window[..end].to_string(),
        _ => truncate(text, max_len),
    }
}

/// Remove sponsor and advertising markers from a description
///
/// # Examples
///
/// ```
/// use mailbrief::parser::sanitize::strip_sponsor_phrases;
///
/// assert_eq!(
///     strip_sponsor_phrases("Sponsored by Acme: Faster builds for everyone"),
///     "Acme: Faster builds for everyone"
/// );
/// ```
pub fn strip_sponsor_phrases(text: &str) -> String {
    let stripped = SPONSOR_PHRASE_REGEX.replace_all(text, " ");
    ANY_WHITESPACE_REGEX
        .replace_all(stripped.trim(), " ")
        .to_string()
}
