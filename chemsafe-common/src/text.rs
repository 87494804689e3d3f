//! Text normalization for scraped content
//!
//! Every string lifted out of an external page passes through [`trim`]
//! before it is stored. Scraped markup is full of layout whitespace and
//! `&nbsp;` padding, which decodes to U+00A0 and is not removed by a plain
//! ASCII trim.

/// Characters stripped from both ends of scraped text
pub const TRIM_CHARACTERS: &[char] = &[' ', '\t', '\n', '\r', '\0', '\u{0B}', '\u{A0}'];

/// Delimiters that separate codes in a joined statement list
pub const CODE_DELIMITERS: &[char] = &['-', '\u{2013}', '\u{2014}', '\r', '\n'];

/// Remove leading and trailing scrape artifacts
pub fn trim(text: &str) -> &str {
    text.trim_matches(TRIM_CHARACTERS)
}

/// Trim and turn an empty result into `None`
pub fn non_empty(text: &str) -> Option<String> {
    let trimmed = trim(text);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Collapse every whitespace run (including non-breaking spaces) to a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || TRIM_CHARACTERS.contains(&c))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a delimiter-joined code list ("H225-H304-H315") into its codes
///
/// Runs of delimiters count as a single separator. Empty pieces are dropped
/// after trimming, so the result preserves order and never contains "".
pub fn split_codes(text: &str) -> Vec<String> {
    text.split(CODE_DELIMITERS)
        .map(trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

/// Case-insensitive prefix test, both operands trimmed first
pub fn starts_with_ci(prefix: &str, text: &str) -> bool {
    let prefix = trim(prefix).to_lowercase();
    let text = trim(text).to_lowercase();
    text.starts_with(&prefix)
}
