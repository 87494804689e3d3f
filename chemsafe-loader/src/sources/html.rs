//! Small helpers over `scraper` shared by the HTML sources

use crate::error::{LoaderError, LoaderResult};
use chemsafe_common::text;
use scraper::{ElementRef, Selector};

/// Parse a CSS selector
pub fn selector(css: &str) -> LoaderResult<Selector> {
    Selector::parse(css).map_err(|e| LoaderError::Parse(format!("Invalid selector {:?}: {:?}", css, e)))
}

/// Visible text of an element, whitespace collapsed and trimmed
///
/// Text nodes are concatenated without separators so inline markup such as
/// `C<sub>6</sub>H<sub>6</sub>` reads as `C6H6`.
pub fn element_text(element: &ElementRef) -> String {
    text::collapse_whitespace(&element.text().collect::<String>())
}

/// Text of the first match under `scope`, `None` when absent or blank
pub fn first_text(scope: &ElementRef, css: &str) -> LoaderResult<Option<String>> {
    let sel = selector(css)?;
    Ok(scope
        .select(&sel)
        .next()
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty()))
}

fn enclosing<'a>(element: &ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == tag)
}

/// Value cell for a bold table label such as `<b>Signal Word:</b>`
///
/// The value is the first non-blank cell following the label's cell inside
/// the same table. When the label's cell is the last one, the text trailing
/// the label inside that cell is used instead.
pub fn labelled_value(scope: &ElementRef, label: &str) -> LoaderResult<Option<String>> {
    let bold = selector("td b")?;
    let cells = selector("td")?;

    for b in scope.select(&bold) {
        let label_text = element_text(&b);
        if !label_text.contains(label) {
            continue;
        }
        let Some(label_cell) = enclosing(&b, "td") else {
            continue;
        };

        if let Some(table) = enclosing(&label_cell, "table") {
            let value = table
                .select(&cells)
                .skip_while(|cell| cell.id() != label_cell.id())
                .skip(1)
                .map(|cell| element_text(&cell))
                .find(|t| !t.is_empty());
            if value.is_some() {
                return Ok(value);
            }
        }

        let cell_text = element_text(&label_cell);
        if let Some(rest) = cell_text.strip_prefix(label_text.as_str()) {
            if let Some(value) = text::non_empty(rest) {
                return Ok(Some(value));
            }
        }
    }

    Ok(None)
}
