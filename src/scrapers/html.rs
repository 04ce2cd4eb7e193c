//! Table helpers shared by the roster, listing and detail scrapers.

use scraper::{ElementRef, Selector};
use serde::Serialize;

use super::error::ScrapeError;

/// Parse a CSS selector, mapping failure into a scrape error.
pub fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{css}: {e:?}")))
}

/// Collapse runs of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All text below an element, however deeply nested, joined with spaces
/// and whitespace-collapsed. Markup such as `<br>` separates words.
pub fn cell_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Direct child elements with the given tag name.
pub fn child_elements<'a>(
    element: ElementRef<'a>,
    name: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

/// Rows belonging to a table itself, not to tables nested inside its cells.
///
/// HTML parsing inserts an implicit `tbody`, so rows are collected from the
/// table's own sections as well as from direct `tr` children.
pub fn table_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(child_elements(child, "tr")),
            _ => {}
        }
    }
    rows
}

/// Text of each direct `td` cell in a row.
pub fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    child_elements(row, "td").map(cell_text).collect()
}

/// A row whose values are paired with the column headers of its table.
///
/// Pairs keep source column order. Pushing a header that is already present
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabeledRow {
    cells: Vec<(String, String)>,
}

impl LabeledRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zip headers with values. Extra items on either side are dropped.
    pub fn zip<H, V>(headers: H, values: V) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        V: IntoIterator,
        V::Item: Into<String>,
    {
        let mut row = Self::new();
        for (header, value) in headers.into_iter().zip(values) {
            row.push(header, value);
        }
        row
    }

    /// Add a header/value pair.
    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(h, _)| *h == header) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((header, value)),
        }
    }

    /// Value under an exact header.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// Headers in column order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    /// Values in column order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, v)| v.as_str())
    }

    /// Header/value pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True if any header or value contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.cells
            .iter()
            .any(|(h, v)| h.contains(needle) || v.contains(needle))
    }
}

impl<H: Into<String>, V: Into<String>> FromIterator<(H, V)> for LabeledRow {
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let mut row = LabeledRow::new();
        for (header, value) in iter {
            row.push(header, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&selector(css).unwrap()).next().unwrap()
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace(" \u{a0} "), "");
    }

    #[test]
    fn test_cell_text_nested_markup() {
        let doc = Html::parse_fragment(
            "<table><tr><td>  Table <b>I  -\n <i>Non-Derivative</i></b>\n </td></tr></table>",
        );
        assert_eq!(cell_text(first(&doc, "td")), "Table I - Non-Derivative");
    }

    #[test]
    fn test_cell_text_separates_text_nodes() {
        let doc = Html::parse_fragment(
            "<table><tr><th>Transaction<br>Date</th><th>Title of<br/>Security</th></tr></table>",
        );
        let headers: Vec<String> = doc.select(&selector("th").unwrap()).map(cell_text).collect();
        assert_eq!(headers, vec!["Transaction Date", "Title of Security"]);
    }

    #[test]
    fn test_table_rows_skips_nested_tables() {
        let doc = Html::parse_document(
            r#"<table id="outer">
                 <tr><td>one</td></tr>
                 <tr><td><table><tr><td>inner</td></tr></table></td></tr>
                 <tr><td>three</td></tr>
               </table>"#,
        );
        let rows = table_rows(first(&doc, "table#outer"));
        assert_eq!(rows.len(), 3);
        assert_eq!(row_cells(rows[0]), vec!["one"]);
        assert_eq!(row_cells(rows[2]), vec!["three"]);
    }

    #[test]
    fn test_labeled_row_lookup_and_order() {
        let row = LabeledRow::zip(["Name", "City", "State"], ["Acme", "Dover", "DE"]);
        assert_eq!(row.get("City"), Some("Dover"));
        assert_eq!(row.get("Zip"), None);
        assert_eq!(row.headers().collect::<Vec<_>>(), vec!["Name", "City", "State"]);
        assert!(row.contains_text("Dov"));
        assert!(!row.contains_text("There are no"));
    }

    #[test]
    fn test_labeled_row_duplicate_header_keeps_position() {
        let row: LabeledRow = [("A", "1"), ("B", "2"), ("A", "3")].into_iter().collect();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("A"), Some("3"));
        assert_eq!(row.headers().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
