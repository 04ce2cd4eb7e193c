//! Filing detail pages.
//!
//! A detail page renders one disclosure as a single bordered table. Named
//! heading rows ("Filing Information", "Table I - Non-Derivative", ...) split
//! that table into sections; within a section, a row of `th` cells (when
//! present) labels the data rows that follow it.

use std::collections::BTreeMap;
use std::ops::Range;

use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::debug;

use super::error::ScrapeError;
use super::html::{cell_text, child_elements, row_cells, selector, table_rows, LabeledRow};
use super::HttpClient;

/// Detail page URL with `{discl_id}` and `{cert_number}` placeholders.
pub const DEFAULT_DETAIL_URL_TEMPLATE: &str = "http://www2.fdic.gov/efr/redirect.asp?Discl_id={discl_id}&InstNme=&InstCty=&CertNum={cert_number}&InstSte=&sGoto=Institution";

/// Build a detail page URL from a certificate number and disclosure id.
pub fn compose_detail_url(template: &str, cert_number: i64, disclosure_id: i64) -> String {
    template
        .replace("{discl_id}", &disclosure_id.to_string())
        .replace("{cert_number}", &cert_number.to_string())
}

/// Sections of a detail table, in the order they appear on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Section {
    FilingInformation,
    FilerInformation,
    NonDerivative,
    Derivative,
    Explanation,
    Exhibit,
    /// Sentinel closing the last real section at the end of the table.
    End,
}

impl Section {
    /// Every section in page order, `End` last.
    pub const ALL: [Section; 7] = [
        Section::FilingInformation,
        Section::FilerInformation,
        Section::NonDerivative,
        Section::Derivative,
        Section::Explanation,
        Section::Exhibit,
        Section::End,
    ];

    /// Heading text that opens the section.
    pub fn heading(self) -> &'static str {
        match self {
            Self::FilingInformation => "Filing Information",
            Self::FilerInformation => "Filer Information",
            Self::NonDerivative => "Table I - Non-Derivative",
            Self::Derivative => "Table II - Derivative",
            Self::Explanation => "Explanation of Responses",
            Self::Exhibit => "Exhibit Information",
            Self::End => "EOF",
        }
    }

    /// Sections whose boundary falls back to the end of the table when
    /// their heading is missing.
    fn defaults_to_end(self) -> bool {
        matches!(self, Self::Exhibit | Self::End)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.heading())
    }
}

/// Row positions of the section headings within a flattened table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionIndex {
    headings: Vec<(Section, Option<usize>)>,
    row_count: usize,
}

impl SectionIndex {
    /// Locate headings given the first-cell text of every row.
    ///
    /// Headings are searched in [`Section::ALL`] order, each one starting
    /// after the row where the previous heading matched. A heading that
    /// appears out of order is therefore not found.
    pub fn locate<S: AsRef<str>>(first_cells: &[S]) -> Self {
        let mut headings = Vec::with_capacity(Section::ALL.len());
        let mut start = 0;

        for section in Section::ALL {
            if section == Section::End {
                headings.push((section, None));
                continue;
            }
            let found = first_cells[start..]
                .iter()
                .position(|text| text.as_ref().contains(section.heading()))
                .map(|offset| start + offset);
            if let Some(row) = found {
                start = row + 1;
            }
            headings.push((section, found));
        }

        Self {
            headings,
            row_count: first_cells.len(),
        }
    }

    /// Row holding a section's heading, if it was found.
    pub fn heading_row(&self, section: Section) -> Option<usize> {
        self.headings
            .iter()
            .find(|(s, _)| *s == section)
            .and_then(|(_, row)| *row)
    }

    /// Where a section starts for the purpose of closing the one before it.
    fn boundary(&self, section: Section) -> Option<usize> {
        match self.heading_row(section) {
            Some(row) => Some(row),
            None if section.defaults_to_end() => Some(self.row_count),
            None => None,
        }
    }

    /// Content rows of a section: after its heading row, up to the next
    /// section boundary. `None` when the heading was not found.
    pub fn range(&self, section: Section) -> Option<Range<usize>> {
        let start = self.heading_row(section)? + 1;
        let end = Section::ALL
            .iter()
            .skip_while(|s| **s != section)
            .skip(1)
            .find_map(|s| self.boundary(*s))
            .unwrap_or(self.row_count);
        Some(start..end.max(start))
    }

    /// Rows before the first heading.
    pub fn preamble(&self) -> Range<usize> {
        let end = self
            .headings
            .iter()
            .find_map(|(_, row)| *row)
            .unwrap_or(self.row_count);
        0..end
    }

    /// Found sections with their content ranges, in page order.
    pub fn ranges(&self) -> Vec<(Section, Range<usize>)> {
        Section::ALL
            .iter()
            .filter_map(|s| self.range(*s).map(|r| (*s, r)))
            .collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// Content of one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum SectionRows {
    /// Rows paired with the section's column headers.
    Labeled(Vec<LabeledRow>),
    /// Each row's cell texts concatenated, for sections without headers.
    Plain(Vec<String>),
}

impl SectionRows {
    /// Labeled rows, or an empty slice for a plain section.
    pub fn labeled(&self) -> &[LabeledRow] {
        match self {
            Self::Labeled(rows) => rows,
            Self::Plain(_) => &[],
        }
    }

    /// Plain rows, or an empty slice for a labeled section.
    pub fn plain(&self) -> &[String] {
        match self {
            Self::Plain(rows) => rows,
            Self::Labeled(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Labeled(rows) => rows.len(),
            Self::Plain(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed detail table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetailTable {
    sections: BTreeMap<Section, SectionRows>,
    exit_filing: Option<bool>,
}

impl DetailTable {
    /// Parse a detail page.
    ///
    /// Fails only when the page carries no bordered table at all.
    pub fn parse(html: &str) -> Result<Self, ScrapeError> {
        let document = Html::parse_document(html);
        let table_selector = selector(r#"table[border="1"]"#)?;
        let table = document
            .select(&table_selector)
            .next()
            .ok_or(ScrapeError::MissingTable("disclosure"))?;

        let rows = table_rows(table);
        let first_cells: Vec<String> = rows.iter().map(|row| first_cell_text(*row)).collect();
        let index = SectionIndex::locate(&first_cells);

        let mut sections = BTreeMap::new();
        for (section, range) in index.ranges() {
            debug!("Section {:?} spans rows {:?}", section, range);
            sections.insert(section, compose_section(section, &rows[range])?);
        }

        Ok(Self {
            sections,
            exit_filing: exit_filing_flag(&rows),
        })
    }

    /// Content of a section, if its heading was present.
    pub fn section(&self, section: Section) -> Option<&SectionRows> {
        self.sections.get(&section)
    }

    /// Labeled rows of a section; empty when absent.
    pub fn labeled(&self, section: Section) -> &[LabeledRow] {
        self.section(section).map(SectionRows::labeled).unwrap_or(&[])
    }

    /// Plain rows of a section; empty when absent.
    pub fn plain(&self, section: Section) -> &[String] {
        self.section(section).map(SectionRows::plain).unwrap_or(&[])
    }

    /// All present sections in page order.
    pub fn sections(&self) -> impl Iterator<Item = (Section, &SectionRows)> {
        self.sections.iter().map(|(s, rows)| (*s, rows))
    }

    /// State of the exit-filing checkbox, when the page has one.
    pub fn exit_filing(&self) -> Option<bool> {
        self.exit_filing
    }
}

fn first_cell_text(row: ElementRef<'_>) -> String {
    child_elements(row, "td")
        .next()
        .map(cell_text)
        .unwrap_or_default()
}

/// Split a section's rows into labeled or plain content.
fn compose_section(section: Section, rows: &[ElementRef<'_>]) -> Result<SectionRows, ScrapeError> {
    // Ranges already exclude the heading; this only guards against a
    // repeated heading row.
    let rows = match rows.first() {
        Some(row) if first_cell_text(*row).contains(section.heading()) => &rows[1..],
        _ => rows,
    };

    let th = selector("th")?;
    let header_row = rows.iter().position(|row| row.select(&th).next().is_some());

    let Some(header_row) = header_row else {
        return Ok(SectionRows::Plain(
            rows.iter().map(|row| row_cells(*row).concat()).collect(),
        ));
    };

    let headers: Vec<String> = rows[header_row].select(&th).map(cell_text).collect();
    let labeled = rows[header_row + 1..]
        .iter()
        .map(|row| row_cells(*row))
        .filter(|cells| !cells.is_empty() && cells.len() == headers.len())
        .map(|cells| LabeledRow::zip(headers.iter().cloned(), cells))
        .collect();

    Ok(SectionRows::Labeled(labeled))
}

/// The first row holding `td > input[type]` controls decides the flag.
fn exit_filing_flag(rows: &[ElementRef<'_>]) -> Option<bool> {
    rows.iter().find_map(|row| {
        let inputs: Vec<ElementRef<'_>> = child_elements(*row, "td")
            .flat_map(|td| child_elements(td, "input"))
            .filter(|input| input.value().attr("type").is_some())
            .collect();
        if inputs.is_empty() {
            None
        } else {
            Some(
                inputs
                    .iter()
                    .any(|input| input.value().attr("checked").is_some()),
            )
        }
    })
}

/// Fetches and parses detail pages.
pub struct DetailScraper<'a> {
    client: &'a HttpClient,
}

impl<'a> DetailScraper<'a> {
    pub fn new(client: &'a HttpClient) -> Self {
        Self { client }
    }

    /// Fetch one detail page. A non-success response is an error for this
    /// page only.
    pub async fn fetch(&self, url: &str) -> Result<DetailTable, ScrapeError> {
        let html = self.client.get_text(url).await?;
        DetailTable::parse(&html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(text: &str) -> String {
        format!(r#"<tr><td colspan="4"><b>{text}</b></td></tr>"#)
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<html><body><table><tr><td>
                 <table border="1">{}</table>
               </td></tr></table></body></html>"#,
            rows.concat()
        )
    }

    fn sample_rows(with_exhibit: bool) -> Vec<String> {
        let mut rows = vec![
            r#"<tr><td>Exit filing <input type="checkbox" checked></td></tr>"#.to_string(),
            heading("Filing Information"),
            "<tr><th>Issuer Name</th><th>Ticker</th><th>Date of Earliest Transaction</th></tr>"
                .to_string(),
            "<tr><td>Example Bancorp</td><td>EXBK</td><td>03/15/2012</td></tr>".to_string(),
            heading("Filer Information"),
            "<tr><th>Name</th><th>City</th></tr>".to_string(),
            "<tr><td>Doe, Jane</td><td>Dover</td></tr>".to_string(),
            heading("Table I - Non-Derivative Securities Acquired"),
            "<tr><th>Title of Security</th><th>Transaction Date</th></tr>".to_string(),
            "<tr><td>Common</td><td>03/15/2012</td></tr>".to_string(),
            "<tr><td>Only one cell</td></tr>".to_string(),
            "<tr><td>Common</td><td>03/16/2012</td></tr>".to_string(),
            heading("Table II - Derivative Securities Acquired"),
            "<tr><th>Title of Derivative Security</th><th>Exercise Price</th></tr>".to_string(),
            "<tr><td>There are no derivative securities</td></tr>".to_string(),
            heading("Explanation of Responses:"),
            "<tr><td>(1)</td><td> First   note</td></tr>".to_string(),
            "<tr><td>(2) Second note</td></tr>".to_string(),
            "<tr><td>/s/ Jane Doe</td></tr>".to_string(),
            "<tr><td>Reminder: legal boilerplate</td></tr>".to_string(),
        ];
        if with_exhibit {
            rows.push(heading("Exhibit Information"));
            rows.push("<tr><td>None</td></tr>".to_string());
        }
        rows
    }

    #[test]
    fn test_compose_detail_url() {
        let url = compose_detail_url(DEFAULT_DETAIL_URL_TEMPLATE, 12345, 999);
        assert_eq!(
            url,
            "http://www2.fdic.gov/efr/redirect.asp?Discl_id=999&InstNme=&InstCty=&CertNum=12345&InstSte=&sGoto=Institution"
        );
    }

    #[test]
    fn test_locate_in_order() {
        let cells = [
            "preamble",
            "Filing Information",
            "x",
            "Filer Information",
            "Table I - Non-Derivative Securities",
            "y",
            "Table II - Derivative Securities",
            "Explanation of Responses:",
            "n1",
            "Exhibit Information",
            "z",
        ];
        let index = SectionIndex::locate(&cells);
        assert_eq!(index.heading_row(Section::FilingInformation), Some(1));
        assert_eq!(index.heading_row(Section::Exhibit), Some(9));
        assert_eq!(index.range(Section::FilingInformation), Some(2..3));
        assert_eq!(index.range(Section::FilerInformation), Some(4..4));
        assert_eq!(index.range(Section::NonDerivative), Some(5..6));
        assert_eq!(index.range(Section::Explanation), Some(8..9));
        assert_eq!(index.range(Section::Exhibit), Some(10..11));
        assert_eq!(index.range(Section::End), None);
    }

    #[test]
    fn test_ranges_partition_rows() {
        let layouts: Vec<Vec<&str>> = vec![
            vec![
                "a",
                "Filing Information",
                "b",
                "Filer Information",
                "Table I - Non-Derivative",
                "c",
                "d",
                "Table II - Derivative",
                "Explanation of Responses",
                "e",
                "f",
                "Exhibit Information",
            ],
            vec![
                "Filing Information",
                "Filer Information",
                "b",
                "Table I - Non-Derivative",
                "Table II - Derivative",
                "Explanation of Responses",
                "e",
            ],
            vec!["x", "y"],
        ];
        for cells in layouts {
            let index = SectionIndex::locate(&cells);
            let ranges = index.ranges();
            let headings = ranges.len();
            let content: usize = ranges.iter().map(|(_, r)| r.len()).sum();
            assert_eq!(index.preamble().len() + headings + content, cells.len());

            let mut cursor = index.preamble().end;
            for (section, range) in &ranges {
                assert_eq!(index.heading_row(*section), Some(cursor));
                assert_eq!(range.start, cursor + 1);
                cursor = range.end;
            }
            assert_eq!(cursor.max(index.preamble().end), cells.len());
        }
    }

    #[test]
    fn test_headings_matched_once_in_order() {
        // Filer Information listed before Filing Information is never found.
        let cells = ["Filer Information", "Filing Information", "x", "Filer Information"];
        let index = SectionIndex::locate(&cells);
        assert_eq!(index.heading_row(Section::FilingInformation), Some(1));
        assert_eq!(index.heading_row(Section::FilerInformation), Some(3));
        assert_eq!(index.preamble(), 0..1);
    }

    #[test]
    fn test_missing_middle_heading_is_absent() {
        let cells = ["Filing Information", "a", "Table I - Non-Derivative", "b"];
        let index = SectionIndex::locate(&cells);
        assert_eq!(index.range(Section::FilerInformation), None);
        assert_eq!(index.range(Section::FilingInformation), Some(1..2));
        assert_eq!(index.range(Section::NonDerivative), Some(3..4));
    }

    #[test]
    fn test_parse_detail_table() {
        let table = DetailTable::parse(&page(&sample_rows(true))).unwrap();

        let filing = table.labeled(Section::FilingInformation);
        assert_eq!(filing.len(), 1);
        assert_eq!(filing[0].get("Ticker"), Some("EXBK"));

        let trades = table.labeled(Section::NonDerivative);
        assert_eq!(trades.len(), 2, "single-cell row must be skipped");
        assert_eq!(trades[1].get("Transaction Date"), Some("03/16/2012"));

        assert!(table.labeled(Section::Derivative).is_empty());

        let notes = table.plain(Section::Explanation);
        assert_eq!(notes.len(), 4);
        assert_eq!(notes[0], "(1)First note");

        assert_eq!(table.plain(Section::Exhibit), ["None".to_string()]);
        assert_eq!(table.exit_filing(), Some(true));
    }

    #[test]
    fn test_missing_exhibit_defaults_to_end() {
        let table = DetailTable::parse(&page(&sample_rows(false))).unwrap();
        assert!(table.section(Section::Exhibit).is_none());
        assert_eq!(table.plain(Section::Explanation).len(), 4);
    }

    #[test]
    fn test_exit_filing_unchecked_and_absent() {
        let mut rows = sample_rows(true);
        rows[0] = r#"<tr><td>Exit filing <input type="checkbox"></td></tr>"#.to_string();
        let table = DetailTable::parse(&page(&rows)).unwrap();
        assert_eq!(table.exit_filing(), Some(false));

        rows.remove(0);
        let table = DetailTable::parse(&page(&rows)).unwrap();
        assert_eq!(table.exit_filing(), None);
    }

    #[test]
    fn test_missing_bordered_table() {
        let err = DetailTable::parse("<html><body><table><tr><td>x</td></tr></table></body></html>")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::MissingTable(_)));
    }
}
