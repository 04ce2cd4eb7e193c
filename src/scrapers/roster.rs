//! The roster of regulated institutions.

use scraper::{ElementRef, Html};

use super::error::ScrapeError;
use super::html::{cell_text, selector, LabeledRow};
use super::HttpClient;

/// Roster page listing every filing institution.
pub const DEFAULT_ROSTER_URL: &str = "http://www.fdic.gov/bank/individual/part335/index.html";

/// Parse the roster table.
///
/// Headers are every `th` on the page. Body rows are the `tr` siblings that
/// follow the row holding the first header.
pub fn parse_roster(html: &str) -> Result<Vec<LabeledRow>, ScrapeError> {
    let document = Html::parse_document(html);
    let th = selector("th")?;

    let header_cells: Vec<ElementRef<'_>> = document.select(&th).collect();
    let header_row = header_cells
        .first()
        .and_then(|cell| cell.parent())
        .and_then(ElementRef::wrap)
        .ok_or(ScrapeError::MissingTable("roster"))?;
    let headers: Vec<String> = header_cells.into_iter().map(cell_text).collect();

    let rows = header_row
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|row| row.value().name() == "tr")
        .map(|row| {
            let values = row
                .children()
                .filter_map(ElementRef::wrap)
                .map(cell_text);
            LabeledRow::zip(headers.iter().cloned(), values)
        })
        .collect();

    Ok(rows)
}

/// Fetches the roster page.
pub struct RosterScraper<'a> {
    client: &'a HttpClient,
    roster_url: String,
}

impl<'a> RosterScraper<'a> {
    pub fn new(client: &'a HttpClient, roster_url: impl Into<String>) -> Self {
        Self {
            client,
            roster_url: roster_url.into(),
        }
    }

    pub async fn fetch(&self) -> Result<Vec<LabeledRow>, ScrapeError> {
        let html = self.client.get_text(&self.roster_url).await?;
        parse_roster(&html)
    }
}
