//! Per-entity filing listings.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::error::ScrapeError;
use super::html::{cell_text, selector, LabeledRow};
use super::HttpClient;

/// Listing endpoint, queried by certificate number.
pub const DEFAULT_LISTING_URL: &str = "http://www2.fdic.gov/efr/instdetail.asp";

/// Validation hint the listing form submits alongside the certificate number.
const CERT_NUM_HINT: &str = "The FDIC Certificate Number must req.,be a positive integer";

/// One row of a listing table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingRow {
    /// Cell values keyed by the table's own headers.
    pub columns: LabeledRow,
    /// Absolute URL of the last link in the row.
    pub url: Option<String>,
    /// `Discl_id` from that URL; empty when the URL lacks it.
    pub disclosure_id: Option<String>,
}

impl ListingRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.columns.get(header)
    }
}

/// Last value of a query parameter, if present.
pub fn url_param(url: &str, name: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .filter(|(key, _)| key == name)
        .last()
        .map(|(_, value)| value.into_owned())
}

/// Disclosure id of a detail URL.
///
/// A URL without `Discl_id` is logged and yields an empty string.
pub fn parse_disclosure_id(url: &str) -> String {
    url_param(url, "Discl_id").unwrap_or_else(|| {
        warn!("No Discl_id parameter in {}", url);
        String::new()
    })
}

/// Certificate number of a detail URL; empty when absent.
pub fn parse_cert_number(url: &str) -> String {
    url_param(url, "CertNum").unwrap_or_else(|| {
        warn!("No CertNum parameter in {}", url);
        String::new()
    })
}

/// Parse a listing page. Relative links resolve against `base_url`.
///
/// Rows repeating an earlier row's disclosure id are dropped.
pub fn parse_listing(html: &str, base_url: &str) -> Result<Vec<ListingRow>, ScrapeError> {
    let base = Url::parse(base_url)?;
    let document = Html::parse_document(html);

    let header_selector = selector("table[class] tr th")?;
    let row_selector = selector("table[class] tr")?;
    let td = selector("td")?;
    let anchor = selector("a[href]")?;

    let headers: Vec<String> = document.select(&header_selector).map(cell_text).collect();

    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for row in document.select(&row_selector) {
        let cells: Vec<String> = row.select(&td).map(cell_text).collect();
        if cells.is_empty() {
            continue;
        }

        let (url, disclosure_id) = match last_link(row, &anchor) {
            Some(href) => match base.join(&href) {
                Ok(url) => {
                    let url = url.to_string();
                    let id = parse_disclosure_id(&url);
                    (Some(url), Some(id))
                }
                Err(e) => {
                    warn!("Ignoring unusable link {:?}: {}", href, e);
                    (None, None)
                }
            },
            None => (None, None),
        };

        if let Some(id) = &disclosure_id {
            if !seen.insert(id.clone()) {
                debug!("Skipping repeated disclosure {}", id);
                continue;
            }
        }

        rows.push(ListingRow {
            columns: LabeledRow::zip(headers.iter().cloned(), cells),
            url,
            disclosure_id,
        });
    }

    Ok(rows)
}

fn last_link(row: ElementRef<'_>, anchor: &scraper::Selector) -> Option<String> {
    row.select(anchor)
        .last()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

/// URLs of local filings whose disclosure id is not yet in `existing`.
pub fn determine_new<'a, I>(local: I, existing: &HashSet<i64>) -> Vec<String>
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    local
        .into_iter()
        .filter(|(id, _)| !existing.contains(id))
        .map(|(_, url)| url.to_string())
        .collect()
}

/// Fetches listing pages.
pub struct ListingScraper<'a> {
    client: &'a HttpClient,
    listing_url: String,
}

impl<'a> ListingScraper<'a> {
    pub fn new(client: &'a HttpClient, listing_url: impl Into<String>) -> Self {
        Self {
            client,
            listing_url: listing_url.into(),
        }
    }

    /// Fetch and parse the listing for one entity.
    pub async fn fetch(&self, cert_number: i64) -> Result<Vec<ListingRow>, ScrapeError> {
        let cert = cert_number.to_string();
        let html = self
            .client
            .post_form(
                &self.listing_url,
                &[("CertNum", cert.as_str()), ("CertNum_INTEGER", CERT_NUM_HINT)],
            )
            .await?;
        parse_listing(&html, &self.listing_url)
    }
}
