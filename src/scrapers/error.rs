//! Error types for page fetching and extraction.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure to fetch or extract a single page.
///
/// Every variant is scoped to one page: callers iterating over a batch log
/// the error, count it and move on to the next entity or URL.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },
    #[error("No {0} table found on page")]
    MissingTable(&'static str),
    #[error("Failed to parse selector: {0}")]
    Selector(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
}
