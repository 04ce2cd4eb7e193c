//! Scrapers for the insider disclosure site.
//!
//! Three page types are read: the institution roster, a filing listing per
//! institution, and one detail page per filing. Fetching goes through
//! [`HttpClient`]; everything after the response body is synchronous parsing
//! into owned values, so parsed results can cross await points and threads.

pub mod detail;
mod error;
pub mod html;
mod http_client;
pub mod keywords;
pub mod listing;
pub mod roster;

pub use detail::{
    compose_detail_url, DetailScraper, DetailTable, Section, SectionIndex, SectionRows,
    DEFAULT_DETAIL_URL_TEMPLATE,
};
pub use error::ScrapeError;
pub use html::LabeledRow;
pub use http_client::{resolve_user_agent, HttpClient, USER_AGENT};
pub use keywords::KeywordMap;
pub use listing::{
    determine_new, parse_cert_number, parse_disclosure_id, ListingRow, ListingScraper,
    DEFAULT_LISTING_URL,
};
pub use roster::{RosterScraper, DEFAULT_ROSTER_URL};
