//! Regulated institutions.

use serde::{Deserialize, Serialize};

use crate::scrapers::{LabeledRow, ScrapeError};
use crate::utils::{parse_identifier, parse_text};

/// An institution from the roster, keyed by its certificate number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub cert_number: i64,
    pub bank_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Entity {
    /// Build an entity from a roster row.
    ///
    /// The certificate number must be a plain integer; anything else is
    /// rejected rather than coerced.
    pub fn from_row(row: &LabeledRow) -> Result<Self, ScrapeError> {
        let raw = row.get("Cert Number").unwrap_or_default();
        let cert_number =
            parse_identifier(raw).ok_or_else(|| ScrapeError::InvalidIdentifier(raw.to_string()))?;

        Ok(Self {
            cert_number,
            bank_name: parse_text(row.get("Bank Name"), Some(200)),
            city: parse_text(row.get("City"), Some(100)),
            state: parse_text(row.get("State"), Some(100)),
        })
    }
}
