//! Filings as they appear in an institution's listing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scrapers::{ListingRow, ScrapeError};
use crate::utils::{parse_date, parse_identifier, parse_text};

/// One disclosure event. The disclosure id is the sole de-duplication key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filing {
    pub disclosure_id: i64,
    pub cert_number: i64,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle: Option<String>,
    pub form_type: Option<String>,
    pub filing_date: Option<NaiveDate>,
    pub url: Option<String>,
}

impl Filing {
    /// Build a filing from a listing row of the given institution.
    ///
    /// Rows without a numeric disclosure id cannot be stored and are
    /// rejected.
    pub fn from_listing(cert_number: i64, row: &ListingRow) -> Result<Self, ScrapeError> {
        let raw = row.disclosure_id.as_deref().unwrap_or_default();
        let disclosure_id =
            parse_identifier(raw).ok_or_else(|| ScrapeError::InvalidIdentifier(raw.to_string()))?;

        Ok(Self {
            disclosure_id,
            cert_number,
            last_name: parse_text(row.get("Last Name"), Some(100)),
            first_name: parse_text(row.get("First Name"), Some(100)),
            middle: parse_text(row.get("Middle Initial"), Some(20)),
            form_type: parse_text(row.get("Form Name"), Some(10)),
            filing_date: parse_date(row.get("Filing Date")),
            // Kept whole: it is fetched again later.
            url: parse_text(row.url.as_deref(), None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::LabeledRow;

    fn listing_row(discl_id: Option<&str>) -> ListingRow {
        ListingRow {
            columns: LabeledRow::zip(
                ["Last Name", "First Name", "Middle Initial", "Form Name", "Filing Date"],
                ["Doe", "Jane", "Q", "Form 4 Amendment", "03/15/2012"],
            ),
            url: discl_id.map(|id| format!("http://www2.fdic.gov/efr/redirect.asp?Discl_id={id}")),
            disclosure_id: discl_id.map(str::to_string),
        }
    }

    #[test]
    fn test_filing_from_listing() {
        let filing = Filing::from_listing(12345, &listing_row(Some("999"))).unwrap();
        assert_eq!(filing.disclosure_id, 999);
        assert_eq!(filing.cert_number, 12345);
        assert_eq!(filing.last_name.as_deref(), Some("Doe"));
        assert_eq!(filing.form_type.as_deref(), Some("Form 4 Ame"));
        assert_eq!(filing.filing_date, NaiveDate::from_ymd_opt(2012, 3, 15));
        assert!(filing.url.unwrap().ends_with("Discl_id=999"));
    }

    #[test]
    fn test_long_url_kept_whole() {
        let mut row = listing_row(Some("999"));
        let long = format!("{}&InstNme={}", row.url.clone().unwrap(), "x".repeat(300));
        row.url = Some(long.clone());
        let filing = Filing::from_listing(1, &row).unwrap();
        assert_eq!(filing.url, Some(long));
    }

    #[test]
    fn test_filing_requires_disclosure_id() {
        assert!(Filing::from_listing(1, &listing_row(None)).is_err());
        assert!(Filing::from_listing(1, &listing_row(Some(""))).is_err());
        assert!(Filing::from_listing(1, &listing_row(Some("12x"))).is_err());
    }
}
