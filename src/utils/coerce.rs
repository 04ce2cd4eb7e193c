//! Cell value coercion.
//!
//! Disclosure tables are typed by hand on the regulator's side, so every cell
//! is free text: share counts carry thousands separators and footnote marks,
//! prices carry currency symbols, dates are US-formatted. Each function here
//! is total over its input. Absent or unusable input becomes `None` (or
//! `false` for the verification flag); nothing in this module returns an error.

use chrono::NaiveDate;

/// Date format used throughout the disclosure pages.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Concatenate every ASCII digit in the value and parse the result.
///
/// `"1,000 shares"` becomes `1000`. Returns `None` when there are no digits
/// or when the digits overflow an `i64`.
pub fn parse_shares(value: Option<&str>) -> Option<i64> {
    let digits: String = value?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Keep digits and decimal points, then parse as a money amount.
pub fn parse_price(value: Option<&str>) -> Option<f64> {
    let kept: String = value?
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if kept.is_empty() {
        return None;
    }
    kept.parse().ok()
}

/// Blank input becomes `None`; otherwise the value, cut to `max_length`
/// characters when a limit is given.
pub fn parse_text(value: Option<&str>, max_length: Option<usize>) -> Option<String> {
    let value = value.filter(|v| !v.is_empty())?;
    match max_length {
        Some(max) => Some(value.chars().take(max).collect()),
        None => Some(value.to_string()),
    }
}

/// Ownership form: `"Indirect"` anywhere in the text means indirect
/// ownership (`false`), anything else non-empty means direct (`true`).
pub fn parse_direct_own(value: Option<&str>) -> Option<bool> {
    let value = value.filter(|v| !v.is_empty())?;
    Some(!value.contains("Indirect"))
}

/// Verification flag: set when the `V` marker is present.
pub fn parse_v_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.contains('V'))
}

/// Acquisition/disposition marker.
///
/// Accepts a bare `A`/`D` column value or a parenthesised marker inside an
/// amount cell such as `"1,000 (A)"`. Acquired is `true`, disposed `false`.
pub fn parse_acquired(value: Option<&str>) -> Option<bool> {
    let value = value?.trim();
    match value {
        "A" => return Some(true),
        "D" => return Some(false),
        _ => {}
    }
    if value.contains("(A)") {
        Some(true)
    } else if value.contains("(D)") {
        Some(false)
    } else {
        None
    }
}

/// Parse a `MM/DD/YYYY` date, tolerating surrounding whitespace.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Strict identifier parsing for certificate numbers and disclosure ids.
///
/// Unlike [`parse_shares`] nothing is stripped: any non-digit content makes
/// the identifier invalid.
pub fn parse_identifier(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shares() {
        assert_eq!(parse_shares(Some("1,000 shares")), Some(1000));
        assert_eq!(parse_shares(Some("  25 ")), Some(25));
        assert_eq!(parse_shares(Some("n/a")), None);
        assert_eq!(parse_shares(Some("")), None);
        assert_eq!(parse_shares(None), None);
    }

    #[test]
    fn test_parse_shares_keeps_footnote_digits() {
        // Footnote references are not told apart from the amount.
        assert_eq!(parse_shares(Some("1,000 (1)")), Some(10001));
    }

    #[test]
    fn test_parse_shares_overflow_is_absent() {
        assert_eq!(parse_shares(Some("99999999999999999999999")), None);
    }

    #[test]
    fn test_parse_shares_idempotent_on_clean_input() {
        for raw in ["0", "42", "1000", "987654321"] {
            let once = parse_shares(Some(raw)).unwrap();
            let twice = parse_shares(Some(&once.to_string())).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some("$12.50")), Some(12.5));
        assert_eq!(parse_price(Some("1,234.75 (2)")), Some(1234.752));
        assert_eq!(parse_price(Some("$")), None);
        assert_eq!(parse_price(Some(".")), None);
        assert_eq!(parse_price(Some("1.2.3")), None);
        assert_eq!(parse_price(None), None);
    }

    #[test]
    fn test_parse_price_idempotent_on_clean_input() {
        for raw in ["12.5", "0.25", "100"] {
            let once = parse_price(Some(raw)).unwrap();
            let twice = parse_price(Some(&once.to_string())).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_text(None, Some(5)), None);
        assert_eq!(parse_text(Some(""), Some(5)), None);
        assert_eq!(parse_text(Some("abcdefgh"), Some(5)).as_deref(), Some("abcde"));
        assert_eq!(parse_text(Some("abc"), Some(5)).as_deref(), Some("abc"));
        assert_eq!(parse_text(Some("abcdefgh"), None).as_deref(), Some("abcdefgh"));
    }

    #[test]
    fn test_parse_text_truncates_on_char_boundary() {
        assert_eq!(parse_text(Some("€€€"), Some(2)).as_deref(), Some("€€"));
    }

    #[test]
    fn test_parse_direct_own() {
        assert_eq!(parse_direct_own(Some("Indirect (I)")), Some(false));
        assert_eq!(parse_direct_own(Some("Direct (D)")), Some(true));
        assert_eq!(parse_direct_own(Some("D")), Some(true));
        assert_eq!(parse_direct_own(Some("")), None);
        assert_eq!(parse_direct_own(None), None);
    }

    #[test]
    fn test_parse_v_flag() {
        assert!(parse_v_flag(Some("V")));
        assert!(!parse_v_flag(Some("")));
        assert!(!parse_v_flag(Some("x")));
        assert!(!parse_v_flag(None));
    }

    #[test]
    fn test_parse_acquired() {
        assert_eq!(parse_acquired(Some("A")), Some(true));
        assert_eq!(parse_acquired(Some(" D ")), Some(false));
        assert_eq!(parse_acquired(Some("1,000 (A)")), Some(true));
        assert_eq!(parse_acquired(Some("500 (D)")), Some(false));
        assert_eq!(parse_acquired(Some("500")), None);
        assert_eq!(parse_acquired(None), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("03/15/2012")),
            NaiveDate::from_ymd_opt(2012, 3, 15)
        );
        assert_eq!(
            parse_date(Some(" 3/5/2012 ")),
            NaiveDate::from_ymd_opt(2012, 3, 5)
        );
        assert_eq!(parse_date(Some("2012-03-15")), None);
        assert_eq!(parse_date(Some("")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier("12345"), Some(12345));
        assert_eq!(parse_identifier(" 999 "), Some(999));
        assert_eq!(parse_identifier(""), None);
        assert_eq!(parse_identifier("12a"), None);
        assert_eq!(parse_identifier("1+1"), None);
        assert_eq!(parse_identifier("-5"), None);
    }
}
