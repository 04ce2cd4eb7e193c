//! Records extracted from a filing's detail page.
//!
//! Each record is built in one step from a labeled row: keywords are resolved
//! against the row's headers, the matching cells are coerced, and the result
//! is a complete value; callers never see a half-built record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scrapers::{DetailTable, KeywordMap, LabeledRow, Section, SectionRows};
use crate::utils::{
    parse_acquired, parse_date, parse_direct_own, parse_price, parse_shares, parse_text,
    parse_v_flag,
};

/// Issuer metadata from the "Filing Information" section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingInfo {
    pub disclosure_id: i64,
    pub info_number: i32,
    pub issuer_name: Option<String>,
    pub issuer_ticker: Option<String>,
    pub report_date: Option<NaiveDate>,
    pub amendment_date: Option<NaiveDate>,
    pub exit_filing: Option<bool>,
}

impl FilingInfo {
    pub const KEYWORDS: &'static [&'static str] =
        &["Name", "Earliest", "Event", "Ticker", "Amendment"];

    pub fn from_row(
        disclosure_id: i64,
        info_number: i32,
        row: &LabeledRow,
        exit_filing: Option<bool>,
    ) -> Self {
        let map = KeywordMap::for_row(Self::KEYWORDS, row);

        // Form 3 pages report the event date instead of the earliest transaction.
        let report_date = if map.is_resolved("Earliest") {
            map.lookup("Earliest", row)
        } else {
            map.lookup("Event", row)
        };

        Self {
            disclosure_id,
            info_number,
            issuer_name: parse_text(map.lookup("Name", row), Some(100)),
            issuer_ticker: parse_text(map.lookup("Ticker", row), Some(20)),
            report_date: parse_date(report_date),
            amendment_date: parse_date(map.lookup("Amendment", row)),
            exit_filing,
        }
    }
}

/// Reporting person from the "Filer Information" section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilerInfo {
    pub disclosure_id: i64,
    pub info_number: i32,
    pub title: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub street: Option<String>,
    pub zip: Option<String>,
}

impl FilerInfo {
    pub const KEYWORDS: &'static [&'static str] =
        &["Relationship", "Name", "City", "State", "Street", "ZIP"];

    pub fn from_row(disclosure_id: i64, info_number: i32, row: &LabeledRow) -> Self {
        let map = KeywordMap::for_row(Self::KEYWORDS, row);
        Self {
            disclosure_id,
            info_number,
            title: parse_text(map.lookup("Relationship", row), Some(100)),
            name: parse_text(map.lookup("Name", row), Some(100)),
            city: parse_text(map.lookup("City", row), Some(100)),
            state: parse_text(map.lookup("State", row), Some(25)),
            street: parse_text(map.lookup("Street", row), Some(100)),
            zip: parse_text(map.lookup("ZIP", row), Some(20)),
        }
    }
}

/// Which trade table a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeTable {
    NonDerivative,
    Derivative,
}

impl TradeTable {
    pub fn section(self) -> Section {
        match self {
            Self::NonDerivative => Section::NonDerivative,
            Self::Derivative => Section::Derivative,
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::NonDerivative => NON_DERIVATIVE_KEYWORDS,
            Self::Derivative => DERIVATIVE_KEYWORDS,
        }
    }
}

/// Keywords present in both trade tables.
pub const COMMON_TRADE_KEYWORDS: &[&str] = &[
    "Transaction Date",
    "Code",
    "Execution Date",
    "Form",
    "Beneficially Owned",
    "Nature of",
    ACQUIRED_KEYWORD,
];

pub const NON_DERIVATIVE_KEYWORDS: &[&str] = &[
    "Amount of Securities Acquired",
    "Title of Security",
    "Price of Securities Acquired",
];

/// "Expiration " keeps its trailing space so that it matches
/// "Expiration Date" and not a bare "Expiration" header.
pub const DERIVATIVE_KEYWORDS: &[&str] = &[
    "Title of Derivative Security",
    "Exercise Price",
    "Derivative Securities Acquired",
    "Exercisable",
    "Expiration ",
    "Title of Underlying Securities",
    "Amount of Underlying Securities",
    "Price of Derivative Security",
];

/// Dedicated acquired/disposed column, when a table has one.
const ACQUIRED_KEYWORD: &str = "(A) or (D)";

/// Exact header of the voluntary-report column.
const V_FLAG_HEADER: &str = "V";

/// One line of Table I or Table II.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub disclosure_id: i64,
    pub trade_number: i32,
    pub derivative: bool,
    pub security: Option<String>,
    pub trade_date: Option<NaiveDate>,
    pub exec_date: Option<NaiveDate>,
    pub code: Option<String>,
    pub v_flag: bool,
    pub trade_shares: Option<i64>,
    pub trade_acq: Option<bool>,
    pub trade_price: Option<f64>,
    pub shares_owned: Option<i64>,
    pub direct_own: Option<bool>,
    pub nature_of_own: Option<String>,
    pub exercise_price: Option<f64>,
    pub exercise_date: Option<NaiveDate>,
    pub expire_date: Option<NaiveDate>,
    pub underlying_security: Option<String>,
    pub underlying_shares: Option<i64>,
}

impl Trade {
    pub fn from_row(
        disclosure_id: i64,
        trade_number: i32,
        table: TradeTable,
        row: &LabeledRow,
    ) -> Self {
        let keywords: Vec<&'static str> = COMMON_TRADE_KEYWORDS
            .iter()
            .chain(table.keywords())
            .copied()
            .collect();
        let map = KeywordMap::for_row(&keywords, row);
        let get = |keyword: &str| map.lookup(keyword, row);

        let mut trade = Self {
            disclosure_id,
            trade_number,
            derivative: table == TradeTable::Derivative,
            security: None,
            trade_date: parse_date(get("Transaction Date")),
            exec_date: parse_date(get("Execution Date")),
            code: parse_text(get("Code"), Some(10)),
            v_flag: parse_v_flag(row.get(V_FLAG_HEADER)),
            trade_shares: None,
            trade_acq: None,
            trade_price: None,
            shares_owned: parse_shares(get("Beneficially Owned")),
            direct_own: parse_direct_own(get("Form")),
            nature_of_own: parse_text(get("Nature of"), Some(100)),
            exercise_price: None,
            exercise_date: None,
            expire_date: None,
            underlying_security: None,
            underlying_shares: None,
        };

        let amount = match table {
            TradeTable::NonDerivative => {
                trade.security = parse_text(get("Title of Security"), Some(100))
                    .or_else(|| parse_text(form3_security(row), Some(100)));
                trade.trade_price = parse_price(get("Price of Securities Acquired"));
                get("Amount of Securities Acquired")
            }
            TradeTable::Derivative => {
                trade.security = parse_text(get("Title of Derivative Security"), Some(100));
                trade.exercise_price = parse_price(get("Exercise Price"));
                trade.exercise_date = parse_date(get("Exercisable"));
                trade.expire_date = parse_date(get("Expiration "));
                trade.underlying_security =
                    parse_text(get("Title of Underlying Securities"), Some(100));
                trade.underlying_shares = parse_shares(get("Amount of Underlying Securities"));
                trade.trade_price = parse_price(get("Price of Derivative Security"));
                get("Derivative Securities Acquired")
            }
        };

        trade.trade_shares = parse_shares(amount);
        trade.trade_acq = parse_acquired(get(ACQUIRED_KEYWORD)).or_else(|| parse_acquired(amount));
        trade
    }
}

/// Form 3 non-derivative tables label the security column differently; take
/// the first "Title of" column instead.
fn form3_security(row: &LabeledRow) -> Option<&str> {
    row.iter()
        .find(|(header, _)| header.contains("Title of"))
        .map(|(_, value)| value)
}

/// A footnote from "Explanation of Responses".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub disclosure_id: i64,
    pub note_number: i32,
    pub footnote: String,
}

impl Note {
    pub const MAX_LENGTH: usize = 2500;

    /// `None` for a blank row.
    pub fn from_text(disclosure_id: i64, note_number: i32, text: &str) -> Option<Self> {
        let footnote = parse_text(Some(text.trim()), Some(Self::MAX_LENGTH))?;
        Some(Self {
            disclosure_id,
            note_number,
            footnote,
        })
    }
}

/// Number of trailing footnote rows that are always a signature line and
/// legal boilerplate.
const TRAILING_NOTE_ROWS: usize = 2;

/// Every record extracted from one detail page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilingDetail {
    pub disclosure_id: i64,
    pub filing_info: Vec<FilingInfo>,
    pub filer_info: Vec<FilerInfo>,
    pub trades: Vec<Trade>,
    pub notes: Vec<Note>,
}

impl FilingDetail {
    /// Convert a parsed detail table into records.
    ///
    /// Trades are numbered from 1 across both tables: Table I rows first,
    /// then Table II continuing the same count. Rows reading "There are no
    /// ..." are placeholders and take no number.
    pub fn from_table(disclosure_id: i64, table: &DetailTable) -> Self {
        let exit_filing = table.exit_filing();

        let filing_info = table
            .labeled(Section::FilingInformation)
            .iter()
            .zip(1..)
            .map(|(row, n)| FilingInfo::from_row(disclosure_id, n, row, exit_filing))
            .collect();

        let filer_info = table
            .labeled(Section::FilerInformation)
            .iter()
            .zip(1..)
            .map(|(row, n)| FilerInfo::from_row(disclosure_id, n, row))
            .collect();

        let trade_rows = [TradeTable::NonDerivative, TradeTable::Derivative]
            .into_iter()
            .flat_map(|kind| {
                table
                    .labeled(kind.section())
                    .iter()
                    .filter(|row| !row.is_empty() && !row.contains_text("There are no"))
                    .map(move |row| (kind, row))
            });
        let trades = trade_rows
            .zip(1..)
            .map(|((kind, row), n)| Trade::from_row(disclosure_id, n, kind, row))
            .collect();

        Self {
            disclosure_id,
            filing_info,
            filer_info,
            trades,
            notes: notes_from(disclosure_id, &explanation_rows(table)),
        }
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.filing_info.len() + self.filer_info.len() + self.trades.len() + self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Explanation rows as text, whichever way the section was decomposed.
fn explanation_rows(table: &DetailTable) -> Vec<String> {
    match table.section(Section::Explanation) {
        Some(SectionRows::Plain(rows)) => rows.clone(),
        Some(SectionRows::Labeled(rows)) => rows
            .iter()
            .map(|row| row.values().collect::<String>())
            .collect(),
        None => Vec::new(),
    }
}

fn notes_from(disclosure_id: i64, rows: &[String]) -> Vec<Note> {
    let kept = rows.len().saturating_sub(TRAILING_NOTE_ROWS);
    let mut notes = Vec::new();
    for text in &rows[..kept] {
        let number = notes.len() as i32 + 1;
        if let Some(note) = Note::from_text(disclosure_id, number, text) {
            notes.push(note);
        }
    }
    notes
}
