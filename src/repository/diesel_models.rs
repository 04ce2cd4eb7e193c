//! Diesel ORM models for database tables.
//!
//! Insertable structs borrow from the domain records in `crate::models`;
//! queryable structs convert back into them. Dates travel as ISO-8601 text.

use diesel::prelude::*;

use super::{format_date, parse_stored_date};
use crate::models::{Entity, FilerInfo, Filing, FilingInfo, Note, Trade};
use crate::schema;

/// Entity record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::entities)]
#[diesel(primary_key(cert_number))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EntityRecord {
    pub cert_number: i64,
    pub bank_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// New entity for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::entities)]
pub struct NewEntity<'a> {
    pub cert_number: i64,
    pub bank_name: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
}

impl<'a> From<&'a Entity> for NewEntity<'a> {
    fn from(entity: &'a Entity) -> Self {
        Self {
            cert_number: entity.cert_number,
            bank_name: entity.bank_name.as_deref(),
            city: entity.city.as_deref(),
            state: entity.state.as_deref(),
        }
    }
}

impl From<EntityRecord> for Entity {
    fn from(record: EntityRecord) -> Self {
        Entity {
            cert_number: record.cert_number,
            bank_name: record.bank_name,
            city: record.city,
            state: record.state,
        }
    }
}

/// Filing record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::filings)]
#[diesel(primary_key(disclosure_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FilingRecord {
    pub disclosure_id: i64,
    pub cert_number: i64,
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub middle: Option<String>,
    pub form_type: Option<String>,
    pub filing_date: Option<String>,
    pub url: Option<String>,
}

/// New filing for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::filings)]
pub struct NewFiling<'a> {
    pub disclosure_id: i64,
    pub cert_number: i64,
    pub last_name: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub middle: Option<&'a str>,
    pub form_type: Option<&'a str>,
    pub filing_date: Option<String>,
    pub url: Option<&'a str>,
}

impl<'a> From<&'a Filing> for NewFiling<'a> {
    fn from(filing: &'a Filing) -> Self {
        Self {
            disclosure_id: filing.disclosure_id,
            cert_number: filing.cert_number,
            last_name: filing.last_name.as_deref(),
            first_name: filing.first_name.as_deref(),
            middle: filing.middle.as_deref(),
            form_type: filing.form_type.as_deref(),
            filing_date: format_date(filing.filing_date),
            url: filing.url.as_deref(),
        }
    }
}

impl From<FilingRecord> for Filing {
    fn from(record: FilingRecord) -> Self {
        Filing {
            disclosure_id: record.disclosure_id,
            cert_number: record.cert_number,
            last_name: record.last_name,
            first_name: record.first_name,
            middle: record.middle,
            form_type: record.form_type,
            filing_date: parse_stored_date(record.filing_date),
            url: record.url,
        }
    }
}

/// Filing information record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::filing_info)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FilingInfoRecord {
    pub disclosure_id: i64,
    pub info_number: i32,
    pub issuer_name: Option<String>,
    pub issuer_ticker: Option<String>,
    pub report_date: Option<String>,
    pub amendment_date: Option<String>,
    pub exit_filing: Option<bool>,
}

/// New filing information row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::filing_info)]
pub struct NewFilingInfo<'a> {
    pub disclosure_id: i64,
    pub info_number: i32,
    pub issuer_name: Option<&'a str>,
    pub issuer_ticker: Option<&'a str>,
    pub report_date: Option<String>,
    pub amendment_date: Option<String>,
    pub exit_filing: Option<bool>,
}

impl<'a> From<&'a FilingInfo> for NewFilingInfo<'a> {
    fn from(info: &'a FilingInfo) -> Self {
        Self {
            disclosure_id: info.disclosure_id,
            info_number: info.info_number,
            issuer_name: info.issuer_name.as_deref(),
            issuer_ticker: info.issuer_ticker.as_deref(),
            report_date: format_date(info.report_date),
            amendment_date: format_date(info.amendment_date),
            exit_filing: info.exit_filing,
        }
    }
}

impl From<FilingInfoRecord> for FilingInfo {
    fn from(record: FilingInfoRecord) -> Self {
        FilingInfo {
            disclosure_id: record.disclosure_id,
            info_number: record.info_number,
            issuer_name: record.issuer_name,
            issuer_ticker: record.issuer_ticker,
            report_date: parse_stored_date(record.report_date),
            amendment_date: parse_stored_date(record.amendment_date),
            exit_filing: record.exit_filing,
        }
    }
}

/// Filer information record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::filer_info)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FilerInfoRecord {
    pub disclosure_id: i64,
    pub info_number: i32,
    pub title: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub street: Option<String>,
    pub zip: Option<String>,
}

/// New filer information row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::filer_info)]
pub struct NewFilerInfo<'a> {
    pub disclosure_id: i64,
    pub info_number: i32,
    pub title: Option<&'a str>,
    pub name: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub street: Option<&'a str>,
    pub zip: Option<&'a str>,
}

impl<'a> From<&'a FilerInfo> for NewFilerInfo<'a> {
    fn from(info: &'a FilerInfo) -> Self {
        Self {
            disclosure_id: info.disclosure_id,
            info_number: info.info_number,
            title: info.title.as_deref(),
            name: info.name.as_deref(),
            city: info.city.as_deref(),
            state: info.state.as_deref(),
            street: info.street.as_deref(),
            zip: info.zip.as_deref(),
        }
    }
}

impl From<FilerInfoRecord> for FilerInfo {
    fn from(record: FilerInfoRecord) -> Self {
        FilerInfo {
            disclosure_id: record.disclosure_id,
            info_number: record.info_number,
            title: record.title,
            name: record.name,
            city: record.city,
            state: record.state,
            street: record.street,
            zip: record.zip,
        }
    }
}

/// Trade record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::trades)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TradeRecord {
    pub disclosure_id: i64,
    pub trade_number: i32,
    pub derivative: bool,
    pub security: Option<String>,
    pub trade_date: Option<String>,
    pub exec_date: Option<String>,
    pub code: Option<String>,
    pub v_flag: bool,
    pub trade_shares: Option<i64>,
    pub trade_acq: Option<bool>,
    pub trade_price: Option<f64>,
    pub shares_owned: Option<i64>,
    pub direct_own: Option<bool>,
    pub nature_of_own: Option<String>,
    pub exercise_price: Option<f64>,
    pub exercise_date: Option<String>,
    pub expire_date: Option<String>,
    pub underlying_security: Option<String>,
    pub underlying_shares: Option<i64>,
}

/// New trade for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::trades)]
pub struct NewTrade<'a> {
    pub disclosure_id: i64,
    pub trade_number: i32,
    pub derivative: bool,
    pub security: Option<&'a str>,
    pub trade_date: Option<String>,
    pub exec_date: Option<String>,
    pub code: Option<&'a str>,
    pub v_flag: bool,
    pub trade_shares: Option<i64>,
    pub trade_acq: Option<bool>,
    pub trade_price: Option<f64>,
    pub shares_owned: Option<i64>,
    pub direct_own: Option<bool>,
    pub nature_of_own: Option<&'a str>,
    pub exercise_price: Option<f64>,
    pub exercise_date: Option<String>,
    pub expire_date: Option<String>,
    pub underlying_security: Option<&'a str>,
    pub underlying_shares: Option<i64>,
}

impl<'a> From<&'a Trade> for NewTrade<'a> {
    fn from(trade: &'a Trade) -> Self {
        Self {
            disclosure_id: trade.disclosure_id,
            trade_number: trade.trade_number,
            derivative: trade.derivative,
            security: trade.security.as_deref(),
            trade_date: format_date(trade.trade_date),
            exec_date: format_date(trade.exec_date),
            code: trade.code.as_deref(),
            v_flag: trade.v_flag,
            trade_shares: trade.trade_shares,
            trade_acq: trade.trade_acq,
            trade_price: trade.trade_price,
            shares_owned: trade.shares_owned,
            direct_own: trade.direct_own,
            nature_of_own: trade.nature_of_own.as_deref(),
            exercise_price: trade.exercise_price,
            exercise_date: format_date(trade.exercise_date),
            expire_date: format_date(trade.expire_date),
            underlying_security: trade.underlying_security.as_deref(),
            underlying_shares: trade.underlying_shares,
        }
    }
}

impl From<TradeRecord> for Trade {
    fn from(record: TradeRecord) -> Self {
        Trade {
            disclosure_id: record.disclosure_id,
            trade_number: record.trade_number,
            derivative: record.derivative,
            security: record.security,
            trade_date: parse_stored_date(record.trade_date),
            exec_date: parse_stored_date(record.exec_date),
            code: record.code,
            v_flag: record.v_flag,
            trade_shares: record.trade_shares,
            trade_acq: record.trade_acq,
            trade_price: record.trade_price,
            shares_owned: record.shares_owned,
            direct_own: record.direct_own,
            nature_of_own: record.nature_of_own,
            exercise_price: record.exercise_price,
            exercise_date: parse_stored_date(record.exercise_date),
            expire_date: parse_stored_date(record.expire_date),
            underlying_security: record.underlying_security,
            underlying_shares: record.underlying_shares,
        }
    }
}

/// Footnote record from the database.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::notes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NoteRecord {
    pub disclosure_id: i64,
    pub note_number: i32,
    pub footnote: String,
}

/// New footnote for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::notes)]
pub struct NewNote<'a> {
    pub disclosure_id: i64,
    pub note_number: i32,
    pub footnote: &'a str,
}

impl<'a> From<&'a Note> for NewNote<'a> {
    fn from(note: &'a Note) -> Self {
        Self {
            disclosure_id: note.disclosure_id,
            note_number: note.note_number,
            footnote: &note.footnote,
        }
    }
}

impl From<NoteRecord> for Note {
    fn from(record: NoteRecord) -> Self {
        Note {
            disclosure_id: record.disclosure_id,
            note_number: record.note_number,
            footnote: record.footnote,
        }
    }
}
